//! Token types for the SQL lexer.

use serde::{Serialize, Serializer};

use super::Span;

macro_rules! define_keywords {
    ($($variant:ident => $text:literal,)*) => {
        /// SQL keywords known to the lexer.
        ///
        /// Being a keyword says nothing about whether a word may be used as an
        /// identifier; that is decided per dialect by
        /// [`Dialect::keyword_class`](crate::dialect::Dialect::keyword_class).
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Keyword {
            $(
                #[doc = $text]
                $variant,
            )*
        }

        impl Keyword {
            /// Every keyword, in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant,)*];

            /// Attempts to parse a keyword from a string (case-insensitive).
            #[must_use]
            #[allow(clippy::should_implement_trait)]
            pub fn from_str(s: &str) -> Option<Self> {
                match s.to_ascii_uppercase().as_str() {
                    $($text => Some(Self::$variant),)*
                    _ => None,
                }
            }

            /// Returns the canonical upper-case spelling.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text,)*
                }
            }
        }
    };
}

define_keywords! {
    Action => "ACTION",
    Add => "ADD",
    All => "ALL",
    Alter => "ALTER",
    And => "AND",
    Any => "ANY",
    Apply => "APPLY",
    As => "AS",
    Asc => "ASC",
    At => "AT",
    Authorization => "AUTHORIZATION",
    Backup => "BACKUP",
    Begin => "BEGIN",
    Between => "BETWEEN",
    Break => "BREAK",
    Browse => "BROWSE",
    Bulk => "BULK",
    By => "BY",
    Cascade => "CASCADE",
    Case => "CASE",
    Cast => "CAST",
    Check => "CHECK",
    Checkpoint => "CHECKPOINT",
    Close => "CLOSE",
    Clustered => "CLUSTERED",
    Coalesce => "COALESCE",
    Collate => "COLLATE",
    Column => "COLUMN",
    Commit => "COMMIT",
    Compute => "COMPUTE",
    Constraint => "CONSTRAINT",
    Contains => "CONTAINS",
    Continue => "CONTINUE",
    Convert => "CONVERT",
    Create => "CREATE",
    Cross => "CROSS",
    Cube => "CUBE",
    Current => "CURRENT",
    CurrentDate => "CURRENT_DATE",
    CurrentTime => "CURRENT_TIME",
    CurrentTimestamp => "CURRENT_TIMESTAMP",
    CurrentUser => "CURRENT_USER",
    Cursor => "CURSOR",
    Database => "DATABASE",
    Date => "DATE",
    Dbcc => "DBCC",
    Deallocate => "DEALLOCATE",
    Declare => "DECLARE",
    Default => "DEFAULT",
    Delete => "DELETE",
    Deleted => "DELETED",
    Deny => "DENY",
    Desc => "DESC",
    Distinct => "DISTINCT",
    Distributed => "DISTRIBUTED",
    Drop => "DROP",
    Else => "ELSE",
    End => "END",
    Escape => "ESCAPE",
    Except => "EXCEPT",
    Exec => "EXEC",
    Execute => "EXECUTE",
    Exists => "EXISTS",
    Exit => "EXIT",
    External => "EXTERNAL",
    False => "FALSE",
    Fetch => "FETCH",
    File => "FILE",
    Fillfactor => "FILLFACTOR",
    First => "FIRST",
    Following => "FOLLOWING",
    For => "FOR",
    Foreign => "FOREIGN",
    Freetext => "FREETEXT",
    From => "FROM",
    Full => "FULL",
    Function => "FUNCTION",
    Goto => "GOTO",
    Grant => "GRANT",
    Group => "GROUP",
    Having => "HAVING",
    Holdlock => "HOLDLOCK",
    Identity => "IDENTITY",
    If => "IF",
    In => "IN",
    Include => "INCLUDE",
    Index => "INDEX",
    Inner => "INNER",
    Insert => "INSERT",
    Inserted => "INSERTED",
    Intersect => "INTERSECT",
    Into => "INTO",
    Is => "IS",
    Join => "JOIN",
    Key => "KEY",
    Kill => "KILL",
    Last => "LAST",
    Left => "LEFT",
    Like => "LIKE",
    Limit => "LIMIT",
    Lineno => "LINENO",
    Load => "LOAD",
    Matched => "MATCHED",
    Merge => "MERGE",
    Name => "NAME",
    National => "NATIONAL",
    Next => "NEXT",
    No => "NO",
    Nocheck => "NOCHECK",
    Nonclustered => "NONCLUSTERED",
    Not => "NOT",
    Null => "NULL",
    Nullif => "NULLIF",
    Nulls => "NULLS",
    Of => "OF",
    Off => "OFF",
    Offset => "OFFSET",
    On => "ON",
    Only => "ONLY",
    Open => "OPEN",
    Openquery => "OPENQUERY",
    Openrowset => "OPENROWSET",
    Option => "OPTION",
    Or => "OR",
    Order => "ORDER",
    Out => "OUT",
    Outer => "OUTER",
    Output => "OUTPUT",
    Over => "OVER",
    Partition => "PARTITION",
    Percent => "PERCENT",
    Pivot => "PIVOT",
    Plan => "PLAN",
    Preceding => "PRECEDING",
    Precision => "PRECISION",
    Primary => "PRIMARY",
    Print => "PRINT",
    Proc => "PROC",
    Procedure => "PROCEDURE",
    Public => "PUBLIC",
    Raiserror => "RAISERROR",
    Range => "RANGE",
    Read => "READ",
    Reconfigure => "RECONFIGURE",
    References => "REFERENCES",
    Replication => "REPLICATION",
    Restore => "RESTORE",
    Restrict => "RESTRICT",
    Return => "RETURN",
    Revert => "REVERT",
    Revoke => "REVOKE",
    Right => "RIGHT",
    Rollback => "ROLLBACK",
    Rollup => "ROLLUP",
    Row => "ROW",
    Rowcount => "ROWCOUNT",
    Rows => "ROWS",
    Rule => "RULE",
    Save => "SAVE",
    Schema => "SCHEMA",
    Select => "SELECT",
    SessionUser => "SESSION_USER",
    Set => "SET",
    Setuser => "SETUSER",
    Shutdown => "SHUTDOWN",
    Some => "SOME",
    Source => "SOURCE",
    State => "STATE",
    Statistics => "STATISTICS",
    SystemUser => "SYSTEM_USER",
    Table => "TABLE",
    Tablesample => "TABLESAMPLE",
    Target => "TARGET",
    Textsize => "TEXTSIZE",
    Then => "THEN",
    Ties => "TIES",
    Time => "TIME",
    Timestamp => "TIMESTAMP",
    To => "TO",
    Top => "TOP",
    Tran => "TRAN",
    Transaction => "TRANSACTION",
    Trigger => "TRIGGER",
    True => "TRUE",
    Truncate => "TRUNCATE",
    TryCast => "TRY_CAST",
    TryConvert => "TRY_CONVERT",
    Type => "TYPE",
    Unbounded => "UNBOUNDED",
    Union => "UNION",
    Unique => "UNIQUE",
    Unknown => "UNKNOWN",
    Unpivot => "UNPIVOT",
    Update => "UPDATE",
    Use => "USE",
    User => "USER",
    Using => "USING",
    Values => "VALUES",
    Varying => "VARYING",
    View => "VIEW",
    Waitfor => "WAITFOR",
    When => "WHEN",
    Where => "WHERE",
    While => "WHILE",
    With => "WITH",
    Within => "WITHIN",
    Work => "WORK",
    Writetext => "WRITETEXT",
    Zone => "ZONE",
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Keyword {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// How an identifier was delimited in the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum QuoteStyle {
    /// `[name]`
    Bracket,
    /// `"name"`
    DoubleQuote,
    /// `` `name` ``
    Backtick,
}

impl QuoteStyle {
    /// The opening delimiter.
    #[must_use]
    pub const fn open(self) -> char {
        match self {
            Self::Bracket => '[',
            Self::DoubleQuote => '"',
            Self::Backtick => '`',
        }
    }

    /// The closing delimiter.
    #[must_use]
    pub const fn close(self) -> char {
        match self {
            Self::Bracket => ']',
            Self::DoubleQuote => '"',
            Self::Backtick => '`',
        }
    }
}

/// Lexical class of a numeric literal.
///
/// Decided purely from the spelling; the literal text itself is kept verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum NumberKind {
    /// Digits only (`42`).
    Integer,
    /// Contains a decimal point (`1.5`, `1.`, `.5`).
    Decimal,
    /// Contains an exponent (`1e10`, `2.5E-3`).
    Float,
}

/// The kind of token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TokenKind {
    // Literals
    /// Numeric literal; the digits live in the token lexeme.
    Number(NumberKind),
    /// String literal with escapes resolved (`'it''s'`, `N'text'`).
    String {
        /// The unescaped value.
        value: String,
        /// `N'...'` national string.
        national: bool,
    },
    /// Binary literal (`0x1F` or `X'1F'`); holds the hex digits only.
    HexString(String),
    /// Bit string (`B'0101'`); holds the binary digits only.
    BitString(String),

    // Names
    /// Identifier, either bare or delimited.
    Identifier {
        /// The identifier with delimiters removed and escapes resolved.
        value: String,
        /// Delimiter used, if any.
        quote: Option<QuoteStyle>,
    },
    /// SQL keyword.
    Keyword(Keyword),
    /// `@name` or `@@name`, including the leading `@` signs.
    Variable(String),
    /// `?`
    Parameter,

    // Operators
    /// +
    Plus,
    /// -
    Minus,
    /// *
    Star,
    /// /
    Slash,
    /// %
    Percent,
    /// =
    Eq,
    /// `<>` or `!=`
    NotEq,
    /// <
    Lt,
    /// <=
    LtEq,
    /// >
    Gt,
    /// >=
    GtEq,
    /// !<
    NotLt,
    /// !>
    NotGt,
    /// ||
    Concat,
    /// &
    BitAnd,
    /// |
    BitOr,
    /// ^
    BitXor,
    /// ~
    BitNot,
    /// <<
    LeftShift,
    /// >>
    RightShift,

    // Delimiters
    /// (
    LeftParen,
    /// )
    RightParen,
    /// {
    LeftBrace,
    /// }
    RightBrace,
    /// ,
    Comma,
    /// ;
    Semicolon,
    /// .
    Dot,
    /// :
    Colon,
    /// ::
    DoubleColon,

    /// End of input
    Eof,
}

impl TokenKind {
    /// Fixed spelling of punctuation and operator tokens.
    #[must_use]
    pub const fn punctuation(&self) -> Option<&'static str> {
        Some(match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Star => "*",
            Self::Slash => "/",
            Self::Percent => "%",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::NotLt => "!<",
            Self::NotGt => "!>",
            Self::Concat => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::BitNot => "~",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
            Self::LeftParen => "(",
            Self::RightParen => ")",
            Self::LeftBrace => "{",
            Self::RightBrace => "}",
            Self::Comma => ",",
            Self::Semicolon => ";",
            Self::Dot => ".",
            Self::Colon => ":",
            Self::DoubleColon => "::",
            Self::Parameter => "?",
            _ => return None,
        })
    }
}

/// A token with its location in the source code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// The kind of token.
    pub kind: TokenKind,
    /// Raw source text of the token.
    pub lexeme: String,
    /// Byte range in the source.
    pub span: Span,
    /// 1-based line of the first character.
    pub line: u32,
    /// 1-based column (in characters) of the first character.
    pub column: u32,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span, line: u32, column: u32) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
            line,
            column,
        }
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    /// Returns true if this token is the given keyword.
    #[must_use]
    pub fn is_keyword(&self, keyword: Keyword) -> bool {
        self.kind == TokenKind::Keyword(keyword)
    }

    /// Returns the keyword if this is a keyword token.
    #[must_use]
    pub const fn as_keyword(&self) -> Option<Keyword> {
        match &self.kind {
            TokenKind::Keyword(kw) => Some(*kw),
            _ => None,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            TokenKind::Eof => f.write_str("end of input"),
            TokenKind::Keyword(kw) => write!(f, "keyword {kw}"),
            TokenKind::Identifier { .. } => write!(f, "identifier {}", self.lexeme),
            TokenKind::Variable(name) => write!(f, "variable {name}"),
            TokenKind::Number(_) => write!(f, "number {}", self.lexeme),
            TokenKind::String { .. } | TokenKind::HexString(_) | TokenKind::BitString(_) => {
                write!(f, "literal {}", self.lexeme)
            }
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}
