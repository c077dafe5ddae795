//! Expression nodes.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;

use super::{comma_separated, DataType, OrderByExpr, SelectStatement};
use crate::lexer::{NumberKind, QuoteStyle, Span};

/// An identifier, with the delimiter it was written with.
///
/// Equality and hashing ignore the span.
#[derive(Debug, Clone, Eq, Serialize)]
pub struct Ident {
    /// Name with delimiters removed.
    pub value: String,
    /// Delimiter used in the source, if any.
    pub quote_style: Option<QuoteStyle>,
    /// Where the identifier appeared.
    #[serde(skip)]
    pub span: Span,
}

impl Ident {
    /// Creates an undelimited identifier.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quote_style: None,
            span: Span::default(),
        }
    }

    /// Creates a delimited identifier.
    #[must_use]
    pub fn with_quote(quote: QuoteStyle, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            quote_style: Some(quote),
            span: Span::default(),
        }
    }

    /// Attaches a source span.
    #[must_use]
    pub const fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl PartialEq for Ident {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value && self.quote_style == other.quote_style
    }
}

impl Hash for Ident {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
        self.quote_style.hash(state);
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.quote_style {
            None => f.write_str(&self.value),
            Some(style) => {
                let close = style.close();
                let escaped = self.value.replace(close, &format!("{close}{close}"));
                write!(f, "{}{escaped}{close}", style.open())
            }
        }
    }
}

/// A possibly qualified name: `db.schema.table`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ObjectName(pub Vec<Ident>);

impl ObjectName {
    /// Builds an undelimited name from its parts.
    #[must_use]
    pub fn from_parts(parts: &[&str]) -> Self {
        Self(parts.iter().map(|p| Ident::new(*p)).collect())
    }

    /// The last (unqualified) part of the name.
    #[must_use]
    pub fn base_name(&self) -> Option<&Ident> {
        self.0.last()
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for part in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            first = false;
            write!(f, "{part}")?;
        }
        Ok(())
    }
}

/// Which temporal type a typed literal names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TemporalKind {
    /// `DATE '...'` / `{d '...'}`
    Date,
    /// `TIME '...'` / `{t '...'}`
    Time,
    /// `TIMESTAMP '...'` / `{ts '...'}`
    Timestamp,
}

impl TemporalKind {
    const fn keyword(self) -> &'static str {
        match self {
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
        }
    }

    const fn odbc_tag(self) -> &'static str {
        match self {
            Self::Date => "d",
            Self::Time => "t",
            Self::Timestamp => "ts",
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Literal {
    /// Numeric literal, spelled as in the source.
    Number {
        /// Source text.
        value: String,
        /// Integer, decimal or float.
        kind: NumberKind,
    },
    /// String literal with escapes resolved.
    String {
        /// Unescaped contents.
        value: String,
        /// `N'...'`
        national: bool,
    },
    /// Binary literal; hex digits only.
    Hex {
        digits: String,
        /// Written `X'..'` rather than `0x..`.
        quoted: bool,
    },
    /// Bit string; binary digits only.
    BitString(String),
    /// `TRUE` / `FALSE`
    Boolean(bool),
    /// `NULL`
    Null,
    /// `DATE '2024-01-01'` or `{d '2024-01-01'}`.
    Temporal {
        /// The temporal type.
        kind: TemporalKind,
        /// The quoted value.
        value: String,
        /// Written with ODBC escape braces.
        odbc: bool,
    },
}

fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    write!(f, "'{}'", value.replace('\'', "''"))
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number { value, .. } => f.write_str(value),
            Self::String { value, national } => {
                if *national {
                    f.write_str("N")?;
                }
                write_quoted(f, value)
            }
            Self::Hex { digits, quoted: false } => write!(f, "0x{digits}"),
            Self::Hex { digits, quoted: true } => write!(f, "X'{digits}'"),
            Self::BitString(digits) => write!(f, "B'{digits}'"),
            Self::Boolean(true) => f.write_str("TRUE"),
            Self::Boolean(false) => f.write_str("FALSE"),
            Self::Null => f.write_str("NULL"),
            Self::Temporal { kind, value, odbc } => {
                if *odbc {
                    write!(f, "{{{} ", kind.odbc_tag())?;
                    write_quoted(f, value)?;
                    f.write_str("}")
                } else {
                    write!(f, "{} ", kind.keyword())?;
                    write_quoted(f, value)
                }
            }
        }
    }
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BinaryOp {
    // Logical
    Or,
    And,
    // Comparison
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    /// `!<`
    NotLt,
    /// `!>`
    NotGt,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    /// `||`
    Concat,
    // Bitwise
    BitAnd,
    BitOr,
    BitXor,
    LeftShift,
    RightShift,
}

impl BinaryOp {
    /// Returns the SQL representation of this operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Or => "OR",
            Self::And => "AND",
            Self::Eq => "=",
            Self::NotEq => "<>",
            Self::Lt => "<",
            Self::LtEq => "<=",
            Self::Gt => ">",
            Self::GtEq => ">=",
            Self::NotLt => "!<",
            Self::NotGt => "!>",
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
            Self::Concat => "||",
            Self::BitAnd => "&",
            Self::BitOr => "|",
            Self::BitXor => "^",
            Self::LeftShift => "<<",
            Self::RightShift => ">>",
        }
    }

    /// True for `=`, `<>`, `<`, `<=`, `>`, `>=`, `!<`, `!>`.
    #[must_use]
    pub const fn is_comparison(&self) -> bool {
        matches!(
            self,
            Self::Eq | Self::NotEq | Self::Lt | Self::LtEq | Self::Gt | Self::GtEq | Self::NotLt | Self::NotGt
        )
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UnaryOp {
    /// NOT
    Not,
    /// -
    Minus,
    /// +
    Plus,
    /// ~
    BitNot,
}

impl UnaryOp {
    /// Returns the SQL representation of this operator.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Not => "NOT",
            Self::Minus => "-",
            Self::Plus => "+",
            Self::BitNot => "~",
        }
    }
}

/// The right-hand side of `IS [NOT] ...`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum IsTest {
    Null,
    True,
    False,
    Unknown,
}

impl fmt::Display for IsTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "NULL",
            Self::True => "TRUE",
            Self::False => "FALSE",
            Self::Unknown => "UNKNOWN",
        })
    }
}

/// `ANY` / `SOME` / `ALL` in a quantified comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Quantifier {
    Any,
    Some,
    All,
}

impl fmt::Display for Quantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Any => "ANY",
            Self::Some => "SOME",
            Self::All => "ALL",
        })
    }
}

/// The right-hand side of `IN`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum InList {
    /// `IN (1, 2, 3)`
    Values(Vec<Expr>),
    /// `IN (SELECT ...)`
    Subquery(Box<SelectStatement>),
}

/// Flavour of a cast expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CastKind {
    /// `CAST(expr AS type)`
    Cast,
    /// `TRY_CAST(expr AS type)`
    TryCast,
    /// `CONVERT(type, expr [, style])`
    Convert,
    /// `TRY_CONVERT(type, expr [, style])`
    TryConvert,
}

/// One `WHEN ... THEN ...` arm of a CASE expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct CaseWhen {
    pub condition: Expr,
    pub result: Expr,
}

/// `ROWS` or `RANGE` window frame units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FrameUnits {
    Rows,
    Range,
}

/// One end of a window frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum FrameBound {
    /// `CURRENT ROW`
    CurrentRow,
    /// `UNBOUNDED PRECEDING` (`None`) or `n PRECEDING`.
    Preceding(Option<Box<Expr>>),
    /// `UNBOUNDED FOLLOWING` (`None`) or `n FOLLOWING`.
    Following(Option<Box<Expr>>),
}

impl fmt::Display for FrameBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CurrentRow => f.write_str("CURRENT ROW"),
            Self::Preceding(None) => f.write_str("UNBOUNDED PRECEDING"),
            Self::Preceding(Some(n)) => write!(f, "{n} PRECEDING"),
            Self::Following(None) => f.write_str("UNBOUNDED FOLLOWING"),
            Self::Following(Some(n)) => write!(f, "{n} FOLLOWING"),
        }
    }
}

/// `ROWS BETWEEN start AND end` or `ROWS start`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WindowFrame {
    pub units: FrameUnits,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

impl fmt::Display for WindowFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let units = match self.units {
            FrameUnits::Rows => "ROWS",
            FrameUnits::Range => "RANGE",
        };
        match &self.end {
            Some(end) => write!(f, "{units} BETWEEN {} AND {end}", self.start),
            None => write!(f, "{units} {}", self.start),
        }
    }
}

/// The body of an `OVER (...)` clause.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct WindowSpec {
    pub partition_by: Vec<Expr>,
    pub order_by: Vec<OrderByExpr>,
    pub frame: Option<WindowFrame>,
}

impl fmt::Display for WindowSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        if !self.partition_by.is_empty() {
            write!(f, "PARTITION BY {}", comma_separated(&self.partition_by))?;
            sep = " ";
        }
        if !self.order_by.is_empty() {
            write!(f, "{sep}ORDER BY {}", comma_separated(&self.order_by))?;
            sep = " ";
        }
        if let Some(frame) = &self.frame {
            write!(f, "{sep}{frame}")?;
        }
        Ok(())
    }
}

/// A function call such as `COUNT(DISTINCT x)` or `ROW_NUMBER() OVER (...)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct FunctionCall {
    pub name: ObjectName,
    /// `DISTINCT` inside the argument list.
    pub distinct: bool,
    pub args: Vec<Expr>,
    /// Called without parentheses (`CURRENT_TIMESTAMP`).
    pub niladic: bool,
    pub over: Option<WindowSpec>,
}

impl fmt::Display for FunctionCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if self.niladic {
            return Ok(());
        }
        f.write_str("(")?;
        if self.distinct {
            f.write_str("DISTINCT ")?;
        }
        write!(f, "{})", comma_separated(&self.args))?;
        if let Some(over) = &self.over {
            write!(f, " OVER ({over})")?;
        }
        Ok(())
    }
}

/// SQL expressions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum Expr {
    /// Literal value.
    Literal(Literal),
    /// Column reference, optionally qualified.
    Column(ObjectName),
    /// `@name` / `@@name`
    Variable(String),
    /// `?` placeholder; `index` counts from 0 in source order.
    Parameter { index: usize },
    /// `*` as a function argument (`COUNT(*)`).
    Wildcard,
    /// `left op right`
    Binary {
        left: Box<Self>,
        op: BinaryOp,
        right: Box<Self>,
    },
    /// `op operand`
    Unary { op: UnaryOp, operand: Box<Self> },
    /// `expr IS [NOT] NULL|TRUE|FALSE|UNKNOWN`
    Is {
        expr: Box<Self>,
        negated: bool,
        test: IsTest,
    },
    /// `expr [NOT] IN (...)`
    In {
        expr: Box<Self>,
        list: InList,
        negated: bool,
    },
    /// `expr [NOT] BETWEEN low AND high`
    Between {
        expr: Box<Self>,
        low: Box<Self>,
        high: Box<Self>,
        negated: bool,
    },
    /// `expr [NOT] LIKE pattern [ESCAPE escape]`
    Like {
        expr: Box<Self>,
        pattern: Box<Self>,
        escape: Option<Box<Self>>,
        negated: bool,
    },
    /// `left op ANY|SOME|ALL (subquery)`
    Quantified {
        left: Box<Self>,
        op: BinaryOp,
        quantifier: Quantifier,
        subquery: Box<SelectStatement>,
    },
    /// `expr AT TIME ZONE zone`
    AtTimeZone { expr: Box<Self>, zone: Box<Self> },
    /// `expr COLLATE collation`
    Collate { expr: Box<Self>, collation: Ident },
    /// CAST / TRY_CAST / CONVERT / TRY_CONVERT
    Cast {
        kind: CastKind,
        expr: Box<Self>,
        data_type: DataType,
        style: Option<Box<Self>>,
    },
    /// `CASE [operand] WHEN ... THEN ... [ELSE ...] END`
    Case {
        operand: Option<Box<Self>>,
        conditions: Vec<CaseWhen>,
        else_result: Option<Box<Self>>,
    },
    /// Function call.
    Function(FunctionCall),
    /// `[NOT] EXISTS (subquery)`; negation is expressed as `Unary(Not, Exists)`.
    Exists(Box<SelectStatement>),
    /// Scalar subquery.
    Subquery(Box<SelectStatement>),
    /// Parenthesized expression.
    Nested(Box<Self>),
    /// Row constructor `(a, b, ...)`.
    Row(Vec<Self>),
    /// `DEFAULT` in VALUES lists and SET clauses.
    Default,
}

impl Expr {
    /// Creates an unqualified column reference.
    #[must_use]
    pub fn column(name: &str) -> Self {
        Self::Column(ObjectName(vec![Ident::new(name)]))
    }

    /// Creates an integer literal.
    #[must_use]
    pub fn integer(value: i64) -> Self {
        Self::Literal(Literal::Number {
            value: value.to_string(),
            kind: NumberKind::Integer,
        })
    }

    /// Creates a string literal.
    #[must_use]
    pub fn string(value: &str) -> Self {
        Self::Literal(Literal::String {
            value: value.to_string(),
            national: false,
        })
    }

    /// Creates a binary expression.
    #[must_use]
    pub fn binary(left: Self, op: BinaryOp, right: Self) -> Self {
        Self::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }
}

fn not_kw(negated: bool) -> &'static str {
    if negated {
        "NOT "
    } else {
        ""
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(lit) => write!(f, "{lit}"),
            Self::Column(name) => write!(f, "{name}"),
            Self::Variable(name) => f.write_str(name),
            Self::Parameter { .. } => f.write_str("?"),
            Self::Wildcard => f.write_str("*"),
            Self::Binary { left, op, right } => write!(f, "{left} {op} {right}"),
            Self::Unary { op, operand } => match op {
                UnaryOp::Not => write!(f, "NOT {operand}"),
                _ => {
                    let inner = operand.to_string();
                    // `- -1` must not collapse into a `--` comment.
                    if inner.starts_with(['-', '+', '~']) {
                        write!(f, "{} {inner}", op.as_str())
                    } else {
                        write!(f, "{}{inner}", op.as_str())
                    }
                }
            },
            Self::Is { expr, negated, test } => write!(f, "{expr} IS {}{test}", not_kw(*negated)),
            Self::In { expr, list, negated } => {
                write!(f, "{expr} {}IN (", not_kw(*negated))?;
                match list {
                    InList::Values(values) => write!(f, "{}", comma_separated(values))?,
                    InList::Subquery(query) => write!(f, "{query}")?,
                }
                f.write_str(")")
            }
            Self::Between {
                expr,
                low,
                high,
                negated,
            } => write!(f, "{expr} {}BETWEEN {low} AND {high}", not_kw(*negated)),
            Self::Like {
                expr,
                pattern,
                escape,
                negated,
            } => {
                write!(f, "{expr} {}LIKE {pattern}", not_kw(*negated))?;
                if let Some(escape) = escape {
                    write!(f, " ESCAPE {escape}")?;
                }
                Ok(())
            }
            Self::Quantified {
                left,
                op,
                quantifier,
                subquery,
            } => write!(f, "{left} {op} {quantifier} ({subquery})"),
            Self::AtTimeZone { expr, zone } => write!(f, "{expr} AT TIME ZONE {zone}"),
            Self::Collate { expr, collation } => write!(f, "{expr} COLLATE {collation}"),
            Self::Cast {
                kind,
                expr,
                data_type,
                style,
            } => match kind {
                CastKind::Cast => write!(f, "CAST({expr} AS {data_type})"),
                CastKind::TryCast => write!(f, "TRY_CAST({expr} AS {data_type})"),
                CastKind::Convert | CastKind::TryConvert => {
                    let name = if *kind == CastKind::Convert {
                        "CONVERT"
                    } else {
                        "TRY_CONVERT"
                    };
                    write!(f, "{name}({data_type}, {expr}")?;
                    if let Some(style) = style {
                        write!(f, ", {style}")?;
                    }
                    f.write_str(")")
                }
            },
            Self::Case {
                operand,
                conditions,
                else_result,
            } => {
                f.write_str("CASE")?;
                if let Some(operand) = operand {
                    write!(f, " {operand}")?;
                }
                for when in conditions {
                    write!(f, " WHEN {} THEN {}", when.condition, when.result)?;
                }
                if let Some(else_result) = else_result {
                    write!(f, " ELSE {else_result}")?;
                }
                f.write_str(" END")
            }
            Self::Function(call) => write!(f, "{call}"),
            Self::Exists(query) => write!(f, "EXISTS ({query})"),
            Self::Subquery(query) => write!(f, "({query})"),
            Self::Nested(expr) => write!(f, "({expr})"),
            Self::Row(items) => write!(f, "({})", comma_separated(items)),
            Self::Default => f.write_str("DEFAULT"),
        }
    }
}
