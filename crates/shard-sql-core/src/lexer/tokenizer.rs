//! SQL Tokenizer implementation.

use tracing::debug;

use super::{Keyword, LexicalError, LexicalErrorKind, NumberKind, Span, Token, TokenKind};
use crate::dialect::{Dialect, StringEscape};

const SNIPPET_CHARS: usize = 24;

/// A lexer that tokenizes SQL input according to a dialect.
///
/// The lexer is also an [`Iterator`] over `Result<Token, LexicalError>`: it
/// yields every token including the final [`TokenKind::Eof`], then stops. After
/// an error it yields nothing more unless [`Lexer::skip_to_statement_end`] is
/// called.
pub struct Lexer<'a> {
    /// The input source code.
    input: &'a str,
    dialect: &'a dyn Dialect,
    /// The current byte position.
    pos: usize,
    /// The byte position of the start of the current token.
    start: usize,
    line: u32,
    column: u32,
    start_line: u32,
    start_column: u32,
    /// Set after EOF or an error has been yielded by the iterator.
    done: bool,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer for the given input.
    #[must_use]
    pub fn new(input: &'a str, dialect: &'a dyn Dialect) -> Self {
        Self {
            input,
            dialect,
            pos: 0,
            start: 0,
            line: 1,
            column: 1,
            start_line: 1,
            start_column: 1,
            done: false,
        }
    }

    /// Returns the current character without advancing.
    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    /// Returns the next character without advancing.
    fn peek_next(&self) -> Option<char> {
        let mut chars = self.input[self.pos..].chars();
        chars.next();
        chars.next()
    }

    /// Advances to the next character and returns it.
    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn advance_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.peek().is_some_and(&pred) {
            self.advance();
        }
    }

    fn error(&self, kind: LexicalErrorKind) -> LexicalError {
        self.error_at(kind, self.pos, self.line, self.column)
    }

    fn error_at(&self, kind: LexicalErrorKind, position: usize, line: u32, column: u32) -> LexicalError {
        let snippet: String = self.input[self.start..].chars().take(SNIPPET_CHARS).collect();
        LexicalError {
            kind,
            position,
            line,
            column,
            snippet,
        }
    }

    /// Skips whitespace and comments.
    fn skip_whitespace_and_comments(&mut self) -> Result<(), LexicalError> {
        loop {
            self.advance_while(char::is_whitespace);

            if self.peek() == Some('-') && self.peek_next() == Some('-') {
                self.advance_while(|c| c != '\n');
                continue;
            }

            if self.peek() == Some('/') && self.peek_next() == Some('*') {
                self.skip_block_comment()?;
                continue;
            }

            return Ok(());
        }
    }

    fn skip_block_comment(&mut self) -> Result<(), LexicalError> {
        self.start = self.pos;
        self.advance(); // /
        self.advance(); // *
        let mut depth = 1usize;
        while depth > 0 {
            match self.advance() {
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    depth -= 1;
                }
                Some('/') if self.peek() == Some('*') && self.dialect.supports_nested_comments() => {
                    self.advance();
                    depth += 1;
                }
                Some(_) => {}
                None => return Err(self.error(LexicalErrorKind::UnterminatedComment)),
            }
        }
        Ok(())
    }

    /// Creates a token spanning from the token start to the current position.
    fn make_token(&self, kind: TokenKind) -> Token {
        Token::new(
            kind,
            &self.input[self.start..self.pos],
            Span::new(self.start, self.pos),
            self.start_line,
            self.start_column,
        )
    }

    /// Scans an identifier or keyword.
    fn scan_identifier(&mut self) -> Token {
        let dialect = self.dialect;
        self.advance_while(|c| dialect.is_identifier_part(c));
        let text = &self.input[self.start..self.pos];
        match Keyword::from_str(text) {
            Some(keyword) => self.make_token(TokenKind::Keyword(keyword)),
            None => self.make_token(TokenKind::Identifier {
                value: String::from(text),
                quote: None,
            }),
        }
    }

    /// Scans a delimited identifier such as `[order id]` or `"order id"`.
    fn scan_quoted_identifier(&mut self, style: super::QuoteStyle) -> Result<Token, LexicalError> {
        self.advance(); // opening delimiter
        let close = style.close();
        let mut value = String::new();
        loop {
            match self.advance() {
                Some(c) if c == close => {
                    if self.peek() == Some(close) {
                        value.push(close);
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some(c) => value.push(c),
                None => return Err(self.error(LexicalErrorKind::UnterminatedIdentifier)),
            }
        }
        Ok(self.make_token(TokenKind::Identifier {
            value,
            quote: Some(style),
        }))
    }

    /// Scans a variable (`@name`, `@@name`).
    fn scan_variable(&mut self) -> Result<Token, LexicalError> {
        self.advance(); // @
        if self.peek() == Some('@') {
            self.advance();
        }
        let dialect = self.dialect;
        let body_start = self.pos;
        self.advance_while(|c| dialect.is_identifier_part(c));
        if self.pos == body_start {
            return Err(self.error_at(
                LexicalErrorKind::UnexpectedCharacter('@'),
                self.start,
                self.start_line,
                self.start_column,
            ));
        }
        let name = String::from(&self.input[self.start..self.pos]);
        Ok(self.make_token(TokenKind::Variable(name)))
    }

    /// Scans a numeric literal, including `0x` binary literals.
    fn scan_number(&mut self) -> Token {
        if self.peek() == Some('0') && matches!(self.peek_next(), Some('x' | 'X')) {
            self.advance();
            self.advance();
            let digits_start = self.pos;
            self.advance_while(|c| c.is_ascii_hexdigit());
            let digits = String::from(&self.input[digits_start..self.pos]);
            return self.make_token(TokenKind::HexString(digits));
        }

        let mut kind = NumberKind::Integer;
        self.advance_while(|c| c.is_ascii_digit());

        if self.peek() == Some('.') {
            kind = NumberKind::Decimal;
            self.advance();
            self.advance_while(|c| c.is_ascii_digit());
        }

        if matches!(self.peek(), Some('e' | 'E')) {
            let signed = matches!(self.peek_next(), Some('+' | '-'));
            let digit_offset = if signed { 2 } else { 1 };
            let has_digit = self.input[self.pos..]
                .chars()
                .nth(digit_offset)
                .is_some_and(|c| c.is_ascii_digit());
            if has_digit {
                kind = NumberKind::Float;
                for _ in 0..digit_offset {
                    self.advance();
                }
                self.advance_while(|c| c.is_ascii_digit());
            }
        }

        self.make_token(TokenKind::Number(kind))
    }

    /// Scans a string literal body; the caller has consumed any prefix.
    fn scan_string(&mut self, national: bool) -> Result<Token, LexicalError> {
        self.advance(); // opening quote
        let mut value = String::new();
        let backslash = self.dialect.string_escape() == StringEscape::Backslash;

        loop {
            match self.advance() {
                Some('\'') => {
                    if self.peek() == Some('\'') {
                        value.push('\'');
                        self.advance();
                    } else {
                        break;
                    }
                }
                Some('\\') if backslash => {
                    let escape_line = self.line;
                    let escape_column = self.column;
                    let escape_pos = self.pos;
                    match self.advance() {
                        Some(c) => value.push_str(unescape(c).ok_or_else(|| {
                            self.error_at(
                                LexicalErrorKind::InvalidEscape(c),
                                escape_pos,
                                escape_line,
                                escape_column,
                            )
                        })?),
                        None => return Err(self.error(LexicalErrorKind::UnterminatedString)),
                    }
                }
                Some(c) => value.push(c),
                None => return Err(self.error(LexicalErrorKind::UnterminatedString)),
            }
        }

        Ok(self.make_token(TokenKind::String { value, national }))
    }

    /// Scans `X'..'` or `B'..'` after the prefix letter.
    fn scan_binary_string(&mut self, radix: u32) -> Result<Token, LexicalError> {
        self.advance(); // X / B
        self.advance(); // opening quote
        let digits_start = self.pos;
        loop {
            let (line, column, pos) = (self.line, self.column, self.pos);
            match self.advance() {
                Some('\'') => break,
                Some(c) if c.is_digit(radix) => {}
                Some(c) => {
                    return Err(self.error_at(LexicalErrorKind::InvalidDigit(c), pos, line, column));
                }
                None => return Err(self.error(LexicalErrorKind::UnterminatedString)),
            }
        }
        let digits = String::from(&self.input[digits_start..self.pos - 1]);
        let kind = if radix == 16 {
            TokenKind::HexString(digits)
        } else {
            TokenKind::BitString(digits)
        };
        Ok(self.make_token(kind))
    }

    fn one_or_two(&mut self, second: char, single: TokenKind, double: TokenKind) -> Token {
        if self.peek() == Some(second) {
            self.advance();
            self.make_token(double)
        } else {
            self.make_token(single)
        }
    }

    /// Scans the next token.
    ///
    /// # Errors
    ///
    /// Returns a [`LexicalError`] for unterminated literals, comments or
    /// identifiers, invalid escapes, and characters that start no token.
    pub fn next_token(&mut self) -> Result<Token, LexicalError> {
        self.skip_whitespace_and_comments()?;
        self.start = self.pos;
        self.start_line = self.line;
        self.start_column = self.column;

        let Some(c) = self.peek() else {
            return Ok(self.make_token(TokenKind::Eof));
        };

        if let Some(style) = self.dialect.identifier_quote(c) {
            return self.scan_quoted_identifier(style);
        }

        let next = self.peek_next();
        match c {
            '\'' => return self.scan_string(false),
            'N' | 'n' if next == Some('\'') && self.dialect.supports_national_strings() => {
                self.advance();
                return self.scan_string(true);
            }
            'X' | 'x' if next == Some('\'') => return self.scan_binary_string(16),
            'B' | 'b' if next == Some('\'') => return self.scan_binary_string(2),
            '@' if self.dialect.supports_variables() => return self.scan_variable(),
            c if c.is_ascii_digit() => return Ok(self.scan_number()),
            '.' if next.is_some_and(|n| n.is_ascii_digit()) => return Ok(self.scan_number()),
            c if self.dialect.is_identifier_start(c) => return Ok(self.scan_identifier()),
            _ => {}
        }

        self.advance();
        let token = match c {
            '(' => self.make_token(TokenKind::LeftParen),
            ')' => self.make_token(TokenKind::RightParen),
            '{' => self.make_token(TokenKind::LeftBrace),
            '}' => self.make_token(TokenKind::RightBrace),
            ',' => self.make_token(TokenKind::Comma),
            ';' => self.make_token(TokenKind::Semicolon),
            '.' => self.make_token(TokenKind::Dot),
            '+' => self.make_token(TokenKind::Plus),
            '-' => self.make_token(TokenKind::Minus),
            '*' => self.make_token(TokenKind::Star),
            '/' => self.make_token(TokenKind::Slash),
            '%' => self.make_token(TokenKind::Percent),
            '~' => self.make_token(TokenKind::BitNot),
            '^' => self.make_token(TokenKind::BitXor),
            '&' => self.make_token(TokenKind::BitAnd),
            '?' => self.make_token(TokenKind::Parameter),
            '=' => self.make_token(TokenKind::Eq),
            ':' => self.one_or_two(':', TokenKind::Colon, TokenKind::DoubleColon),
            '|' => self.one_or_two('|', TokenKind::BitOr, TokenKind::Concat),
            '<' => match self.peek() {
                Some('=') => {
                    self.advance();
                    self.make_token(TokenKind::LtEq)
                }
                Some('>') => {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                }
                Some('<') => {
                    self.advance();
                    self.make_token(TokenKind::LeftShift)
                }
                _ => self.make_token(TokenKind::Lt),
            },
            '>' => match self.peek() {
                Some('=') => {
                    self.advance();
                    self.make_token(TokenKind::GtEq)
                }
                Some('>') => {
                    self.advance();
                    self.make_token(TokenKind::RightShift)
                }
                _ => self.make_token(TokenKind::Gt),
            },
            '!' => match self.peek() {
                Some('=') => {
                    self.advance();
                    self.make_token(TokenKind::NotEq)
                }
                Some('<') => {
                    self.advance();
                    self.make_token(TokenKind::NotLt)
                }
                Some('>') => {
                    self.advance();
                    self.make_token(TokenKind::NotGt)
                }
                _ => {
                    return Err(self.error_at(
                        LexicalErrorKind::UnexpectedCharacter('!'),
                        self.start,
                        self.start_line,
                        self.start_column,
                    ));
                }
            },
            other => {
                return Err(self.error_at(
                    LexicalErrorKind::UnexpectedCharacter(other),
                    self.start,
                    self.start_line,
                    self.start_column,
                ));
            }
        };
        Ok(token)
    }

    /// Tokenizes the rest of the input, ending with an EOF token.
    ///
    /// # Errors
    ///
    /// Returns the first [`LexicalError`] encountered.
    pub fn tokenize(&mut self) -> Result<Vec<Token>, LexicalError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let is_eof = token.is_eof();
            tokens.push(token);
            if is_eof {
                return Ok(tokens);
            }
        }
    }

    /// Moves past the next `;` in the raw text (or to end of input) so that
    /// lexing can resume after an error.
    ///
    /// Quotes are not interpreted while skipping.
    pub fn skip_to_statement_end(&mut self) {
        while let Some(c) = self.advance() {
            if c == ';' {
                break;
            }
        }
        self.done = false;
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, LexicalError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.next_token();
        self.done = match &result {
            Ok(token) => token.is_eof(),
            Err(_) => true,
        };
        Some(result)
    }
}

const fn unescape(c: char) -> Option<&'static str> {
    Some(match c {
        '\'' => "'",
        '"' => "\"",
        '\\' => "\\",
        'n' => "\n",
        't' => "\t",
        'r' => "\r",
        '0' => "\0",
        'b' => "\u{8}",
        'Z' => "\u{1a}",
        '%' => "\\%",
        '_' => "\\_",
        _ => return None,
    })
}

/// Tokenizes `sql` completely, ending with an EOF token.
///
/// # Errors
///
/// Returns the first [`LexicalError`]; no tokens are returned in that case.
pub fn tokenize(sql: &str, dialect: &dyn Dialect) -> Result<Vec<Token>, LexicalError> {
    Lexer::new(sql, dialect).tokenize()
}

/// Tokenizes `sql`, skipping statements that fail to lex.
///
/// On an error, the tokens of the statement being lexed (everything after the
/// last `;` token) are dropped, the raw text is skipped up to and including the
/// next `;`, and lexing resumes. The token list always ends with EOF.
#[must_use]
pub fn tokenize_recovering(sql: &str, dialect: &dyn Dialect) -> (Vec<Token>, Vec<LexicalError>) {
    let mut lexer = Lexer::new(sql, dialect);
    let mut tokens: Vec<Token> = Vec::new();
    let mut errors = Vec::new();
    loop {
        match lexer.next_token() {
            Ok(token) => {
                let is_eof = token.is_eof();
                tokens.push(token);
                if is_eof {
                    return (tokens, errors);
                }
            }
            Err(error) => {
                debug!(position = error.position, kind = %error.kind, "skipping statement after lexical error");
                let keep = tokens
                    .iter()
                    .rposition(|t| t.kind == TokenKind::Semicolon)
                    .map_or(0, |i| i + 1);
                tokens.truncate(keep);
                errors.push(error);
                lexer.skip_to_statement_end();
            }
        }
    }
}
