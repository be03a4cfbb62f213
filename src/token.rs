use std::fmt;

/// Source location for error reporting.
///
/// Both fields are 1-based; `column` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Span {
    pub line: usize,
    pub column: usize,
}

impl Span {
    #[must_use]
    pub const fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

/// `" at line L, column C"`, or nothing when the location is unknown.
pub(crate) fn location_suffix(span: Option<&Span>) -> String {
    span.map_or_else(String::new, |s| {
        format!(" at line {}, column {}", s.line, s.column)
    })
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.line, self.column)
    }
}

/// Token kinds produced by the lexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    /// Integer or decimal literal (`42`, `3.14`).
    Number,
    /// Letter or underscore followed by letters, digits, underscores.
    Identifier,
    /// One of `==`, `!=`, `<=`, `>=`, `++`, `--`, `+`, `-`, `*`, `/`,
    /// `=`, `<`, `>`.
    Operator,
    /// One of `(`, `)`, `[`, `]`, `{`, `}`, `;`, `,`, `.`.
    Delimiter,
    /// Single- or double-quoted string, quotes included.
    String,
    /// Line comment (`// ...`). Only emitted when comments are kept.
    Comment,
    /// A character no pattern accepts. Never part of a token list;
    /// used when a `LexError` is viewed as a token.
    Unknown,
}

impl TokenKind {
    /// Upper-case label used by the token table.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Number => "NUMBER",
            Self::Identifier => "IDENTIFIER",
            Self::Operator => "OPERATOR",
            Self::Delimiter => "DELIMITER",
            Self::String => "STRING",
            Self::Comment => "COMMENT",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single token with its kind, lexeme, and source location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    /// True when this token is the given operator or delimiter.
    #[must_use]
    pub fn is_punct(&self, text: &str) -> bool {
        matches!(self.kind, TokenKind::Operator | TokenKind::Delimiter) && self.lexeme == text
    }

    /// True when this token is an identifier spelled `word`.
    #[must_use]
    pub fn is_word(&self, word: &str) -> bool {
        self.kind == TokenKind::Identifier && self.lexeme == word
    }
}
