use std::fmt;

use crate::token::{Span, Token, TokenKind};

/// Operators, longest first so `==` wins over `=`.
const OPERATORS: &[&str] = &[
    "==", "!=", "<=", ">=", "++", "--", "+", "-", "*", "/", "=", "<", ">",
];

const DELIMITERS: &[char] = &['(', ')', '[', ']', '{', '}', ';', ',', '.'];

/// Classifies a lexer error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LexErrorKind {
    /// Character that cannot start any token.
    UnknownSymbol(char),
}

impl fmt::Display for LexErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSymbol(ch) => write!(f, "unknown symbol '{ch}'"),
        }
    }
}

/// Error produced during lexing. Lexing continues past it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {}, column {}", span.line, span.column)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub span: Span,
}

impl LexError {
    /// View the rejected character as an `Unknown` token.
    #[must_use]
    pub fn to_token(&self) -> Token {
        let LexErrorKind::UnknownSymbol(ch) = self.kind;
        Token {
            kind: TokenKind::Unknown,
            lexeme: ch.to_string(),
            span: self.span,
        }
    }
}

/// Every lexical error of one input, in source order.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{} lexical error(s), first: {}", .0.len(), first_message(.0))]
pub struct LexErrors(pub Vec<LexError>);

fn first_message(errors: &[LexError]) -> String {
    errors.first().map(ToString::to_string).unwrap_or_default()
}

/// Lexer settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LexOptions {
    /// Emit `Comment` tokens instead of discarding comments.
    pub keep_comments: bool,
}

/// Output of one tokenizer pass: accepted tokens plus rejected characters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Lexed {
    pub tokens: Vec<Token>,
    pub errors: Vec<LexError>,
}

impl Lexed {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    /// Tokens and rejected characters interleaved in source order.
    #[must_use]
    pub fn sequence(&self) -> Vec<Token> {
        let mut all: Vec<Token> = self
            .tokens
            .iter()
            .cloned()
            .chain(self.errors.iter().map(LexError::to_token))
            .collect();
        all.sort_by_key(|t| t.span);
        all
    }
}

/// Tokenize source text, discarding comments and whitespace.
///
/// Never fails: characters no pattern accepts are reported in
/// `Lexed::errors` and scanning resumes at the next character.
#[must_use]
pub fn tokenize(input: &str) -> Lexed {
    tokenize_with(input, LexOptions::default())
}

/// Tokenize source text with explicit options.
#[must_use]
pub fn tokenize_with(input: &str, options: LexOptions) -> Lexed {
    let input = input.strip_prefix('\u{FEFF}').unwrap_or(input);
    let mut out = Lexed::default();
    for (index, line) in input.split('\n').enumerate() {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let chars: Vec<char> = line.chars().collect();
        LineLexer {
            chars: &chars,
            pos: 0,
            line: index + 1,
            options,
        }
        .run(&mut out);
    }
    out
}

/// What the pattern table matched at the cursor.
enum Scan {
    Token(TokenKind, usize),
    Skip(usize),
}

struct LineLexer<'a> {
    chars: &'a [char],
    pos: usize,
    line: usize,
    options: LexOptions,
}

impl LineLexer<'_> {
    fn run(mut self, out: &mut Lexed) {
        while self.pos < self.chars.len() {
            let span = Span::new(self.line, self.pos + 1);
            match self.scan() {
                Some(Scan::Token(kind, len)) => {
                    let lexeme: String = self.chars[self.pos..self.pos + len].iter().collect();
                    out.tokens.push(Token { kind, lexeme, span });
                    self.pos += len;
                }
                Some(Scan::Skip(len)) => self.pos += len,
                None => {
                    out.errors.push(LexError {
                        kind: LexErrorKind::UnknownSymbol(self.chars[self.pos]),
                        span,
                    });
                    self.pos += 1;
                }
            }
        }
    }

    /// Try every pattern in priority order; the first match wins.
    fn scan(&self) -> Option<Scan> {
        let rest = &self.chars[self.pos..];
        self.comment(rest)
            .or_else(|| string(rest))
            .or_else(|| number(rest))
            .or_else(|| identifier(rest))
            .or_else(|| operator(rest))
            .or_else(|| delimiter(rest))
            .or_else(|| whitespace(rest))
    }

    fn comment(&self, rest: &[char]) -> Option<Scan> {
        if rest.starts_with(&['/', '/']) {
            Some(if self.options.keep_comments {
                Scan::Token(TokenKind::Comment, rest.len())
            } else {
                Scan::Skip(rest.len())
            })
        } else {
            None
        }
    }
}

fn string(rest: &[char]) -> Option<Scan> {
    let quote = *rest.first()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let mut i = 1;
    while i < rest.len() {
        match rest[i] {
            '\\' => i += 2,
            c if c == quote => return Some(Scan::Token(TokenKind::String, i + 1)),
            _ => i += 1,
        }
    }
    // unterminated on this line: not a string
    None
}

fn number(rest: &[char]) -> Option<Scan> {
    let int = rest.iter().take_while(|c| c.is_ascii_digit()).count();
    if int == 0 {
        return None;
    }
    let mut len = int;
    if rest.get(len) == Some(&'.') {
        let frac = rest[len + 1..]
            .iter()
            .take_while(|c| c.is_ascii_digit())
            .count();
        if frac > 0 {
            len += 1 + frac;
        }
    }
    Some(Scan::Token(TokenKind::Number, len))
}

fn identifier(rest: &[char]) -> Option<Scan> {
    let first = *rest.first()?;
    if !(first.is_alphabetic() || first == '_') {
        return None;
    }
    let len = 1 + rest[1..]
        .iter()
        .take_while(|c| c.is_alphanumeric() || **c == '_')
        .count();
    Some(Scan::Token(TokenKind::Identifier, len))
}

fn operator(rest: &[char]) -> Option<Scan> {
    OPERATORS.iter().find_map(|op| {
        let len = op.chars().count();
        (rest.len() >= len && rest[..len].iter().copied().eq(op.chars()))
            .then_some(Scan::Token(TokenKind::Operator, len))
    })
}

fn delimiter(rest: &[char]) -> Option<Scan> {
    DELIMITERS
        .contains(rest.first()?)
        .then_some(Scan::Token(TokenKind::Delimiter, 1))
}

fn whitespace(rest: &[char]) -> Option<Scan> {
    let len = rest.iter().take_while(|c| c.is_whitespace()).count();
    (len > 0).then_some(Scan::Skip(len))
}
