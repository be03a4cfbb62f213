use std::fmt;

use crate::ast::{
    BinaryOp, DeclKeyword, Declarator, Expr, ExprKind, Program, Stmt, StmtKind, UnaryOp, UpdateOp,
};
use crate::token::{Span, Token, TokenKind, location_suffix};

const KEYWORDS: &[&str] = &[
    "let", "var", "const", "function", "return", "if", "else", "while", "for", "true", "false",
    "null",
];

/// Deepest statement or expression nesting the parser accepts.
pub const MAX_NESTING: usize = 128;

/// Classifies a parser error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A token other than the expected one.
    UnexpectedToken { expected: String, found: String },
    /// Input ended where more was required.
    UnexpectedEof { expected: String },
    /// Left side of `=` is not an identifier or member access.
    InvalidAssignmentTarget,
    /// Blocks, parentheses or operators nested past `limit` levels.
    NestingTooDeep { limit: usize },
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnexpectedToken { expected, found } => {
                write!(f, "expected {expected}, got '{found}'")
            }
            Self::UnexpectedEof { expected } => {
                write!(f, "expected {expected}, got end of input")
            }
            Self::InvalidAssignmentTarget => write!(f, "invalid assignment target"),
            Self::NestingTooDeep { limit } => {
                write!(f, "nesting deeper than {limit} levels")
            }
        }
    }
}

/// Error produced during parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}{}", location_suffix(.span.as_ref()))]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Option<Span>,
}

type Result<T> = std::result::Result<T, ParseError>;

/// Parse a token stream into a `Program`.
///
/// Comment tokens are ignored. Stops at the first syntax error.
///
/// # Errors
///
/// Returns `ParseError` on unexpected tokens, premature end of input,
/// an invalid assignment target, or nesting deeper than [`MAX_NESTING`].
pub fn parse(tokens: &[Token]) -> Result<Program> {
    Parser::new(tokens).parse()
}

struct Parser<'a> {
    tokens: Vec<&'a Token>,
    pos: usize,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self {
            tokens: tokens
                .iter()
                .filter(|t| t.kind != TokenKind::Comment)
                .collect(),
            pos: 0,
            depth: 0,
        }
    }

    fn parse(mut self) -> Result<Program> {
        let mut body = Vec::new();
        while self.peek().is_some() {
            body.push(self.statement()?);
        }
        Ok(Program { body })
    }

    // -- Statements --

    fn statement(&mut self) -> Result<Stmt> {
        self.nested(Self::statement_inner)
    }

    fn statement_inner(&mut self) -> Result<Stmt> {
        let token = self.expect_any("statement")?;
        let span = Some(token.span);

        if token.is_punct(";") {
            self.pos += 1;
            return Ok(Stmt::new(StmtKind::Empty, span));
        }
        if token.is_punct("{") {
            let body = self.block()?;
            return Ok(Stmt::new(StmtKind::Block(body), span));
        }

        let stmt = match token.lexeme.as_str() {
            "let" | "var" | "const" if token.kind == TokenKind::Identifier => {
                let stmt = self.declaration()?;
                self.eat(";");
                stmt
            }
            "function" if token.kind == TokenKind::Identifier => self.function()?,
            "return" if token.kind == TokenKind::Identifier => {
                self.pos += 1;
                let argument = if self.at_statement_end() {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.eat(";");
                Stmt::new(StmtKind::Return(argument), span)
            }
            "if" if token.kind == TokenKind::Identifier => self.if_statement()?,
            "while" if token.kind == TokenKind::Identifier => {
                self.pos += 1;
                let test = self.condition()?;
                let body = Box::new(self.statement()?);
                Stmt::new(StmtKind::While { test, body }, span)
            }
            "for" if token.kind == TokenKind::Identifier => self.for_statement()?,
            _ => {
                let expr = self.expression()?;
                self.eat(";");
                Stmt::new(StmtKind::Expression(expr), span)
            }
        };
        Ok(stmt)
    }

    fn block(&mut self) -> Result<Vec<Stmt>> {
        self.expect_punct("{")?;
        let mut body = Vec::new();
        loop {
            match self.peek() {
                Some(t) if t.is_punct("}") => {
                    self.pos += 1;
                    return Ok(body);
                }
                Some(_) => body.push(self.statement()?),
                None => {
                    return Err(self.eof_error("'}'"));
                }
            }
        }
    }

    fn declaration(&mut self) -> Result<Stmt> {
        let token = self.advance("declaration")?;
        let keyword = match token.lexeme.as_str() {
            "var" => DeclKeyword::Var,
            "const" => DeclKeyword::Const,
            _ => DeclKeyword::Let,
        };
        let mut declarations = Vec::new();
        loop {
            let (name, name_span) = self.identifier()?;
            let init = if self.eat("=") {
                Some(self.assignment()?)
            } else {
                None
            };
            declarations.push(Declarator {
                name,
                init,
                span: Some(name_span),
            });
            if !self.eat(",") {
                break;
            }
        }
        Ok(Stmt::new(
            StmtKind::VariableDeclaration {
                keyword,
                declarations,
            },
            Some(token.span),
        ))
    }

    fn function(&mut self) -> Result<Stmt> {
        let keyword = self.advance("function")?;
        let (name, _) = self.identifier()?;
        self.expect_punct("(")?;
        let mut params = Vec::new();
        if !self.eat(")") {
            loop {
                params.push(self.identifier()?.0);
                if self.eat(")") {
                    break;
                }
                self.expect_punct(",")?;
            }
        }
        let body = self.block()?;
        Ok(Stmt::new(
            StmtKind::FunctionDeclaration { name, params, body },
            Some(keyword.span),
        ))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        let keyword = self.advance("if")?;
        let test = self.condition()?;
        let consequent = Box::new(self.statement()?);
        let alternate = if self.peek().is_some_and(|t| t.is_word("else")) {
            self.pos += 1;
            Some(Box::new(self.statement()?))
        } else {
            None
        };
        Ok(Stmt::new(
            StmtKind::If {
                test,
                consequent,
                alternate,
            },
            Some(keyword.span),
        ))
    }

    fn for_statement(&mut self) -> Result<Stmt> {
        let keyword = self.advance("for")?;
        self.expect_punct("(")?;

        let init = match self.peek() {
            Some(t) if t.is_punct(";") => None,
            Some(t) if matches!(t.lexeme.as_str(), "let" | "var" | "const") => {
                Some(Box::new(self.declaration()?))
            }
            _ => {
                let expr = self.expression()?;
                let span = expr.span;
                Some(Box::new(Stmt::new(StmtKind::Expression(expr), span)))
            }
        };
        self.expect_punct(";")?;

        let test = if self.peek().is_some_and(|t| t.is_punct(";")) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(";")?;

        let update = if self.peek().is_some_and(|t| t.is_punct(")")) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect_punct(")")?;

        let body = Box::new(self.statement()?);
        Ok(Stmt::new(
            StmtKind::For {
                init,
                test,
                update,
                body,
            },
            Some(keyword.span),
        ))
    }

    /// `( expr )` after `if` / `while`.
    fn condition(&mut self) -> Result<Expr> {
        self.expect_punct("(")?;
        let expr = self.expression()?;
        self.expect_punct(")")?;
        Ok(expr)
    }

    // -- Expressions --

    fn expression(&mut self) -> Result<Expr> {
        self.assignment()
    }

    fn assignment(&mut self) -> Result<Expr> {
        self.nested(Self::assignment_inner)
    }

    fn assignment_inner(&mut self) -> Result<Expr> {
        let target = self.equality()?;
        let Some(eq) = self.peek().filter(|t| t.is_punct("=")) else {
            return Ok(target);
        };
        if !matches!(
            target.kind,
            ExprKind::Identifier(_) | ExprKind::Member { .. } | ExprKind::Index { .. }
        ) {
            return Err(ParseError {
                kind: ParseErrorKind::InvalidAssignmentTarget,
                span: Some(eq.span),
            });
        }
        self.pos += 1;
        let value = self.assignment()?;
        let span = target.span;
        Ok(Expr::new(
            ExprKind::Assignment {
                target: Box::new(target),
                value: Box::new(value),
            },
            span,
        ))
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary(&["==", "!="], Self::comparison)
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary(&["<", ">", "<=", ">="], Self::additive)
    }

    fn additive(&mut self) -> Result<Expr> {
        self.binary(&["+", "-"], Self::multiplicative)
    }

    fn multiplicative(&mut self) -> Result<Expr> {
        self.binary(&["*", "/"], Self::unary)
    }

    fn binary(&mut self, ops: &[&str], next: fn(&mut Self) -> Result<Expr>) -> Result<Expr> {
        let mut left = next(self)?;
        while let Some(op) = self
            .peek()
            .filter(|t| t.kind == TokenKind::Operator && ops.contains(&t.lexeme.as_str()))
            .and_then(|t| BinaryOp::from_lexeme(&t.lexeme))
        {
            self.pos += 1;
            let right = next(self)?;
            let span = left.span;
            left = Expr::new(
                ExprKind::Binary {
                    op,
                    left: Box::new(left),
                    right: Box::new(right),
                },
                span,
            );
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Expr> {
        let token = self.expect_any("expression")?;
        let span = Some(token.span);
        if token.is_punct("-") {
            self.pos += 1;
            let argument = Box::new(self.nested(Self::unary)?);
            return Ok(Expr::new(
                ExprKind::Unary {
                    op: UnaryOp::Neg,
                    argument,
                },
                span,
            ));
        }
        if let Some(op) = update_op(token) {
            self.pos += 1;
            let argument = Box::new(self.nested(Self::unary)?);
            return Ok(Expr::new(
                ExprKind::Update {
                    op,
                    prefix: true,
                    argument,
                },
                span,
            ));
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expr> {
        let expr = self.call_member()?;
        match self.peek().and_then(update_op) {
            Some(op) => {
                self.pos += 1;
                let span = expr.span;
                Ok(Expr::new(
                    ExprKind::Update {
                        op,
                        prefix: false,
                        argument: Box::new(expr),
                    },
                    span,
                ))
            }
            None => Ok(expr),
        }
    }

    fn call_member(&mut self) -> Result<Expr> {
        let mut expr = self.primary()?;
        loop {
            let span = expr.span;
            if self.eat(".") {
                let (property, _) = self.identifier()?;
                expr = Expr::new(
                    ExprKind::Member {
                        object: Box::new(expr),
                        property,
                    },
                    span,
                );
            } else if self.eat("(") {
                let arguments = self.list(")")?;
                expr = Expr::new(
                    ExprKind::Call {
                        callee: Box::new(expr),
                        arguments,
                    },
                    span,
                );
            } else if self.eat("[") {
                let index = self.expression()?;
                self.expect_punct("]")?;
                expr = Expr::new(
                    ExprKind::Index {
                        object: Box::new(expr),
                        index: Box::new(index),
                    },
                    span,
                );
            } else {
                return Ok(expr);
            }
        }
    }

    fn primary(&mut self) -> Result<Expr> {
        let token = self.advance("expression")?;
        let span = Some(token.span);
        let kind = match token.kind {
            TokenKind::Number => ExprKind::Number(token.lexeme.parse().unwrap_or_default()),
            TokenKind::String => ExprKind::String(unquote(&token.lexeme)),
            TokenKind::Identifier => match token.lexeme.as_str() {
                "true" => ExprKind::Boolean(true),
                "false" => ExprKind::Boolean(false),
                "null" => ExprKind::Null,
                word if KEYWORDS.contains(&word) => {
                    return Err(unexpected("expression", token));
                }
                word => ExprKind::Identifier(word.to_string()),
            },
            _ if token.is_punct("(") => {
                let inner = self.expression()?;
                self.expect_punct(")")?;
                return Ok(inner);
            }
            _ if token.is_punct("[") => ExprKind::Array(self.list("]")?),
            _ => return Err(unexpected("expression", token)),
        };
        Ok(Expr::new(kind, span))
    }

    /// Comma-separated expressions up to `close` (consumed).
    fn list(&mut self, close: &str) -> Result<Vec<Expr>> {
        let mut items = Vec::new();
        if self.eat(close) {
            return Ok(items);
        }
        loop {
            items.push(self.assignment()?);
            if self.eat(close) {
                return Ok(items);
            }
            self.expect_punct(",")?;
        }
    }

    /// Run `parse` one nesting level deeper.
    fn nested<T>(&mut self, parse: fn(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(ParseError {
                kind: ParseErrorKind::NestingTooDeep { limit: MAX_NESTING },
                span: self
                    .peek()
                    .or_else(|| self.tokens.last().copied())
                    .map(|t| t.span),
            });
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    // -- Token helpers --

    fn peek(&self) -> Option<&'a Token> {
        self.tokens.get(self.pos).copied()
    }

    fn expect_any(&self, expected: &str) -> Result<&'a Token> {
        self.peek().ok_or_else(|| self.eof_error(expected))
    }

    fn advance(&mut self, expected: &str) -> Result<&'a Token> {
        let token = self.expect_any(expected)?;
        self.pos += 1;
        Ok(token)
    }

    fn eat(&mut self, punct: &str) -> bool {
        if self.peek().is_some_and(|t| t.is_punct(punct)) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_punct(&mut self, punct: &str) -> Result<()> {
        let expected = format!("'{punct}'");
        let token = self.expect_any(&expected)?;
        if !token.is_punct(punct) {
            return Err(unexpected(&expected, token));
        }
        self.pos += 1;
        Ok(())
    }

    fn identifier(&mut self) -> Result<(String, Span)> {
        let token = self.advance("identifier")?;
        if token.kind != TokenKind::Identifier || KEYWORDS.contains(&token.lexeme.as_str()) {
            return Err(unexpected("identifier", token));
        }
        Ok((token.lexeme.clone(), token.span))
    }

    fn at_statement_end(&self) -> bool {
        self.peek().is_none_or(|t| t.is_punct(";") || t.is_punct("}"))
    }

    fn eof_error(&self, expected: &str) -> ParseError {
        ParseError {
            kind: ParseErrorKind::UnexpectedEof {
                expected: expected.to_string(),
            },
            span: self.tokens.last().map(|t| t.span),
        }
    }
}

fn unexpected(expected: &str, token: &Token) -> ParseError {
    ParseError {
        kind: ParseErrorKind::UnexpectedToken {
            expected: expected.to_string(),
            found: token.lexeme.clone(),
        },
        span: Some(token.span),
    }
}

fn update_op(token: &Token) -> Option<UpdateOp> {
    if token.is_punct("++") {
        Some(UpdateOp::Increment)
    } else if token.is_punct("--") {
        Some(UpdateOp::Decrement)
    } else {
        None
    }
}

/// Strip the quotes from a string lexeme and resolve escapes.
fn unquote(lexeme: &str) -> String {
    let inner = lexeme
        .get(1..lexeme.len().saturating_sub(1))
        .unwrap_or_default();
    let mut value = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            value.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => value.push('\n'),
            Some('t') => value.push('\t'),
            Some('r') => value.push('\r'),
            Some(other) => value.push(other),
            None => value.push('\\'),
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_input(input: &str) -> Result<Program> {
        let lexed = tokenize(input);
        assert!(lexed.is_clean(), "lex errors: {:?}", lexed.errors);
        parse(&lexed.tokens)
    }

    #[test]
    fn declarations() {
        let program = parse_input("let x = 5;\nconst a = 1, b;").expect("parse failed");
        assert_eq!(program.body.len(), 2);
        let StmtKind::VariableDeclaration {
            keyword,
            declarations,
        } = &program.body[1].kind
        else {
            panic!("expected declaration");
        };
        assert_eq!(*keyword, DeclKeyword::Const);
        assert_eq!(declarations.len(), 2);
        assert_eq!(declarations[1].name, "b");
        assert!(declarations[1].init.is_none());
    }

    #[test]
    fn semicolons_are_optional() {
        let program = parse_input("let x = 1\nx = 2").expect("parse failed");
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn precedence() {
        let program = parse_input("1 + 2 * 3").expect("parse failed");
        let StmtKind::Expression(expr) = &program.body[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Binary { op, right, .. } = &expr.kind else {
            panic!("expected binary");
        };
        assert_eq!(*op, BinaryOp::Add);
        assert!(matches!(
            right.kind,
            ExprKind::Binary {
                op: BinaryOp::Mul,
                ..
            }
        ));
    }

    #[test]
    fn method_call_chain() {
        let program = parse_input("console.log(x.toString());").expect("parse failed");
        let StmtKind::Expression(expr) = &program.body[0].kind else {
            panic!("expected expression statement");
        };
        let ExprKind::Call { callee, arguments } = &expr.kind else {
            panic!("expected call");
        };
        assert!(matches!(&callee.kind, ExprKind::Member { property, .. } if property == "log"));
        assert_eq!(arguments.len(), 1);
    }

    #[test]
    fn for_loop() {
        let program =
            parse_input("for (let i = 0; i < 10; i++) { console.log(i); }").expect("parse failed");
        let StmtKind::For {
            init, test, update, ..
        } = &program.body[0].kind
        else {
            panic!("expected for");
        };
        assert!(init.is_some());
        assert!(test.is_some());
        assert!(matches!(
            update.as_ref().map(|u| &u.kind),
            Some(ExprKind::Update { prefix: false, .. })
        ));
    }

    #[test]
    fn if_else_and_function() {
        let program = parse_input(
            "function max(a, b) {\n  if (a > b) { return a; } else return b;\n}\n",
        )
        .expect("parse failed");
        let StmtKind::FunctionDeclaration { name, params, body } = &program.body[0].kind else {
            panic!("expected function");
        };
        assert_eq!(name, "max");
        assert_eq!(params, &["a", "b"]);
        assert!(matches!(
            body[0].kind,
            StmtKind::If {
                alternate: Some(_),
                ..
            }
        ));
    }

    #[test]
    fn string_unescaping() {
        let program = parse_input(r#"let s = 'it\'s' + "a\tb";"#).expect("parse failed");
        let StmtKind::VariableDeclaration { declarations, .. } = &program.body[0].kind else {
            panic!("expected declaration");
        };
        let Some(Expr {
            kind: ExprKind::Binary { left, right, .. },
            ..
        }) = &declarations[0].init
        else {
            panic!("expected binary init");
        };
        assert_eq!(left.kind, ExprKind::String("it's".to_string()));
        assert_eq!(right.kind, ExprKind::String("a\tb".to_string()));
    }

    #[test]
    fn invalid_assignment_target() {
        let err = parse_input("1 = x").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidAssignmentTarget);
        assert_eq!(err.span, Some(Span::new(1, 3)));
    }

    #[test]
    fn unclosed_block() {
        let err = parse_input("while (x) {\n  x = 1;\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::UnexpectedEof { .. }));
        assert_eq!(err.to_string(), "expected '}', got end of input at line 2, column 8");
    }

    #[test]
    fn keyword_is_not_an_expression() {
        let err = parse_input("let = 3").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::UnexpectedToken {
                expected: "identifier".to_string(),
                found: "=".to_string(),
            }
        );
    }

    #[test]
    fn nesting_limit() {
        let ok = format!("x = {}1{}", "(".repeat(60), ")".repeat(60));
        assert!(parse_input(&ok).is_ok());

        let deep = format!("x = {}1{}", "(".repeat(500), ")".repeat(500));
        let err = parse_input(&deep).unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::NestingTooDeep { limit: MAX_NESTING }
        );
        assert!(err.span.is_some());
    }

    #[test]
    fn empty_input() {
        let program = parse(&[]).expect("parse failed");
        assert!(program.body.is_empty());
    }
}
