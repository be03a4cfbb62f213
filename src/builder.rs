//! Fluent constructors for parsed trees.
//!
//! Handy for feeding the semantic checker trees produced by another
//! front end, or built directly in tests.

use crate::ast::{BinaryOp, DeclKeyword, Declarator, Expr, ExprKind, Program, Stmt, StmtKind};
use crate::token::Span;

impl Program {
    /// Create a new empty program.
    #[must_use]
    pub const fn new() -> Self {
        Self { body: Vec::new() }
    }

    /// Append a statement.
    #[must_use]
    pub fn stmt(mut self, stmt: Stmt) -> Self {
        self.body.push(stmt);
        self
    }
}

impl Stmt {
    /// `let name = init`.
    #[must_use]
    pub fn declare(name: &str, init: Expr) -> Self {
        Self::declaration(name, Some(init))
    }

    /// `let name` without initializer.
    #[must_use]
    pub fn declare_empty(name: &str) -> Self {
        Self::declaration(name, None)
    }

    fn declaration(name: &str, init: Option<Expr>) -> Self {
        Self::new(
            StmtKind::VariableDeclaration {
                keyword: DeclKeyword::Let,
                declarations: vec![Declarator {
                    name: name.to_string(),
                    init,
                    span: None,
                }],
            },
            None,
        )
    }

    /// Expression statement.
    #[must_use]
    pub const fn expr(expr: Expr) -> Self {
        Self::new(StmtKind::Expression(expr), None)
    }

    #[must_use]
    pub const fn block(body: Vec<Self>) -> Self {
        Self::new(StmtKind::Block(body), None)
    }

    #[must_use]
    pub fn while_loop(test: Expr, body: Self) -> Self {
        Self::new(
            StmtKind::While {
                test,
                body: Box::new(body),
            },
            None,
        )
    }

    #[must_use]
    pub fn if_else(test: Expr, consequent: Self, alternate: Option<Self>) -> Self {
        Self::new(
            StmtKind::If {
                test,
                consequent: Box::new(consequent),
                alternate: alternate.map(Box::new),
            },
            None,
        )
    }

    /// Attach a source location.
    #[must_use]
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.span = Some(Span::new(line, column));
        self
    }
}

impl Expr {
    #[must_use]
    pub fn ident(name: &str) -> Self {
        Self::new(ExprKind::Identifier(name.to_string()), None)
    }

    #[must_use]
    pub const fn number(value: f64) -> Self {
        Self::new(ExprKind::Number(value), None)
    }

    #[must_use]
    pub fn string(value: &str) -> Self {
        Self::new(ExprKind::String(value.to_string()), None)
    }

    #[must_use]
    pub const fn boolean(value: bool) -> Self {
        Self::new(ExprKind::Boolean(value), None)
    }

    #[must_use]
    pub const fn null() -> Self {
        Self::new(ExprKind::Null, None)
    }

    /// `name = value`.
    #[must_use]
    pub fn assign(name: &str, value: Self) -> Self {
        Self::new(
            ExprKind::Assignment {
                target: Box::new(Self::ident(name)),
                value: Box::new(value),
            },
            None,
        )
    }

    #[must_use]
    pub fn binary(op: BinaryOp, left: Self, right: Self) -> Self {
        Self::new(
            ExprKind::Binary {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            None,
        )
    }

    #[must_use]
    pub fn call(callee: Self, arguments: Vec<Self>) -> Self {
        Self::new(
            ExprKind::Call {
                callee: Box::new(callee),
                arguments,
            },
            None,
        )
    }

    #[must_use]
    pub fn member(object: Self, property: &str) -> Self {
        Self::new(
            ExprKind::Member {
                object: Box::new(object),
                property: property.to_string(),
            },
            None,
        )
    }

    /// `object.method(arguments)`.
    #[must_use]
    pub fn method_call(object: Self, method: &str, arguments: Vec<Self>) -> Self {
        Self::call(Self::member(object, method), arguments)
    }

    /// Attach a source location.
    #[must_use]
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.span = Some(Span::new(line, column));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_builder() {
        let program = Program::new()
            .stmt(Stmt::declare("x", Expr::number(1.0)).at(1, 1))
            .stmt(Stmt::expr(Expr::assign("x", Expr::number(2.0))));
        assert_eq!(program.body.len(), 2);
        assert_eq!(program.body[0].span, Some(Span::new(1, 1)));
        assert!(matches!(program.body[1].kind, StmtKind::Expression(_)));
    }

    #[test]
    fn method_call_shape() {
        let call = Expr::method_call(Expr::ident("x"), "toString", Vec::new());
        let ExprKind::Call { callee, arguments } = call.kind else {
            panic!("expected call");
        };
        assert!(arguments.is_empty());
        assert!(matches!(
            callee.kind,
            ExprKind::Member { ref property, .. } if property == "toString"
        ));
    }
}
