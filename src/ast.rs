//! Parsed tree consumed by the semantic checker.
//!
//! Every node carries an optional source location; hand-built trees
//! (and nodes synthesized by other front ends) may leave it empty.

use crate::token::Span;

/// Root of a parsed source file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Program {
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StmtKind {
    /// `let a = 1, b;`
    VariableDeclaration {
        keyword: DeclKeyword,
        declarations: Vec<Declarator>,
    },
    Expression(Expr),
    Return(Option<Expr>),
    If {
        test: Expr,
        consequent: Box<Stmt>,
        alternate: Option<Box<Stmt>>,
    },
    While {
        test: Expr,
        body: Box<Stmt>,
    },
    For {
        init: Option<Box<Stmt>>,
        test: Option<Expr>,
        update: Option<Expr>,
        body: Box<Stmt>,
    },
    Block(Vec<Stmt>),
    FunctionDeclaration {
        name: String,
        params: Vec<String>,
        body: Vec<Stmt>,
    },
    /// Lone `;`.
    Empty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKeyword {
    Let,
    Var,
    Const,
}

/// One `name = init` entry of a declaration.
#[derive(Debug, Clone, PartialEq)]
pub struct Declarator {
    pub name: String,
    pub init: Option<Expr>,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Identifier(String),
    Number(f64),
    /// Unescaped string contents, quotes removed.
    String(String),
    Boolean(bool),
    Null,
    Array(Vec<Expr>),
    Assignment {
        target: Box<Expr>,
        value: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        argument: Box<Expr>,
    },
    /// `x++`, `--x`.
    Update {
        op: UpdateOp,
        prefix: bool,
        argument: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        arguments: Vec<Expr>,
    },
    Member {
        object: Box<Expr>,
        property: String,
    },
    /// `object[index]`.
    Index {
        object: Box<Expr>,
        index: Box<Expr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Equal,
    NotEqual,
    Less,
    LessEq,
    Greater,
    GreaterEq,
}

impl BinaryOp {
    #[must_use]
    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        Some(match lexeme {
            "+" => Self::Add,
            "-" => Self::Sub,
            "*" => Self::Mul,
            "/" => Self::Div,
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "<" => Self::Less,
            "<=" => Self::LessEq,
            ">" => Self::Greater,
            ">=" => Self::GreaterEq,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOp {
    Increment,
    Decrement,
}

impl Stmt {
    #[must_use]
    pub const fn new(kind: StmtKind, span: Option<Span>) -> Self {
        Self { kind, span }
    }
}

impl Expr {
    #[must_use]
    pub const fn new(kind: ExprKind, span: Option<Span>) -> Self {
        Self { kind, span }
    }

    /// Identifier name, if this expression is a bare identifier.
    #[must_use]
    pub fn as_identifier(&self) -> Option<&str> {
        match &self.kind {
            ExprKind::Identifier(name) => Some(name),
            _ => None,
        }
    }
}
