//! Lightweight semantic checking over a parsed program.
//!
//! One flat symbol table covers the whole program: blocks and function
//! bodies do not open new scopes, so a name declared anywhere counts as
//! declared for every later statement.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::ast::{Expr, ExprKind, Program, Stmt, StmtKind};
use crate::token::{Span, location_suffix};

/// Coarse inferred type of an expression or symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolType {
    Number,
    String,
    Boolean,
    Null,
    Unknown,
}

impl SymbolType {
    /// Anything but `Unknown`.
    #[must_use]
    pub const fn is_known(self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for SymbolType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Number => "number",
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Null => "null",
            Self::Unknown => "unknown",
        })
    }
}

/// Declared names and their inferred types, ordered by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    symbols: BTreeMap<String, SymbolType>,
}

impl SymbolTable {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<SymbolType> {
        self.symbols.get(name).copied()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, SymbolType)> {
        self.symbols.iter().map(|(name, ty)| (name.as_str(), *ty))
    }

    fn insert(&mut self, name: &str, ty: SymbolType) {
        self.symbols.insert(name.to_string(), ty);
    }
}

/// Methods callable on a receiver of a given type, with their result type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodTable {
    methods: HashMap<(SymbolType, String), SymbolType>,
}

impl MethodTable {
    /// A table with no valid methods.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            methods: HashMap::new(),
        }
    }

    /// Allow `receiver.method()`, producing `result`.
    #[must_use]
    pub fn with(mut self, receiver: SymbolType, method: &str, result: SymbolType) -> Self {
        self.methods.insert((receiver, method.to_string()), result);
        self
    }

    /// Result type of `receiver.method()`, or `None` if the pair is invalid.
    #[must_use]
    pub fn result(&self, receiver: SymbolType, method: &str) -> Option<SymbolType> {
        self.methods.get(&(receiver, method.to_string())).copied()
    }
}

impl Default for MethodTable {
    /// `number.toString()` and `string.toInt()`.
    fn default() -> Self {
        Self::empty()
            .with(SymbolType::Number, "toString", SymbolType::String)
            .with(SymbolType::String, "toInt", SymbolType::Number)
    }
}

/// Classifies a semantic error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SemanticErrorKind {
    AlreadyDeclared {
        name: String,
    },
    NotDeclared {
        name: String,
    },
    TypeMismatch {
        name: String,
        expected: SymbolType,
        found: SymbolType,
    },
    InvalidMethod {
        receiver: SymbolType,
        method: String,
    },
}

impl fmt::Display for SemanticErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyDeclared { name } => {
                write!(f, "variable '{name}' already declared")
            }
            Self::NotDeclared { name } => write!(f, "variable '{name}' not declared"),
            Self::TypeMismatch {
                name,
                expected,
                found,
            } => write!(
                f,
                "type mismatch: '{name}' is {expected}, cannot assign {found}"
            ),
            Self::InvalidMethod { receiver, method } => {
                write!(f, "invalid method '{method}' on {receiver}")
            }
        }
    }
}

/// Error found by the semantic checker.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind}{}", location_suffix(.span.as_ref()))]
pub struct SemanticError {
    pub kind: SemanticErrorKind,
    pub span: Option<Span>,
}

/// Errors plus the symbol table left at the end of the pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SemanticReport {
    pub errors: Vec<SemanticError>,
    pub symbols: SymbolTable,
}

/// Walks a program once, in source order, inferring coarse types.
#[derive(Debug, Clone, Default)]
pub struct SemanticChecker {
    methods: MethodTable,
}

impl SemanticChecker {
    #[must_use]
    pub const fn new(methods: MethodTable) -> Self {
        Self { methods }
    }

    #[must_use]
    pub fn check(&self, program: &Program) -> SemanticReport {
        let mut pass = Pass {
            methods: &self.methods,
            report: SemanticReport::default(),
        };
        for stmt in &program.body {
            pass.stmt(stmt);
        }
        pass.report
    }
}

/// Check a program with the default method table.
#[must_use]
pub fn check(program: &Program) -> SemanticReport {
    SemanticChecker::default().check(program)
}

struct Pass<'a> {
    methods: &'a MethodTable,
    report: SemanticReport,
}

impl Pass<'_> {
    fn error(&mut self, kind: SemanticErrorKind, span: Option<Span>) {
        self.report.errors.push(SemanticError { kind, span });
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match &stmt.kind {
            StmtKind::VariableDeclaration { declarations, .. } => {
                for decl in declarations {
                    let redeclared = self.report.symbols.contains(&decl.name);
                    if redeclared {
                        self.error(
                            SemanticErrorKind::AlreadyDeclared {
                                name: decl.name.clone(),
                            },
                            decl.span.or(stmt.span),
                        );
                    }
                    if let Some(init) = &decl.init {
                        self.expr(init);
                    }
                    if !redeclared {
                        let ty = decl
                            .init
                            .as_ref()
                            .map_or(SymbolType::Unknown, |init| self.infer(init));
                        self.report.symbols.insert(&decl.name, ty);
                    }
                }
            }
            StmtKind::Expression(expr) | StmtKind::Return(Some(expr)) => self.expr(expr),
            StmtKind::If {
                test,
                consequent,
                alternate,
            } => {
                self.expr(test);
                self.stmt(consequent);
                if let Some(alternate) = alternate {
                    self.stmt(alternate);
                }
            }
            StmtKind::While { test, body } => {
                self.expr(test);
                self.stmt(body);
            }
            StmtKind::For {
                init,
                test,
                update,
                body,
            } => {
                if let Some(init) = init {
                    self.stmt(init);
                }
                if let Some(test) = test {
                    self.expr(test);
                }
                if let Some(update) = update {
                    self.expr(update);
                }
                self.stmt(body);
            }
            StmtKind::Block(body) => {
                for stmt in body {
                    self.stmt(stmt);
                }
            }
            StmtKind::FunctionDeclaration { params, body, .. } => {
                for param in params {
                    if !self.report.symbols.contains(param) {
                        self.report.symbols.insert(param, SymbolType::Unknown);
                    }
                }
                for stmt in body {
                    self.stmt(stmt);
                }
            }
            StmtKind::Return(None) | StmtKind::Empty => {}
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Assignment { target, value } => {
                self.assignment(target, value, expr.span);
            }
            ExprKind::Binary { left, right, .. } => {
                self.expr(left);
                self.expr(right);
            }
            ExprKind::Call { callee, arguments } => {
                if let ExprKind::Member { object, property } = &callee.kind {
                    self.expr(object);
                    let receiver = self.infer(object);
                    if receiver.is_known() && self.methods.result(receiver, property).is_none() {
                        self.error(
                            SemanticErrorKind::InvalidMethod {
                                receiver,
                                method: property.clone(),
                            },
                            callee.span.or(expr.span),
                        );
                    }
                } else {
                    self.expr(callee);
                }
                for arg in arguments {
                    self.expr(arg);
                }
            }
            ExprKind::Member { object, .. } => self.expr(object),
            ExprKind::Index { object, index } => {
                self.expr(object);
                self.expr(index);
            }
            ExprKind::Unary { argument, .. } => self.expr(argument),
            ExprKind::Update { argument, .. } => match argument.as_identifier() {
                Some(name) if !self.report.symbols.contains(name) => self.error(
                    SemanticErrorKind::NotDeclared {
                        name: name.to_string(),
                    },
                    argument.span.or(expr.span),
                ),
                _ => self.expr(argument),
            },
            ExprKind::Array(items) => {
                for item in items {
                    self.expr(item);
                }
            }
            ExprKind::Identifier(_)
            | ExprKind::Number(_)
            | ExprKind::String(_)
            | ExprKind::Boolean(_)
            | ExprKind::Null => {}
        }
    }

    fn assignment(&mut self, target: &Expr, value: &Expr, span: Option<Span>) {
        let Some(name) = target.as_identifier() else {
            self.expr(target);
            self.expr(value);
            return;
        };
        let Some(expected) = self.report.symbols.get(name) else {
            self.error(
                SemanticErrorKind::NotDeclared {
                    name: name.to_string(),
                },
                target.span.or(span),
            );
            self.expr(value);
            return;
        };

        self.expr(value);
        let found = self.infer(value);
        if !found.is_known() {
            return;
        }
        if !expected.is_known() {
            self.report.symbols.insert(name, found);
        } else if expected != found {
            self.error(
                SemanticErrorKind::TypeMismatch {
                    name: name.to_string(),
                    expected,
                    found,
                },
                target.span.or(span),
            );
        }
    }

    fn infer(&self, expr: &Expr) -> SymbolType {
        infer_type(&self.report.symbols, self.methods, expr)
    }
}

/// Coarse type of `expr` given the symbols declared so far.
///
/// Pure: unrecognized shapes are `Unknown`, never an error.
#[must_use]
pub fn infer_type(symbols: &SymbolTable, methods: &MethodTable, expr: &Expr) -> SymbolType {
    match &expr.kind {
        ExprKind::Number(_) => SymbolType::Number,
        ExprKind::String(_) => SymbolType::String,
        ExprKind::Boolean(_) => SymbolType::Boolean,
        ExprKind::Null => SymbolType::Null,
        ExprKind::Identifier(name) => symbols.get(name).unwrap_or(SymbolType::Unknown),
        ExprKind::Call { callee, .. } => match &callee.kind {
            ExprKind::Member { object, property } => {
                let receiver = infer_type(symbols, methods, object);
                methods
                    .result(receiver, property)
                    .unwrap_or(SymbolType::Unknown)
            }
            _ => SymbolType::Unknown,
        },
        ExprKind::Binary { left, right, .. } => {
            let left = infer_type(symbols, methods, left);
            let right = infer_type(symbols, methods, right);
            if left == right {
                left
            } else {
                SymbolType::Unknown
            }
        }
        ExprKind::Assignment { value, .. } => infer_type(symbols, methods, value),
        _ => SymbolType::Unknown,
    }
}
