//! Parser edge cases and error tests.

mod common;

use common::program;
use polyscript_rs::ast::{BinaryOp, DeclKeyword, UpdateOp};
use polyscript_rs::{
    DiagnosticKind, Error, ExprKind, ParseErrorKind, Span, StmtKind, analyze, parse, parse_str,
    tokenize,
};

fn parse_err(input: &str) -> polyscript_rs::ParseError {
    match parse_str(input) {
        Err(Error::Parse(e)) => e,
        other => panic!("expected parse error for {input:?}, got {other:?}"),
    }
}

// -----------------------------------------------------------
// Statements.
// -----------------------------------------------------------

#[test]
fn parse_empty_program() {
    assert!(program("").body.is_empty());
    assert!(program("// only a comment").body.is_empty());
}

#[test]
fn parse_optional_semicolons() {
    let with = program("let a = 1; a = 2;");
    let without = program("let a = 1\na = 2");
    assert_eq!(with.body.len(), 2);
    assert_eq!(without.body.len(), 2);
    assert!(matches!(with.body[1].kind, StmtKind::Expression(_)));
    assert!(matches!(without.body[1].kind, StmtKind::Expression(_)));
}

#[test]
fn parse_multiple_declarators() {
    let p = program("const a = 1, b, c = 'x';");
    let StmtKind::VariableDeclaration {
        keyword,
        declarations,
    } = &p.body[0].kind
    else {
        panic!("expected declaration");
    };
    assert_eq!(*keyword, DeclKeyword::Const);
    let names: Vec<_> = declarations.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, ["a", "b", "c"]);
    assert!(declarations[1].init.is_none());
    assert_eq!(declarations[2].span, Some(Span::new(1, 17)));
}

#[test]
fn parse_function_declaration() {
    let p = program("function add(a, b) {\n  return a + b;\n}");
    let StmtKind::FunctionDeclaration { name, params, body } = &p.body[0].kind else {
        panic!("expected function");
    };
    assert_eq!(name, "add");
    assert_eq!(params, &["a", "b"]);
    assert!(matches!(body[0].kind, StmtKind::Return(Some(_))));
}

#[test]
fn parse_bare_return() {
    let p = program("function f() { return }");
    let StmtKind::FunctionDeclaration { body, .. } = &p.body[0].kind else {
        panic!("expected function");
    };
    assert_eq!(body[0].kind, StmtKind::Return(None));
}

#[test]
fn parse_if_else_chain() {
    let p = program("if (a) { b = 1 } else if (c) b = 2; else { }");
    let StmtKind::If { alternate, .. } = &p.body[0].kind else {
        panic!("expected if");
    };
    let nested = alternate.as_deref().expect("else branch");
    assert!(matches!(
        nested.kind,
        StmtKind::If {
            alternate: Some(_),
            ..
        }
    ));
}

#[test]
fn parse_for_with_empty_clauses() {
    let p = program("for (;;) {}");
    assert!(matches!(
        p.body[0].kind,
        StmtKind::For {
            init: None,
            test: None,
            update: None,
            ..
        }
    ));
}

#[test]
fn parse_counted_for() {
    let p = program("for (let i = 0; i < 10; i++) total = total + i;");
    let StmtKind::For {
        init: Some(init),
        update: Some(update),
        ..
    } = &p.body[0].kind
    else {
        panic!("expected for");
    };
    assert!(matches!(init.kind, StmtKind::VariableDeclaration { .. }));
    assert!(matches!(
        update.kind,
        ExprKind::Update {
            op: UpdateOp::Increment,
            prefix: false,
            ..
        }
    ));
}

// -----------------------------------------------------------
// Expressions.
// -----------------------------------------------------------

#[test]
fn parse_precedence() {
    let p = program("x = 1 + 2 * 3 == 7");
    let StmtKind::Expression(expr) = &p.body[0].kind else {
        panic!("expected expression");
    };
    let ExprKind::Assignment { value, .. } = &expr.kind else {
        panic!("expected assignment");
    };
    let ExprKind::Binary { op, left, .. } = &value.kind else {
        panic!("expected comparison");
    };
    assert_eq!(*op, BinaryOp::Equal);
    assert!(matches!(
        left.kind,
        ExprKind::Binary {
            op: BinaryOp::Add,
            ..
        }
    ));
}

#[test]
fn parse_right_associative_assignment() {
    let p = program("a = b = 3");
    let StmtKind::Expression(expr) = &p.body[0].kind else {
        panic!("expected expression");
    };
    let ExprKind::Assignment { value, .. } = &expr.kind else {
        panic!("expected assignment");
    };
    assert!(matches!(value.kind, ExprKind::Assignment { .. }));
}

#[test]
fn parse_member_call_and_index() {
    let p = program("list[0].toString()");
    let StmtKind::Expression(expr) = &p.body[0].kind else {
        panic!("expected expression");
    };
    let ExprKind::Call { callee, arguments } = &expr.kind else {
        panic!("expected call");
    };
    assert!(arguments.is_empty());
    let ExprKind::Member { object, property } = &callee.kind else {
        panic!("expected member");
    };
    assert_eq!(property, "toString");
    assert!(matches!(object.kind, ExprKind::Index { .. }));
}

#[test]
fn parse_literals() {
    let p = program("v = [1.5, 'it\\'s', true, null, -x]");
    let StmtKind::Expression(expr) = &p.body[0].kind else {
        panic!("expected expression");
    };
    let ExprKind::Assignment { value, .. } = &expr.kind else {
        panic!("expected assignment");
    };
    let ExprKind::Array(items) = &value.kind else {
        panic!("expected array");
    };
    assert_eq!(items[0].kind, ExprKind::Number(1.5));
    assert_eq!(items[1].kind, ExprKind::String("it's".to_string()));
    assert_eq!(items[2].kind, ExprKind::Boolean(true));
    assert_eq!(items[3].kind, ExprKind::Null);
    assert!(matches!(items[4].kind, ExprKind::Unary { .. }));
}

#[test]
fn parse_ignores_kept_comment_tokens() {
    let lexed = polyscript_rs::tokenize_with(
        "a = 1 // set\nb = 2",
        polyscript_rs::LexOptions {
            keep_comments: true,
        },
    );
    let p = parse(&lexed.tokens).expect("parse");
    assert_eq!(p.body.len(), 2);
}

// -----------------------------------------------------------
// Errors.
// -----------------------------------------------------------

#[test]
fn error_unexpected_token() {
    let err = parse_err("let 5 = x");
    assert_eq!(
        err.kind,
        ParseErrorKind::UnexpectedToken {
            expected: "identifier".to_string(),
            found: "5".to_string(),
        }
    );
    assert_eq!(err.span, Some(Span::new(1, 5)));
    assert_eq!(
        err.to_string(),
        "expected identifier, got '5' at line 1, column 5"
    );
}

#[test]
fn error_unclosed_block_points_at_last_token() {
    let err = parse_err("while (x) {\n  x = 1");
    assert_eq!(
        err.kind,
        ParseErrorKind::UnexpectedEof {
            expected: "'}'".to_string()
        }
    );
    assert_eq!(err.span, Some(Span::new(2, 7)));
}

#[test]
fn error_invalid_assignment_target() {
    let err = parse_err("1 = x");
    assert_eq!(err.kind, ParseErrorKind::InvalidAssignmentTarget);
    assert_eq!(err.span, Some(Span::new(1, 3)));
}

#[test]
fn error_keyword_as_expression() {
    let err = parse_err("x = while");
    assert!(matches!(err.kind, ParseErrorKind::UnexpectedToken { .. }));
}

#[test]
fn parse_str_rejects_lexical_errors() {
    let err = parse_str("x = 1 @").unwrap_err();
    assert!(matches!(err, Error::Lex(ref e) if e.0.len() == 1));
    assert_eq!(
        err.to_string(),
        "1 lexical error(s), first: unknown symbol '@' at line 1, column 7"
    );
}

#[test]
fn parse_accepts_tokens_around_lexical_errors() {
    let lexed = tokenize("let a = 1 @");
    assert!(!lexed.is_clean());
    assert!(parse(&lexed.tokens).is_ok());
}

// -----------------------------------------------------------
// Nesting depth.
// -----------------------------------------------------------

#[test]
fn error_deeply_nested_parentheses() {
    let source = format!("x = {}1{};", "(".repeat(50_000), ")".repeat(50_000));
    let err = parse_err(&source);
    assert_eq!(
        err.kind,
        ParseErrorKind::NestingTooDeep {
            limit: polyscript_rs::parser::MAX_NESTING
        }
    );
    assert_eq!(err.span.map(|s| s.line), Some(1));
}

#[test]
fn error_deeply_nested_blocks_and_operators() {
    let blocks = format!("{}{}", "{".repeat(10_000), "}".repeat(10_000));
    assert!(matches!(
        parse_err(&blocks).kind,
        ParseErrorKind::NestingTooDeep { .. }
    ));
    let negations = format!("x = {}1", "- ".repeat(10_000));
    assert!(matches!(
        parse_err(&negations).kind,
        ParseErrorKind::NestingTooDeep { .. }
    ));
}

#[test]
fn deep_nesting_is_a_single_syntax_diagnostic() {
    let source = format!("let x = {}1{};", "(".repeat(50_000), ")".repeat(50_000));
    let analysis = analyze(&source);
    assert_eq!(analysis.diagnostics.len(), 1);
    assert_eq!(analysis.diagnostics[0].kind, DiagnosticKind::Syntactic);
    assert!(analysis.diagnostics[0].message.starts_with("nesting deeper than"));
}

#[test]
fn moderate_nesting_parses() {
    let open = "(".repeat(40);
    let close = ")".repeat(40);
    let source = format!("let x = {open}1{close};\n{}{}", "{".repeat(40), "}".repeat(40));
    assert_eq!(program(&source).body.len(), 2);
}
