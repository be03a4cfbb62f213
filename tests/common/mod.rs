#![allow(dead_code)]

use polyscript_rs::{
    Analysis, DiagnosticKind, Program, Target, TokenKind, analyze, parse_str, translate,
};

/// Tokenize and parse, panicking with the error on failure.
pub fn program(input: &str) -> Program {
    parse_str(input).unwrap_or_else(|e| panic!("failed to parse: {e}\n--- input ---\n{input}"))
}

/// Analyze and return only the messages of one diagnostic kind.
pub fn messages(analysis: &Analysis, kind: DiagnosticKind) -> Vec<String> {
    analysis
        .diagnostics
        .iter()
        .filter(|d| d.kind == kind)
        .map(|d| d.message.clone())
        .collect()
}

/// Semantic messages of `input`, asserting it lexes and parses.
pub fn semantic_messages(input: &str) -> Vec<String> {
    let analysis = analyze(input);
    assert!(
        analysis
            .diagnostics
            .iter()
            .all(|d| d.kind == DiagnosticKind::Semantic),
        "unexpected non-semantic diagnostics: {:?}",
        analysis.diagnostics
    );
    messages(&analysis, DiagnosticKind::Semantic)
}

/// Token kinds of `input`, comments and whitespace excluded.
pub fn kinds(input: &str) -> Vec<TokenKind> {
    polyscript_rs::tokenize(input)
        .tokens
        .iter()
        .map(|t| t.kind)
        .collect()
}

/// Translate a lexically clean source.
pub fn to(target: Target, input: &str) -> String {
    translate(input, target)
        .unwrap_or_else(|e| panic!("source rejected: {e}\n--- input ---\n{input}"))
}
