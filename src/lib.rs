//! Tokenizer, semantic checker, and literal-aware source translator
//! for a small curly-brace scripting language.
//!
//! Source text is tokenized with line/column positions, parsed into a
//! typed tree, checked for declaration and type drift, and rewritten
//! into PHP, C, Ruby, or Go text by ordered rule tables that never
//! touch string or comment contents.
//!
//! # Quick start
//!
//! ## Analyze a program
//!
//! ```
//! use polyscript_rs::{analyze, SymbolType};
//!
//! let analysis = analyze("let x = 5;\nlet y = 'hi';\nconsole.log(x);");
//! assert!(analysis.diagnostics.is_empty());
//! assert_eq!(analysis.symbols.get("x"), Some(SymbolType::Number));
//! ```
//!
//! ## Translate to another language
//!
//! ```
//! use polyscript_rs::{translate, Target};
//!
//! let php = translate("let name = 'Ada';\nconsole.log(name);", Target::Php).unwrap();
//! assert_eq!(php, "<?php\n\n$name = 'Ada';\necho $name;\n\n?>");
//! ```
//!
//! ## Build a custom rule table
//!
//! ```
//! use polyscript_rs::{Action, Dialect, RewriteRule};
//!
//! let shout = Dialect::new("shout")
//!     .rule(RewriteRule::new("log", r"console\.log", Action::Template("print".into())).unwrap());
//! assert_eq!(shout.translate("console.log('console.log')"), "print('console.log')");
//! ```

// Allow noisy pedantic lints that don't add value for
// a library crate.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::non_std_lazy_statics
)]

pub mod analysis;
pub mod ast;
pub mod builder;
pub mod dialects;
pub mod lexer;
pub mod parser;
pub mod report;
pub mod rewrite;
pub mod semantic;
pub mod shield;
pub mod token;

pub use analysis::{Analysis, Diagnostic, DiagnosticKind, analyze, analyze_with, translate};
pub use ast::{Expr, ExprKind, Program, Stmt, StmtKind};
pub use dialects::{Target, UnknownTarget};
pub use lexer::{LexError, LexErrorKind, LexErrors, LexOptions, Lexed, tokenize, tokenize_with};
pub use parser::{ParseError, ParseErrorKind, parse};
pub use report::{format_diagnostics, format_tokens};
pub use rewrite::{Action, Dialect, Phase, RewriteRule, RuleError};
pub use semantic::{
    MethodTable, SemanticChecker, SemanticError, SemanticErrorKind, SemanticReport, SymbolTable,
    SymbolType,
};
pub use shield::{LiteralShield, PlaceholderMap, protect, restore};
pub use token::{Span, Token, TokenKind};

/// Unified error type for the fallible entry points.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Source rejected by the tokenizer; translation is gated on it.
    #[error("{0}")]
    Lex(#[from] LexErrors),
    /// A custom rewrite rule with an invalid pattern.
    #[error("{0}")]
    Rule(#[from] RuleError),
    /// A syntax error from the parser.
    #[error("{0}")]
    Parse(#[from] ParseError),
}

/// Tokenize and parse a source string in one step.
///
/// Fails on the first lexical error rather than parsing around it.
pub fn parse_str(input: &str) -> Result<Program, Error> {
    let lexed = tokenize(input);
    if !lexed.is_clean() {
        return Err(LexErrors(lexed.errors).into());
    }
    Ok(parse(&lexed.tokens)?)
}
