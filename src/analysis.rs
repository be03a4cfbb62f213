//! Combined analysis and gated translation.
//!
//! `analyze` runs tokenizer, parser, and semantic checker over one
//! source text and merges their errors into a single ordered list.
//! `translate` rewrites a lexically clean source into a target dialect.

use std::fmt;

use crate::dialects::Target;
use crate::lexer::{LexErrors, tokenize};
use crate::parser::parse;
use crate::semantic::{SemanticChecker, SymbolTable};
use crate::token::Token;

/// Which stage produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagnosticKind {
    Lexical,
    Syntactic,
    Semantic,
}

impl DiagnosticKind {
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Lexical => "Lexical",
            Self::Syntactic => "Syntactic",
            Self::Semantic => "Semantic",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One entry of the merged error list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, error: &impl ToString) -> Self {
        Self {
            kind,
            message: error.to_string(),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Result of [`analyze`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Analysis {
    /// Accepted tokens, comments excluded.
    pub tokens: Vec<Token>,
    /// Lexical, then syntactic, then semantic errors.
    pub diagnostics: Vec<Diagnostic>,
    /// Symbols recorded by the semantic pass; empty when parsing failed.
    pub symbols: SymbolTable,
}

impl Analysis {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Analyze `source` with the default method table.
#[must_use]
pub fn analyze(source: &str) -> Analysis {
    analyze_with(source, &SemanticChecker::default())
}

/// Analyze `source` with an explicit semantic checker.
///
/// Parsing runs on the accepted tokens even when lexing reported errors.
/// Semantic checking is skipped when parsing fails.
#[must_use]
pub fn analyze_with(source: &str, checker: &SemanticChecker) -> Analysis {
    let lexed = tokenize(source);
    tracing::debug!(
        tokens = lexed.tokens.len(),
        errors = lexed.errors.len(),
        "tokenized source"
    );

    let mut diagnostics: Vec<Diagnostic> = lexed
        .errors
        .iter()
        .map(|e| Diagnostic::new(DiagnosticKind::Lexical, e))
        .collect();

    let symbols = match parse(&lexed.tokens) {
        Ok(program) => {
            let report = checker.check(&program);
            tracing::debug!(
                statements = program.body.len(),
                errors = report.errors.len(),
                symbols = report.symbols.len(),
                "checked program"
            );
            diagnostics.extend(
                report
                    .errors
                    .iter()
                    .map(|e| Diagnostic::new(DiagnosticKind::Semantic, e)),
            );
            report.symbols
        }
        Err(err) => {
            tracing::debug!(error = %err, "parse failed, skipping semantic pass");
            diagnostics.push(Diagnostic::new(DiagnosticKind::Syntactic, &err));
            SymbolTable::default()
        }
    };

    Analysis {
        tokens: lexed.tokens,
        diagnostics,
        symbols,
    }
}

/// Rewrite `source` into `target`, chaining intermediate dialects.
///
/// The output is best-effort text; it is not guaranteed to compile.
///
/// # Errors
///
/// Returns `LexErrors` when `source` contains characters the tokenizer
/// rejects. Nothing is rewritten in that case.
pub fn translate(source: &str, target: Target) -> Result<String, LexErrors> {
    let lexed = tokenize(source);
    if !lexed.is_clean() {
        return Err(LexErrors(lexed.errors));
    }
    let output = target
        .stages()
        .into_iter()
        .fold(source.to_string(), |text, dialect| dialect.translate(&text));
    tracing::debug!(%target, bytes = output.len(), "translated source");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::semantic::{MethodTable, SymbolType};

    #[test]
    fn clean_program() {
        let analysis = analyze("let x = 5;\nlet y = 'hi';\nconsole.log(x);");
        assert!(analysis.is_clean(), "{:?}", analysis.diagnostics);
        assert_eq!(analysis.symbols.get("x"), Some(SymbolType::Number));
        assert_eq!(analysis.symbols.get("y"), Some(SymbolType::String));
    }

    #[test]
    fn diagnostics_are_ordered_by_stage() {
        let analysis = analyze("let x = 1 #\nlet x = 2");
        let kinds: Vec<_> = analysis.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, [DiagnosticKind::Lexical, DiagnosticKind::Semantic]);
    }

    #[test]
    fn parse_failure_skips_semantics() {
        let analysis = analyze("let = 1;\nz = 2;");
        assert_eq!(analysis.diagnostics.len(), 1);
        assert_eq!(analysis.diagnostics[0].kind, DiagnosticKind::Syntactic);
        assert!(analysis.symbols.is_empty());
    }

    #[test]
    fn custom_method_table() {
        let methods = MethodTable::empty().with(SymbolType::String, "len", SymbolType::Number);
        let checker = SemanticChecker::new(methods);
        let analysis = analyze_with("let s = 'a';\nlet n = s.len();\ns.toInt();", &checker);
        assert_eq!(analysis.symbols.get("n"), Some(SymbolType::Number));
        assert_eq!(analysis.diagnostics.len(), 1);
        assert_eq!(
            analysis.diagnostics[0].message,
            "invalid method 'toInt' on string at line 3, column 1"
        );
    }

    #[test]
    fn translation_requires_clean_lexing() {
        let err = translate("x # y", Target::Php).unwrap_err();
        assert_eq!(err.0.len(), 1);
        assert_eq!(err.0[0].span.column, 3);
    }

    #[test]
    fn translation_chains_dialects() {
        let c = translate("let n = 1;\nconsole.log(n);", Target::C).expect("clean source");
        assert_eq!(c, "#include <stdio.h>\n\nn = 1;\nprintf(\"%s\\n\", n);");
    }
}
