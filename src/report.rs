//! Plain-text rendering of analysis results.
//!
//! Produces the token table and the merged error list shown to users.
//! Every table ends with a trailing newline.

use std::fmt::Write as _;

use crate::analysis::Diagnostic;
use crate::token::Token;

const LEXEME_HEADER: &str = "LEXEME";
const KIND_HEADER: &str = "KIND";
const POSITION_HEADER: &str = "POSITION";

/// Shown in place of an empty error list.
pub const NO_ERRORS: &str = "No errors detected";

/// Render tokens as an aligned `LEXEME KIND POSITION` table.
#[must_use]
pub fn format_tokens(tokens: &[Token]) -> String {
    let lexeme_width = tokens
        .iter()
        .map(|t| t.lexeme.chars().count())
        .chain(std::iter::once(LEXEME_HEADER.len()))
        .max()
        .unwrap_or_default();
    let kind_width = tokens
        .iter()
        .map(|t| t.kind.label().len())
        .chain(std::iter::once(KIND_HEADER.len()))
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    format_row(
        &mut out,
        [LEXEME_HEADER, KIND_HEADER, POSITION_HEADER],
        lexeme_width,
        kind_width,
    );
    for token in tokens {
        let position = token.span.to_string();
        format_row(
            &mut out,
            [&token.lexeme, token.kind.label(), &position],
            lexeme_width,
            kind_width,
        );
    }
    out
}

fn format_row(out: &mut String, [lexeme, kind, position]: [&str; 3], lw: usize, kw: usize) {
    let _ = writeln!(out, "{lexeme:<lw$}  {kind:<kw$}  {position}");
}

/// Render diagnostics as a numbered list, or [`NO_ERRORS`].
#[must_use]
pub fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    if diagnostics.is_empty() {
        out.push_str(NO_ERRORS);
        out.push('\n');
        return out;
    }
    for (i, diagnostic) in diagnostics.iter().enumerate() {
        let _ = writeln!(out, "{}. {diagnostic}", i + 1);
    }
    out
}
