//! Ordered, literal-aware textual rewriting.
//!
//! A [`Dialect`] is a small ordered program of [`RewriteRule`]s. Each
//! translation runs, in order:
//!
//! 1. structural rules on the raw text,
//! 2. literal shielding (strings and line comments become markers),
//! 3. the remaining rules on the shielded text,
//! 4. literal restoration,
//! 5. trimming and wrapping in the dialect's preamble/postamble.
//!
//! Later rules see the output of earlier ones, so table order matters.
//! Rules are total: a pattern that does not occur leaves the text as is.
//! The result is best-effort text, not a guarantee of valid target code.

use std::collections::HashSet;

use regex::{Captures, Regex};

use crate::shield::{LiteralShield, restore};

/// When a rule runs relative to literal shielding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Before shielding, on raw text (literals visible).
    Structural,
    /// After shielding, literals replaced by markers.
    Shielded,
}

/// What a rule does with each match of its pattern.
#[derive(Debug, Clone)]
pub enum Action {
    /// Regex replacement template (`$1`, `${name}`).
    Template(String),
    /// Replacement computed from the captures.
    Map(fn(&Captures<'_>) -> String),
    /// Normalize a `function name(params)` signature: params trimmed,
    /// decorated with the dialect marker, joined by `", "`. Uses the
    /// `name` and `params` groups, and `keyword` when present.
    Signature,
    /// Prefix each matched bare identifier with the dialect marker.
    Decorate,
    /// Rewrite the whole text when the pattern occurs anywhere.
    Text(fn(&str) -> String),
}

/// Error building a rule from a pattern.
#[derive(Debug, thiserror::Error)]
#[error("invalid pattern for rule '{name}': {source}")]
pub struct RuleError {
    pub name: String,
    #[source]
    pub source: regex::Error,
}

/// One pattern → replacement step.
#[derive(Debug, Clone)]
pub struct RewriteRule {
    name: String,
    pattern: Regex,
    action: Action,
    phase: Phase,
}

impl RewriteRule {
    /// A rule running on shielded text.
    ///
    /// # Errors
    ///
    /// Returns `RuleError` when `pattern` is not a valid regex.
    pub fn new(name: &str, pattern: &str, action: Action) -> Result<Self, RuleError> {
        let pattern = Regex::new(pattern).map_err(|source| RuleError {
            name: name.to_string(),
            source,
        })?;
        Ok(Self {
            name: name.to_string(),
            pattern,
            action,
            phase: Phase::Shielded,
        })
    }

    /// Move this rule to the structural phase.
    #[must_use]
    pub fn structural(mut self) -> Self {
        self.phase = Phase::Structural;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    #[must_use]
    pub const fn action(&self) -> &Action {
        &self.action
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

/// Identifier decoration settings (e.g. PHP's `$`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoration {
    marker: char,
    reserved: HashSet<String>,
}

impl Decoration {
    #[must_use]
    pub fn new(marker: char) -> Self {
        Self {
            marker,
            reserved: HashSet::new(),
        }
    }

    #[must_use]
    pub const fn marker(&self) -> char {
        self.marker
    }

    #[must_use]
    pub fn is_reserved(&self, word: &str) -> bool {
        self.reserved.contains(word)
    }

    /// Whether `word`, preceded by the text `before`, gets the marker.
    ///
    /// Skips reserved words, words already carrying the marker, words
    /// right after the marker, purely numeric words, and the name in a
    /// `function name` definition.
    #[must_use]
    pub fn should_decorate(&self, word: &str, before: &str) -> bool {
        !(self.reserved.contains(word)
            || word.starts_with(self.marker)
            || word.chars().all(|c| c.is_ascii_digit())
            || before.ends_with(self.marker)
            || is_function_name_position(before))
    }
}

/// `before` ends with the `function` keyword plus whitespace.
fn is_function_name_position(before: &str) -> bool {
    let trimmed = before.trim_end();
    trimmed.len() < before.len()
        && trimmed.strip_suffix("function").is_some_and(|rest| {
            !rest
                .chars()
                .next_back()
                .is_some_and(|c| c.is_alphanumeric() || c == '_')
        })
}

/// Split a raw parameter list, trim each entry, drop empties, prefix
/// `marker` where missing, and re-join with `", "`.
#[must_use]
pub fn join_params(raw: &str, marker: Option<char>) -> String {
    raw.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| match marker {
            Some(m) if !p.starts_with(m) => format!("{m}{p}"),
            _ => p.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// A named, ordered rule table with its literal syntax and wrapping.
#[derive(Debug, Clone)]
pub struct Dialect {
    name: String,
    rules: Vec<RewriteRule>,
    shield: LiteralShield,
    decoration: Option<Decoration>,
    comment_style: Option<(String, String)>,
    preamble: String,
    postamble: String,
}

impl Dialect {
    /// Empty table shielding `//` comments, no decoration, no wrapping.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            rules: Vec::new(),
            shield: LiteralShield::default(),
            decoration: None,
            comment_style: None,
            preamble: String::new(),
            postamble: String::new(),
        }
    }

    /// Append a rule, keeping the phase it was built with.
    #[must_use]
    pub fn rule(mut self, rule: RewriteRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Append a rule in the structural phase.
    #[must_use]
    pub fn structural_rule(self, rule: RewriteRule) -> Self {
        self.rule(rule.structural())
    }

    /// Set the decoration marker, keeping any reserved words.
    #[must_use]
    pub fn marker(mut self, marker: char) -> Self {
        let reserved = self
            .decoration
            .take()
            .map(|d| d.reserved)
            .unwrap_or_default();
        self.decoration = Some(Decoration { marker, reserved });
        self
    }

    /// Words identifier decoration leaves alone.
    #[must_use]
    pub fn reserved<'w>(mut self, words: impl IntoIterator<Item = &'w str>) -> Self {
        let decoration = self.decoration.get_or_insert_with(|| Decoration::new('$'));
        decoration
            .reserved
            .extend(words.into_iter().map(str::to_string));
        self
    }

    /// Line-comment openers of the input syntax.
    #[must_use]
    pub fn comment_prefixes(mut self, prefixes: &[&str]) -> Self {
        self.shield = LiteralShield::new(prefixes);
        self
    }

    /// Rewrite the opener of protected comments from `from` to `to`.
    #[must_use]
    pub fn comment_style(mut self, from: &str, to: &str) -> Self {
        self.comment_style = Some((from.to_string(), to.to_string()));
        self
    }

    #[must_use]
    pub fn preamble(mut self, text: &str) -> Self {
        self.preamble = text.to_string();
        self
    }

    #[must_use]
    pub fn postamble(mut self, text: &str) -> Self {
        self.postamble = text.to_string();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    #[must_use]
    pub const fn decoration(&self) -> Option<&Decoration> {
        self.decoration.as_ref()
    }

    /// Rewrite `source` into this dialect. Never fails.
    #[must_use]
    pub fn translate(&self, source: &str) -> String {
        let mut text = source.to_string();
        for rule in self.phase_rules(Phase::Structural) {
            text = self.apply(rule, &text);
        }

        let (shielded, mut map) = self.shield.protect(&text);
        text = shielded;
        for rule in self.phase_rules(Phase::Shielded) {
            text = self.apply(rule, &text);
        }

        if let Some((from, to)) = &self.comment_style {
            map.rewrite_prefix(from, to);
        }
        let restored = restore(&text, &map);
        format!("{}{}{}", self.preamble, restored.trim(), self.postamble)
    }

    fn phase_rules(&self, phase: Phase) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter().filter(move |r| r.phase == phase)
    }

    fn apply(&self, rule: &RewriteRule, text: &str) -> String {
        let out = match &rule.action {
            Action::Template(template) => rule
                .pattern
                .replace_all(text, template.as_str())
                .into_owned(),
            Action::Map(f) => rule.pattern.replace_all(text, *f).into_owned(),
            Action::Signature => {
                let marker = self.decoration.as_ref().map(Decoration::marker);
                rule.pattern
                    .replace_all(text, |caps: &Captures<'_>| signature(caps, marker))
                    .into_owned()
            }
            Action::Decorate => self.decoration.as_ref().map_or_else(
                || text.to_string(),
                |decoration| decorate(&rule.pattern, text, decoration),
            ),
            Action::Text(f) => {
                if rule.pattern.is_match(text) {
                    f(text)
                } else {
                    text.to_string()
                }
            }
        };
        if out != text {
            tracing::debug!(dialect = %self.name, rule = %rule.name, "applied rewrite rule");
        }
        out
    }
}

/// Apply `dialect` to `source`; see [`Dialect::translate`].
#[must_use]
pub fn translate(source: &str, dialect: &Dialect) -> String {
    dialect.translate(source)
}

fn signature(caps: &Captures<'_>, marker: Option<char>) -> String {
    let keyword = caps.name("keyword").map_or("function", |m| m.as_str());
    let name = caps.name("name").map_or("", |m| m.as_str());
    let params = caps.name("params").map_or("", |m| m.as_str());
    format!("{keyword} {name}({})", join_params(params, marker))
}

fn decorate(pattern: &Regex, text: &str, decoration: &Decoration) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    let mut last = 0;
    for m in pattern.find_iter(text) {
        out.push_str(&text[last..m.start()]);
        if decoration.should_decorate(m.as_str(), &text[..m.start()]) {
            out.push(decoration.marker);
        }
        out.push_str(m.as_str());
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}
