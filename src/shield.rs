//! Protects string literals and line comments from textual rewrites.
//!
//! `protect` swaps every literal span for an opaque marker built from
//! Unicode private-use code points, which no dialect uses in identifiers
//! or operators, so rewrite rules cannot match inside or across them.
//! Comment markers open with a different code point than string markers,
//! so rules can tell a trailing comment apart from a trailing string.
//! Private-use characters already present in the input are protected
//! like literals. `restore` puts the original text back.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

const STRING_OPEN: char = '\u{E000}';
const MARKER_CLOSE: char = '\u{E001}';
const COMMENT_OPEN: char = '\u{E002}';
/// Private-use digits `U+E010..=U+E019`.
const MARKER_DIGIT_BASE: u32 = 0xE010;

/// Quoted strings that stay on one line. No escape handling.
const STRING_PATTERN: &str = r#""[^"\n]*"|'[^'\n]*'"#;

/// Runs of the code points markers are built from.
const RESERVED_RUN_PATTERN: &str = r"[\x{E000}-\x{E019}]+";

/// A protected comment, with the blanks before it. For rule patterns
/// that must keep a trailing comment after the text they append.
pub const TRAILING_COMMENT: &str = r"[ \t]*\x{E002}[\x{E010}-\x{E019}]+\x{E001}";

static MARKER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[\x{E000}\x{E002}][\x{E010}-\x{E019}]+\x{E001}")
        .expect("constant marker pattern")
});

static DEFAULT_SHIELD: Lazy<LiteralShield> = Lazy::new(|| LiteralShield::new(&["//"]));

/// Original text of each marker minted by one `protect` call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderMap {
    entries: Vec<(String, String)>,
}

impl PlaceholderMap {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Original text behind `marker`.
    #[must_use]
    pub fn get(&self, marker: &str) -> Option<&str> {
        self.position(marker).map(|i| self.entries[i].1.as_str())
    }

    /// Markers paired with their original text, in minting order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(m, o)| (m.as_str(), o.as_str()))
    }

    /// Swap the leading `from` of every protected comment for `to`.
    /// Used to carry line comments across syntaxes (`#` ↔ `//`).
    pub fn rewrite_prefix(&mut self, from: &str, to: &str) {
        for (marker, original) in &mut self.entries {
            if !marker.starts_with(COMMENT_OPEN) {
                continue;
            }
            if let Some(rest) = original.strip_prefix(from) {
                *original = format!("{to}{rest}");
            }
        }
    }

    fn position(&self, marker: &str) -> Option<usize> {
        let index = marker_index(marker)?;
        self.entries
            .get(index)
            .filter(|(m, _)| m == marker)
            .map(|_| index)
    }

    fn push(&mut self, open: char, original: &str) -> String {
        let marker = marker(open, self.entries.len());
        self.entries.push((marker.clone(), original.to_string()));
        marker
    }
}

/// String/comment recognizer for one source syntax.
#[derive(Debug, Clone)]
pub struct LiteralShield {
    pattern: Regex,
}

impl LiteralShield {
    /// Shield quoted strings and line comments opened by any of
    /// `comment_prefixes` (e.g. `//`, `#`).
    #[must_use]
    pub fn new(comment_prefixes: &[&str]) -> Self {
        let comments: Vec<String> = comment_prefixes
            .iter()
            .filter(|p| !p.is_empty())
            .map(|p| format!("{}[^\n]*", regex::escape(p)))
            .collect();
        let literals = format!("(?:{STRING_PATTERN}|{RESERVED_RUN_PATTERN})");
        let pattern = if comments.is_empty() {
            literals
        } else {
            format!("{literals}|(?P<comment>{})", comments.join("|"))
        };
        let pattern = Regex::new(&pattern)
            .expect("escaped literal alternatives always form a valid pattern");
        Self { pattern }
    }

    /// Replace every string and comment span with a fresh marker.
    #[must_use]
    pub fn protect(&self, text: &str) -> (String, PlaceholderMap) {
        let mut map = PlaceholderMap::default();
        let shielded = self
            .pattern
            .replace_all(text, |caps: &Captures<'_>| {
                let open = if caps.name("comment").is_some() {
                    COMMENT_OPEN
                } else {
                    STRING_OPEN
                };
                map.push(open, &caps[0])
            })
            .into_owned();
        (shielded, map)
    }
}

impl Default for LiteralShield {
    /// `//` line comments.
    fn default() -> Self {
        DEFAULT_SHIELD.clone()
    }
}

/// Shield with `//` comments; see [`LiteralShield::protect`].
#[must_use]
pub fn protect(text: &str) -> (String, PlaceholderMap) {
    DEFAULT_SHIELD.protect(text)
}

/// Substitute each marker back, once, in a single left-to-right pass.
///
/// A marker that a rewrite rule deleted or duplicated is logged and,
/// when duplicated, the extra copies stay in the output.
#[must_use]
pub fn restore(text: &str, map: &PlaceholderMap) -> String {
    let mut seen = vec![0_usize; map.len()];
    let out = MARKER_PATTERN
        .replace_all(text, |caps: &Captures<'_>| {
            let found = &caps[0];
            match map.position(found) {
                Some(i) => {
                    seen[i] += 1;
                    if seen[i] == 1 {
                        map.entries[i].1.clone()
                    } else {
                        found.to_string()
                    }
                }
                None => found.to_string(),
            }
        })
        .into_owned();

    for ((_, original), count) in map.iter().zip(seen) {
        match count {
            0 => tracing::warn!(original, "literal placeholder lost during rewrite"),
            1 => {}
            n => tracing::warn!(
                original,
                copies = n,
                "literal placeholder duplicated during rewrite"
            ),
        }
    }
    out
}

fn marker(open: char, index: usize) -> String {
    let mut out = String::from(open);
    out.extend(index.to_string().chars().map(|d| {
        let digit = d.to_digit(10).unwrap_or_default();
        char::from_u32(MARKER_DIGIT_BASE + digit).unwrap_or(MARKER_CLOSE)
    }));
    out.push(MARKER_CLOSE);
    out
}

fn marker_index(marker: &str) -> Option<usize> {
    let digits = marker.get(STRING_OPEN.len_utf8()..)?.strip_suffix(MARKER_CLOSE)?;
    if digits.is_empty() {
        return None;
    }
    digits.chars().try_fold(0_usize, |acc, c| {
        let digit = u32::from(c)
            .checked_sub(MARKER_DIGIT_BASE)
            .filter(|d| *d < 10)?;
        acc.checked_mul(10)?
            .checked_add(usize::try_from(digit).ok()?)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn protects_strings_and_comments() {
        let (shielded, map) = protect("let s = \"a b\"; // note\nlet t = 'x';");
        assert_eq!(map.len(), 3);
        assert!(!shielded.contains("a b"));
        assert!(!shielded.contains("note"));
        assert!(shielded.starts_with("let s = "));
        assert_eq!(map.iter().next().map(|(_, o)| o), Some("\"a b\""));
    }

    #[test]
    fn comment_marker_inside_string_is_a_string() {
        let (_, map) = protect("url = \"http://x\"");
        assert_eq!(map.len(), 1);
        assert_eq!(map.iter().next().map(|(_, o)| o), Some("\"http://x\""));
    }

    #[test]
    fn quote_inside_comment_is_a_comment() {
        let (shielded, map) = protect("x // it's fine\ny");
        assert_eq!(map.len(), 1);
        assert!(shielded.ends_with("\ny"));
    }

    #[test]
    fn unterminated_string_passes_through() {
        let (shielded, map) = protect("say \"oops\nnext");
        assert!(map.is_empty());
        assert_eq!(shielded, "say \"oops\nnext");
    }

    #[test]
    fn markers_are_distinct() {
        let a = marker(STRING_OPEN, 1);
        let b = marker(STRING_OPEN, 11);
        assert_ne!(a, b);
        assert!(!b.contains(&a));
        assert!(a.chars().all(|c| !c.is_alphanumeric() && !c.is_ascii()));
        assert_eq!(marker_index(&b), Some(11));
        assert_eq!(marker_index(&marker(COMMENT_OPEN, 204)), Some(204));
    }

    #[test]
    fn comments_and_strings_get_different_openers() {
        let (shielded, map) = protect("x = 'a' // note");
        let markers: Vec<_> = map.iter().map(|(m, _)| m.to_string()).collect();
        assert!(markers[0].starts_with(STRING_OPEN));
        assert!(markers[1].starts_with(COMMENT_OPEN));
        let trailing = Regex::new(&format!("{TRAILING_COMMENT}$")).expect("valid pattern");
        assert!(trailing.is_match(&shielded));
        assert!(!trailing.is_match(&protect("x = 'a'").0));
    }

    #[test]
    fn marker_characters_in_input_round_trip() {
        let text = "\u{E000}\u{E010}\u{E001} = 'a' // \u{E002}\nb = \u{E011}";
        let (shielded, map) = protect(text);
        assert_eq!(map.len(), 4);
        assert!(!shielded.contains('a'));
        assert_eq!(restore(&shielded, &map), text);
    }

    #[test]
    fn restored_text_is_not_scanned_again() {
        let text = "\u{E000}\u{E011}\u{E001}'b'";
        let (shielded, map) = protect(text);
        assert_eq!(restore(&shielded, &map), text);
    }

    #[test]
    fn restore_round_trip() {
        let text = "echo 'hi'; # hash comment\n// slash comment";
        let shield = LiteralShield::new(&["//", "#"]);
        let (shielded, map) = shield.protect(text);
        assert_eq!(map.len(), 3);
        assert_eq!(restore(&shielded, &map), text);
    }

    #[test]
    fn rewrite_prefix_touches_comments_only() {
        let shield = LiteralShield::new(&["#"]);
        let (shielded, mut map) = shield.protect("puts '#x' # note");
        map.rewrite_prefix("#", "//");
        assert_eq!(restore(&shielded, &map), "puts '#x' // note");

        let (shielded, mut map) = LiteralShield::default().protect("s = \"#a\"");
        map.rewrite_prefix("\"#", "\"//");
        assert_eq!(restore(&shielded, &map), "s = \"#a\"");
    }

    #[test]
    fn restore_with_lost_marker_keeps_text() {
        let (shielded, map) = protect("a = 'x'");
        let mutated = shielded.replace(map.iter().next().map(|(m, _)| m).unwrap_or(""), "");
        assert_eq!(restore(&mutated, &map), "a = ");
    }

    #[test]
    fn restore_with_duplicated_marker_leaves_residue() {
        let (shielded, map) = protect("'x'");
        let doubled = format!("{shielded}{shielded}");
        let restored = restore(&doubled, &map);
        assert!(restored.starts_with("'x'"));
        assert!(restored.contains(STRING_OPEN));
    }
}
