//! Built-in rule tables and translation targets.
//!
//! Two chains are provided: the source language to PHP (and on to C),
//! and the source language to Ruby (and on to Go). Each table is built
//! once on first use.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

use crate::rewrite::{Action, Dialect, RewriteRule, join_params};
use crate::shield::TRAILING_COMMENT;

const IDENT: &str = r"[\p{L}_][\p{L}\p{N}_]*";

const PHP_RESERVED: &[&str] = &[
    "function", "return", "if", "else", "for", "while", "switch", "case", "break", "continue",
    "echo", "true", "false", "null", "strrev", "intval", "implode", "array", "isset", "empty",
    "readline",
];

static PHP: Lazy<Dialect> = Lazy::new(build_php);
static PHP_TO_C: Lazy<Dialect> = Lazy::new(build_php_to_c);
static RUBY: Lazy<Dialect> = Lazy::new(build_ruby);
static RUBY_TO_GO: Lazy<Dialect> = Lazy::new(build_ruby_to_go);

static GO_ASSIGNMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?P<indent>[ \t]*)(?P<name>{IDENT})[ \t]*=(?P<rest>[^=].*)$"
    ))
    .expect("constant assignment pattern")
});

static GO_FUNC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(r"^[ \t]*func\s+{IDENT}\((?P<params>[^)]*)\)"))
        .expect("constant func pattern")
});

/// Source language → PHP.
#[must_use]
pub fn php() -> &'static Dialect {
    &PHP
}

/// PHP → C.
#[must_use]
pub fn php_to_c() -> &'static Dialect {
    &PHP_TO_C
}

/// Source language → Ruby.
#[must_use]
pub fn ruby() -> &'static Dialect {
    &RUBY
}

/// Ruby → Go.
#[must_use]
pub fn ruby_to_go() -> &'static Dialect {
    &RUBY_TO_GO
}

/// Output language of a translation chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Target {
    Php,
    C,
    Ruby,
    Go,
}

impl Target {
    pub const ALL: [Self; 4] = [Self::Php, Self::C, Self::Ruby, Self::Go];

    /// Rule tables applied in sequence to reach this target.
    #[must_use]
    pub fn stages(self) -> Vec<&'static Dialect> {
        match self {
            Self::Php => vec![php()],
            Self::C => vec![php(), php_to_c()],
            Self::Ruby => vec![ruby()],
            Self::Go => vec![ruby(), ruby_to_go()],
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Php => "php",
            Self::C => "c",
            Self::Ruby => "ruby",
            Self::Go => "go",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown target '{0}' (expected php, c, ruby or go)")]
pub struct UnknownTarget(pub String);

impl FromStr for Target {
    type Err = UnknownTarget;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownTarget(s.to_string()))
    }
}

/// Built-in rules use constant patterns.
fn rule(name: &str, pattern: &str, action: Action) -> RewriteRule {
    RewriteRule::new(name, pattern, action)
        .unwrap_or_else(|e| panic!("built-in rule table is invalid: {e}"))
}

fn template(name: &str, pattern: &str, replacement: &str) -> RewriteRule {
    rule(name, pattern, Action::Template(replacement.to_string()))
}

fn build_php() -> Dialect {
    Dialect::new("php")
        .marker('$')
        .reserved(PHP_RESERVED.iter().copied())
        .structural_rule(template(
            "string_reverse",
            r#"([\p{L}\p{N}_$]+)\.split\((?:''|"")\)\.reverse\(\)\.join\((?:''|"")\)"#,
            "strrev(${1})",
        ))
        .rule(template("declaration_keyword", r"\b(?:var|let|const)\s+", "$$"))
        .rule(template("strict_equality", "===", "=="))
        .rule(template("strict_inequality", "!==", "!="))
        .rule(template("to_string", r"\.toString\(\)", ""))
        .rule(template("parse_int", r"\bparseInt\s*\(([^)]+)\)", "intval(${1})"))
        .rule(template("console_log", r"\bconsole\.log\s*\(([^)]+)\)", "echo ${1}"))
        .rule(template("array_push", r"([\p{L}\p{N}_$]+)\.push\(([^)]+)\)", "${1}[] = ${2}"))
        .rule(template("prompt_input", r"\bpromptInput\s*\(([^)]*)\)", "readline(${1})"))
        .rule(rule(
            "function_signature",
            &format!(r"\b(?P<keyword>function)\s+(?P<name>{IDENT})\s*\((?P<params>[^)]*)\)"),
            Action::Signature,
        ))
        .rule(rule("decorate_identifiers", &format!(r"\b{IDENT}"), Action::Decorate))
        .preamble("<?php\n\n")
        .postamble("\n\n?>")
}

fn build_php_to_c() -> Dialect {
    Dialect::new("c")
        .comment_prefixes(&["//", "#"])
        .comment_style("#", "//")
        .rule(template("open_tag", r"<\?php\s*", ""))
        .rule(template("close_tag", r"\s*\?>", ""))
        .rule(template("function_keyword", r"\bfunction\s+", "void "))
        .rule(template(
            "echo_statement",
            r"\becho\s+([^;\n]+);",
            r#"printf("%s\n", ${1});"#,
        ))
        .rule(template("echo_keyword", r"\becho\b", "printf"))
        .rule(template("intval", r"\bintval\s*\(", "atoi("))
        .rule(template("variable_sigil", r"\$([\p{L}_])", "${1}"))
        .preamble("#include <stdio.h>\n\n")
}

fn build_ruby() -> Dialect {
    Dialect::new("ruby")
        .comment_style("//", "#")
        .structural_rule(template(
            "string_reverse",
            r#"([\p{L}\p{N}_]+)\.split\((?:''|"")\)\.reverse\(\)\.join\((?:''|"")\)"#,
            "${1}.reverse",
        ))
        .rule(rule(
            "function_definition",
            &format!(r"\bfunction\s+(?P<name>{IDENT})\s*\((?P<params>[^)]*)\)\s*\{{"),
            Action::Map(ruby_def),
        ))
        .rule(template(
            "statement_semicolon",
            &format!(r"(?m);((?:{TRAILING_COMMENT})?)[ \t]*$"),
            "${1}",
        ))
        .rule(rule(
            "counted_for",
            &format!(
                r"\bfor\s*\(\s*(?:(?:let|var|const)\s+)?(?P<var>{IDENT})\s*=\s*(?P<start>[^;]+?)\s*;\s*(?P<cond>{IDENT})\s*(?P<op><=|<)\s*(?P<end>[^;]+?)\s*;\s*(?P<step>{IDENT})\s*\+\+\s*\)\s*\{{"
            ),
            Action::Map(ruby_range_loop),
        ))
        .rule(template("declaration_keyword", r"\b(?:var|let|const)\s+", ""))
        .rule(template("strict_equality", "===", "=="))
        .rule(template("strict_inequality", "!==", "!="))
        .rule(template("to_string", r"\.toString\(\)", ".to_s"))
        .rule(template("parse_int", r"\bparseInt\s*\(([^)]+)\)", "Integer(${1})"))
        .rule(template("console_log", r"\bconsole\.log\s*\(([^)]+)\)", "puts ${1}"))
        .rule(template("array_push", r"([\p{L}\p{N}_]+)\.push\(([^)]+)\)", "${1} << ${2}"))
        .rule(rule(
            "prompt_input",
            r"\bpromptInput\s*\(([^)]*)\)",
            Action::Map(ruby_prompt),
        ))
        .rule(template("else_if", r"\}\s*else\s+if\s*\((.*)\)\s*\{", "elsif ${1}"))
        .rule(template("else", r"\}\s*else\s*\{", "else"))
        .rule(template("if_open", r"\bif\s*\((.*)\)\s*\{", "if ${1}"))
        .rule(template("while_open", r"\bwhile\s*\((.*)\)\s*\{", "while ${1}"))
        .rule(template(
            "block_close",
            &format!(r"(?m)^([ \t]*)\}}((?:{TRAILING_COMMENT})?)[ \t]*$"),
            "${1}end${2}",
        ))
        .rule(template("null_literal", r"\bnull\b", "nil"))
}

fn build_ruby_to_go() -> Dialect {
    Dialect::new("go")
        .comment_prefixes(&["#"])
        .comment_style("#", "//")
        .rule(rule(
            "method_definition",
            &format!(
                r"(?m)^(?P<indent>[ \t]*)def\s+(?P<name>{IDENT})(?:\s*\((?P<params>[^)]*)\))?(?P<comment>(?:{TRAILING_COMMENT})?)[ \t]*$"
            ),
            Action::Map(go_func),
        ))
        .rule(rule(
            "range_each",
            &format!(
                r"\((?P<start>[^.()]+?)(?P<dots>\.\.\.?)(?P<end>[^()]+?)\)\.each do \|(?P<var>{IDENT})\|"
            ),
            Action::Map(go_range_loop),
        ))
        .rule(line_rule("while_loop", r"while\s+(.+?)", "${1}for ${2} {${3}"))
        .rule(line_rule("elsif", r"elsif\s+(.+?)", "${1}} else if ${2} {${3}"))
        .rule(line_rule("if_open", r"if\s+(.+?)", "${1}if ${2} {${3}"))
        .rule(line_rule("else", "else", "${1}} else {${2}"))
        .rule(line_rule("block_end", "end", "${1}}${2}"))
        .rule(template(
            "puts",
            &format!(r"(?m)\bputs\s+(.+?)((?:{TRAILING_COMMENT})?)[ \t]*$"),
            "fmt.Println(${1})${2}",
        ))
        .rule(template("to_s", r"([\p{L}\p{N}_]+)\.to_s\b", "fmt.Sprint(${1})"))
        .rule(line_rule(
            "array_append",
            &format!(r"({IDENT})\s*<<\s*(.+?)"),
            "${1}${2} = append(${2}, ${3})${4}",
        ))
        .rule(rule(
            "short_declaration",
            &format!(r"(?m)^[ \t]*{IDENT}[ \t]*=[^=]"),
            Action::Text(go_short_declarations),
        ))
        .preamble("package main\n\nimport \"fmt\"\n\n")
}

/// A rule over a whole line: `${1}` is the indentation, `body` supplies
/// the next groups, and the last group is the trailing comment, if any.
fn line_rule(name: &str, body: &str, replacement: &str) -> RewriteRule {
    template(
        name,
        &format!(r"(?m)^([ \t]*){body}((?:{TRAILING_COMMENT})?)[ \t]*$"),
        replacement,
    )
}

fn ruby_def(caps: &Captures<'_>) -> String {
    let params = join_params(&caps["params"], None);
    if params.is_empty() {
        format!("def {}", &caps["name"])
    } else {
        format!("def {}({params})", &caps["name"])
    }
}

/// `for (i = a; i < b; i++) {` → `(a...b).each do |i|` when the three
/// clauses name the same variable; left untouched otherwise.
fn ruby_range_loop(caps: &Captures<'_>) -> String {
    let var = &caps["var"];
    if caps["cond"] != *var || caps["step"] != *var {
        return caps[0].to_string();
    }
    let dots = match &caps["op"] {
        "<" => "...",
        _ => "..",
    };
    format!("({}{dots}{}).each do |{var}|", &caps["start"], &caps["end"])
}

fn ruby_prompt(caps: &Captures<'_>) -> String {
    let question = caps[1].trim();
    if question.is_empty() {
        "gets.chomp".to_string()
    } else {
        format!("(print({question}); gets.chomp)")
    }
}

fn go_func(caps: &Captures<'_>) -> String {
    let indent = &caps["indent"];
    let name = &caps["name"];
    let comment = caps.name("comment").map_or("", |m| m.as_str());
    let params = caps
        .name("params")
        .map(|m| join_params(m.as_str(), None))
        .unwrap_or_default();
    if params.is_empty() {
        format!("{indent}func {name}() {{{comment}")
    } else {
        format!("{indent}func {name}({params} any) {{{comment}")
    }
}

fn go_range_loop(caps: &Captures<'_>) -> String {
    let var = &caps["var"];
    let op = match &caps["dots"] {
        "..." => "<",
        _ => "<=",
    };
    format!(
        "for {var} := {}; {var} {op} {}; {var}++ {{",
        caps["start"].trim(),
        caps["end"].trim()
    )
}

/// First plain assignment to a name inside a function (or at top level)
/// becomes a `:=` declaration. Function parameters count as declared.
fn go_short_declarations(text: &str) -> String {
    let mut declared: HashSet<String> = HashSet::new();
    let mut lines = Vec::new();
    for line in text.split('\n') {
        if let Some(caps) = GO_FUNC.captures(line) {
            declared = join_params(&caps["params"].replace(" any", ""), None)
                .split(", ")
                .filter(|p| !p.is_empty())
                .map(str::to_string)
                .collect();
            lines.push(line.to_string());
            continue;
        }
        match GO_ASSIGNMENT.captures(line) {
            Some(caps) if declared.insert(caps["name"].to_string()) => {
                lines.push(format!(
                    "{}{} :={}",
                    &caps["indent"], &caps["name"], &caps["rest"]
                ));
            }
            _ => lines.push(line.to_string()),
        }
    }
    lines.join("\n")
}
