//! Declarative rewrite rules for text assets.
//!
//! A [`PatternRule`] finds one field with a regular expression and rewrites it
//! from a template. A [`FieldRule`] groups several candidates for the same
//! logical field: they are tried in order and the first match wins. When none
//! match, the field's [`Heuristic`]s get a turn before the field is declared
//! missing.

use regex::Regex;
use serde::Deserialize;

/// Placeholder for the caller-supplied value inside templates and heuristic lines.
pub const VALUE_PLACEHOLDER: &str = "{value}";

/// One locate/replace rule.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pub identifier: String,
    pub locate: Regex,
    /// Replacement in `regex` expansion syntax (`${1}`, `${name}`), with the
    /// value already substituted.
    pub replacement: String,
    pub required: bool,
}

impl PatternRule {
    pub fn new(
        identifier: impl Into<String>,
        pattern: &str,
        replacement: impl Into<String>,
        required: bool,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            identifier: identifier.into(),
            locate: Regex::new(pattern)?,
            replacement: replacement.into(),
            required,
        })
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.locate.is_match(text)
    }

    /// Rewrite every match in `text`. Returns `None` when nothing matched.
    pub fn apply(&self, text: &str) -> Option<String> {
        if !self.locate.is_match(text) {
            return None;
        }
        Some(
            self.locate
                .replace_all(text, self.replacement.as_str())
                .into_owned(),
        )
    }
}

/// Structural fallback tried when no candidate pattern matches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum Heuristic {
    /// Replace the first line that contains `needle` with `line`.
    ReplaceLineContaining { needle: String, line: String },
    /// Insert `line` after the last line that starts with `starts_with`
    /// (ignoring indentation) and contains `contains`.
    InsertAfterLast {
        starts_with: String,
        contains: String,
        line: String,
    },
}

impl Heuristic {
    /// Substitute `value` into the heuristic's line.
    pub fn bind(&self, value: &str) -> Heuristic {
        match self {
            Heuristic::ReplaceLineContaining { needle, line } => Heuristic::ReplaceLineContaining {
                needle: needle.clone(),
                line: line.replace(VALUE_PLACEHOLDER, value),
            },
            Heuristic::InsertAfterLast {
                starts_with,
                contains,
                line,
            } => Heuristic::InsertAfterLast {
                starts_with: starts_with.clone(),
                contains: contains.clone(),
                line: line.replace(VALUE_PLACEHOLDER, value),
            },
        }
    }

    pub fn apply(&self, text: &str) -> Option<String> {
        let mut lines: Vec<String> = text.split('\n').map(str::to_string).collect();
        match self {
            Heuristic::ReplaceLineContaining { needle, line } => {
                let index = lines.iter().position(|l| l.contains(needle.as_str()))?;
                let crlf = lines[index].ends_with('\r');
                lines[index] = if crlf {
                    format!("{line}\r")
                } else {
                    line.clone()
                };
            }
            Heuristic::InsertAfterLast {
                starts_with,
                contains,
                line,
            } => {
                let index = lines.iter().rposition(|l| {
                    l.trim_start().starts_with(starts_with.as_str()) && l.contains(contains.as_str())
                })?;
                lines.insert(index + 1, line.clone());
            }
        }
        Some(lines.join("\n"))
    }
}

/// Ordered candidates for one logical field.
#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: String,
    pub candidates: Vec<PatternRule>,
    pub heuristics: Vec<Heuristic>,
    /// The field must be located by a candidate or a heuristic.
    pub required: bool,
}

impl FieldRule {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            candidates: Vec::new(),
            heuristics: Vec::new(),
            required: false,
        }
    }

    pub fn candidate(mut self, rule: PatternRule) -> Self {
        self.candidates.push(rule);
        self
    }

    pub fn heuristic(mut self, heuristic: Heuristic) -> Self {
        self.heuristics.push(heuristic);
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// A required candidate vetoes the heuristic fallback.
    pub fn has_required_candidate(&self) -> bool {
        self.candidates.iter().any(|c| c.required)
    }
}

/// Substitute `value` into a replacement template so that it is inserted
/// literally by `regex` expansion.
pub fn render_template(template: &str, value: &str) -> String {
    template.replace(VALUE_PLACEHOLDER, &value.replace('$', "$$"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_rule_preserves_captured_quotes() {
        let rule = PatternRule::new(
            "endpoint",
            r#"(const ENDPOINT_URL = ['"]).*?(['"];)"#,
            render_template("${1}{value}${2}", "https://example.test/hook"),
            false,
        )
        .unwrap();

        let out = rule.apply("const ENDPOINT_URL = \"old\";\n").unwrap();
        assert_eq!(out, "const ENDPOINT_URL = \"https://example.test/hook\";\n");
    }

    #[test]
    fn test_pattern_rule_no_match() {
        let rule = PatternRule::new("x", "absent", "y", true).unwrap();
        assert!(rule.apply("present").is_none());
    }

    #[test]
    fn test_render_template_escapes_dollar() {
        let rule = PatternRule::new(
            "price",
            r"(<b>).*?(</b>)",
            render_template("${1}{value}${2}", "$1 off"),
            false,
        )
        .unwrap();
        assert_eq!(rule.apply("<b>old</b>").unwrap(), "<b>$1 off</b>");
    }

    #[test]
    fn test_replace_line_keeps_crlf() {
        let heuristic = Heuristic::ReplaceLineContaining {
            needle: "TOKEN".into(),
            line: "const TOKEN = 'x';".into(),
        };
        let out = heuristic.apply("a\r\nlet TOKEN;\r\nb").unwrap();
        assert_eq!(out, "a\r\nconst TOKEN = 'x';\r\nb");
    }

    #[test]
    fn test_insert_after_last_require() {
        let heuristic = Heuristic::InsertAfterLast {
            starts_with: "const ".into(),
            contains: "require".into(),
            line: "const A = 1;".into(),
        }
        .bind("unused");
        let text = "const fs = require('fs');\nconst path = require('path');\n\nmain();";
        let out = heuristic.apply(text).unwrap();
        assert_eq!(
            out,
            "const fs = require('fs');\nconst path = require('path');\nconst A = 1;\n\nmain();"
        );
    }

    #[test]
    fn test_heuristic_bind_substitutes_value() {
        let heuristic = Heuristic::ReplaceLineContaining {
            needle: "URL".into(),
            line: "const URL = '{value}';".into(),
        }
        .bind("http://a");
        assert_eq!(heuristic.apply("let URL").unwrap(), "const URL = 'http://a';");
    }
}
