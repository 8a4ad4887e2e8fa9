use crate::rule::{render_template, FieldRule, Heuristic, PatternRule};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashSet;
use std::fmt;

pub const FIELD_DISPLAY_TEXT: &str = "display-text";
pub const FIELD_ATTRIBUTION: &str = "attribution";
pub const FIELD_ENDPOINT: &str = "endpoint";
pub const FIELD_ICON_REFERENCE: &str = "icon-reference";

/// Fields the session cannot run without.
const MANDATORY_FIELDS: [&str; 3] = [FIELD_DISPLAY_TEXT, FIELD_ATTRIBUTION, FIELD_ENDPOINT];

/// Everything a session needs to know about a template layout.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct Recipe {
    pub files: FileLayout,
    pub fields: Vec<FieldSpec>,
    pub manifest: ManifestSpec,
    pub packaging: PackagingSpec,
}

impl Recipe {
    pub fn field(&self, id: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.id == id)
    }

    pub fn file_for(&self, role: FileRole) -> &str {
        match role {
            FileRole::Markup => &self.files.markup,
            FileRole::Script => &self.files.script,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.files.required.is_empty() {
            issues.push(ValidationIssue::MissingField {
                field_id: None,
                field: "files.required",
            });
        }
        for (name, value) in [
            ("files.markup", &self.files.markup),
            ("files.script", &self.files.script),
            ("files.manifest", &self.files.manifest),
            ("files.assets_dir", &self.files.assets_dir),
        ] {
            if value.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    field_id: None,
                    field: name,
                });
            }
        }

        let mut seen = HashSet::new();
        for spec in &self.fields {
            if spec.id.trim().is_empty() {
                issues.push(ValidationIssue::MissingField {
                    field_id: None,
                    field: "id",
                });
                continue;
            }
            if !seen.insert(spec.id.as_str()) {
                issues.push(ValidationIssue::InvalidCombo {
                    field_id: Some(spec.id.clone()),
                    message: "duplicate field id".to_string(),
                });
            }
            if spec.candidates.is_empty() && spec.heuristics.is_empty() {
                issues.push(ValidationIssue::MissingField {
                    field_id: Some(spec.id.clone()),
                    field: "candidates",
                });
            }
            for candidate in &spec.candidates {
                if candidate.pattern.trim().is_empty() {
                    issues.push(ValidationIssue::MissingField {
                        field_id: Some(spec.id.clone()),
                        field: "candidates.pattern",
                    });
                } else if let Err(e) = Regex::new(&candidate.pattern) {
                    issues.push(ValidationIssue::InvalidPattern {
                        field_id: spec.id.clone(),
                        rule_id: candidate.id.clone(),
                        message: e.to_string(),
                    });
                }
            }
        }

        for id in MANDATORY_FIELDS {
            if self.field(id).is_none() {
                issues.push(ValidationIssue::MissingMandatoryField(id));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }
}

impl Default for Recipe {
    fn default() -> Self {
        let value_template = "${1}{value}${2}";
        let endpoint_line = "const ENDPOINT_URL = '{value}';";
        Self {
            files: FileLayout::default(),
            fields: vec![
                FieldSpec {
                    id: FIELD_DISPLAY_TEXT.to_string(),
                    file: FileRole::Markup,
                    candidates: vec![RuleSpec::new(
                        "app-name-paragraph",
                        r#"(<p class="app-name">).*?(</p>)"#,
                        value_template,
                    )],
                    heuristics: Vec::new(),
                    required: true,
                },
                FieldSpec {
                    id: FIELD_ATTRIBUTION.to_string(),
                    file: FileRole::Markup,
                    candidates: vec![
                        RuleSpec::new(
                            "publisher-labelled",
                            r#"(<p class="publisher">[^:<]*:\s*)[^<]*(</p>)"#,
                            value_template,
                        ),
                        RuleSpec::new(
                            "publisher-plain",
                            r#"(<p class="publisher">)[^<]*(</p>)"#,
                            value_template,
                        ),
                    ],
                    heuristics: Vec::new(),
                    required: true,
                },
                FieldSpec {
                    id: FIELD_ENDPOINT.to_string(),
                    file: FileRole::Script,
                    candidates: vec![
                        RuleSpec::new(
                            "const-declaration",
                            r#"(const ENDPOINT_URL = ['"]).*?(['"];)"#,
                            value_template,
                        ),
                        RuleSpec::new(
                            "env-default",
                            r#"(process\.env\.ENDPOINT_URL \|\| ['"]).*?(['"])"#,
                            value_template,
                        ),
                        RuleSpec::new(
                            "assignment",
                            r#"(ENDPOINT_URL\s*[:=]\s*['"])[^'"]*(['"])"#,
                            value_template,
                        ),
                    ],
                    heuristics: vec![
                        Heuristic::ReplaceLineContaining {
                            needle: "ENDPOINT_URL".to_string(),
                            line: endpoint_line.to_string(),
                        },
                        Heuristic::InsertAfterLast {
                            starts_with: "const ".to_string(),
                            contains: "require(".to_string(),
                            line: endpoint_line.to_string(),
                        },
                    ],
                    required: true,
                },
                FieldSpec {
                    id: FIELD_ICON_REFERENCE.to_string(),
                    file: FileRole::Markup,
                    candidates: vec![RuleSpec::new(
                        "app-icon-img",
                        r#"(<div class="app-icon">\s*<img src=")[^"]*(")"#,
                        value_template,
                    )],
                    heuristics: Vec::new(),
                    required: false,
                },
            ],
            manifest: ManifestSpec::default(),
            packaging: PackagingSpec::default(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FileLayout {
    /// Siblings that must exist before anything is written.
    pub required: Vec<String>,
    pub markup: String,
    pub script: String,
    pub manifest: String,
    pub assets_dir: String,
    /// File stem of the copied icon.
    pub icon_stem: String,
}

impl Default for FileLayout {
    fn default() -> Self {
        Self {
            required: ["index.js", "index.html", "preload.js", "renderer.js", "styles.css"]
                .into_iter()
                .map(String::from)
                .collect(),
            markup: "index.html".to_string(),
            script: "index.js".to_string(),
            manifest: "package.json".to_string(),
            assets_dir: "assets".to_string(),
            icon_stem: "icon".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FileRole {
    Markup,
    Script,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FieldSpec {
    pub id: String,
    pub file: FileRole,
    #[serde(default)]
    pub candidates: Vec<RuleSpec>,
    #[serde(default)]
    pub heuristics: Vec<Heuristic>,
    #[serde(default)]
    pub required: bool,
}

impl FieldSpec {
    /// Bind `value` into every template and compile the patterns.
    pub fn compile(&self, value: &str) -> Result<FieldRule, regex::Error> {
        let mut rule = FieldRule::new(self.id.clone()).required(self.required);
        for candidate in &self.candidates {
            rule = rule.candidate(PatternRule::new(
                candidate.id.clone(),
                &candidate.pattern,
                render_template(&candidate.template, value),
                candidate.required,
            )?);
        }
        for heuristic in &self.heuristics {
            rule = rule.heuristic(heuristic.bind(value));
        }
        Ok(rule)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct RuleSpec {
    pub id: String,
    pub pattern: String,
    pub template: String,
    #[serde(default)]
    pub required: bool,
}

impl RuleSpec {
    fn new(id: &str, pattern: &str, template: &str) -> Self {
        Self {
            id: id.to_string(),
            pattern: pattern.to_string(),
            template: template.to_string(),
            required: false,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ManifestSpec {
    pub entry_point: String,
    pub description: String,
    pub app_id: String,
    pub output_dir: String,
    /// Platform key under `build` (e.g. `win`).
    pub platform: String,
    pub target: String,
    pub scripts: Vec<ScriptSpec>,
}

impl Default for ManifestSpec {
    fn default() -> Self {
        Self {
            entry_point: "index.js".to_string(),
            description: "Desktop application".to_string(),
            app_id: "com.example.template-app".to_string(),
            output_dir: "dist".to_string(),
            platform: "win".to_string(),
            target: "portable".to_string(),
            scripts: vec![
                ScriptSpec::new("start", "electron ."),
                ScriptSpec::new("build", "electron-builder"),
            ],
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct ScriptSpec {
    pub name: String,
    pub command: String,
}

impl ScriptSpec {
    fn new(name: &str, command: &str) -> Self {
        Self {
            name: name.to_string(),
            command: command.to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct PackagingSpec {
    pub program: String,
    pub install_args: Vec<String>,
    pub build_args: Vec<String>,
}

impl Default for PackagingSpec {
    fn default() -> Self {
        Self {
            program: "npm".to_string(),
            install_args: ["install", "--save-dev", "electron-builder"]
                .into_iter()
                .map(String::from)
                .collect(),
            build_args: ["run", "build"].into_iter().map(String::from).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    MissingField {
        field_id: Option<String>,
        field: &'static str,
    },
    MissingMandatoryField(&'static str),
    InvalidPattern {
        field_id: String,
        rule_id: String,
        message: String,
    },
    InvalidCombo {
        field_id: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingField { field_id, field } => match field_id {
                Some(id) => write!(f, "field '{id}' missing required setting '{field}'"),
                None => write!(f, "recipe missing required setting '{field}'"),
            },
            ValidationIssue::MissingMandatoryField(id) => {
                write!(f, "recipe does not define field '{id}'")
            }
            ValidationIssue::InvalidPattern {
                field_id,
                rule_id,
                message,
            } => write!(f, "field '{field_id}' rule '{rule_id}' has invalid pattern: {message}"),
            ValidationIssue::InvalidCombo { field_id, message } => match field_id {
                Some(id) => write!(f, "field '{id}' has invalid configuration: {message}"),
                None => write!(f, "invalid recipe configuration: {message}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_recipe_is_valid() {
        Recipe::default().validate().unwrap();
    }

    #[test]
    fn test_default_endpoint_has_three_candidates() {
        let recipe = Recipe::default();
        let endpoint = recipe.field(FIELD_ENDPOINT).unwrap();
        assert_eq!(endpoint.candidates.len(), 3);
        assert_eq!(endpoint.heuristics.len(), 2);
        assert!(endpoint.required);
    }

    #[test]
    fn test_attribution_keeps_label() {
        let rule = Recipe::default()
            .field(FIELD_ATTRIBUTION)
            .unwrap()
            .compile("Example Corp")
            .unwrap();
        let out = crate::patcher::AssetPatcher::new()
            .apply(
                &crate::document::Document::from(r#"<p class="publisher">Publisher: Someone</p>"#),
                &[rule],
            )
            .unwrap();
        assert_eq!(
            out.document.text(),
            r#"<p class="publisher">Publisher: Example Corp</p>"#
        );
    }

    #[test]
    fn test_compile_reports_bad_regex() {
        let spec = FieldSpec {
            id: "broken".into(),
            file: FileRole::Markup,
            candidates: vec![RuleSpec::new("bad", "(unclosed", "x")],
            heuristics: Vec::new(),
            required: true,
        };
        assert!(spec.compile("v").is_err());
    }
}
