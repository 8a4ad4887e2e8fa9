//! Applies ordered field rules to a [`Document`].

use crate::document::Document;
use crate::rule::FieldRule;
use log::debug;
use std::fmt;

/// How a field was located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchedBy {
    /// Candidate pattern with this identifier matched.
    Candidate(String),
    /// The heuristic at this index in the field's list applied.
    Heuristic(usize),
    /// Optional field not found; left alone.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldApplication {
    pub field: String,
    pub matched_by: MatchedBy,
}

/// Successful patch: the new snapshot and what happened per field.
#[derive(Debug, Clone)]
#[must_use = "PatchOutcome holds the patched document"]
pub struct PatchOutcome {
    pub document: Document,
    pub fields: Vec<FieldApplication>,
}

impl PatchOutcome {
    pub fn skipped(&self) -> impl Iterator<Item = &str> {
        self.fields
            .iter()
            .filter(|f| f.matched_by == MatchedBy::Skipped)
            .map(|f| f.field.as_str())
    }
}

/// A required field could not be located; the whole patch is void.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternNotFound {
    pub field: String,
}

impl fmt::Display for PatternNotFound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pattern not found for field '{}'", self.field)
    }
}

impl std::error::Error for PatternNotFound {}

#[derive(Debug, Default, Clone, Copy)]
pub struct AssetPatcher;

impl AssetPatcher {
    pub fn new() -> Self {
        Self
    }

    /// Apply `fields` in order. Each field sees the text produced by the
    /// fields before it. The input document is never modified.
    pub fn apply(
        &self,
        document: &Document,
        fields: &[FieldRule],
    ) -> Result<PatchOutcome, PatternNotFound> {
        let mut text = document.text().to_string();
        let mut applied = Vec::with_capacity(fields.len());

        for field in fields {
            let matched_by = match self.apply_field(&text, field) {
                Some((new_text, matched_by)) => {
                    text = new_text;
                    matched_by
                }
                None if field.required || field.has_required_candidate() => {
                    debug!("field '{}' not found; aborting patch", field.field);
                    return Err(PatternNotFound {
                        field: field.field.clone(),
                    });
                }
                None => {
                    debug!("optional field '{}' not found; skipping", field.field);
                    MatchedBy::Skipped
                }
            };
            applied.push(FieldApplication {
                field: field.field.clone(),
                matched_by,
            });
        }

        Ok(PatchOutcome {
            document: document.with_text(text),
            fields: applied,
        })
    }

    fn apply_field(&self, text: &str, field: &FieldRule) -> Option<(String, MatchedBy)> {
        for candidate in &field.candidates {
            if let Some(new_text) = candidate.apply(text) {
                debug!(
                    "field '{}' matched candidate '{}'",
                    field.field, candidate.identifier
                );
                return Some((new_text, MatchedBy::Candidate(candidate.identifier.clone())));
            }
        }

        if field.has_required_candidate() {
            return None;
        }

        field
            .heuristics
            .iter()
            .enumerate()
            .find_map(|(index, heuristic)| {
                heuristic.apply(text).map(|new_text| {
                    debug!("field '{}' placed by heuristic #{}", field.field, index);
                    (new_text, MatchedBy::Heuristic(index))
                })
            })
    }
}
