//! Customization session: validate a template directory, then run every
//! configured step against it.
//!
//! `Init → Validating → Patching → Done`, or `Validating → Aborted` when a
//! required sibling file is missing. Step failures are collected, never
//! fatal: each step runs regardless of how the previous ones went.

pub mod packager;

use crate::assets::{copy_icon, CopiedIcon};
use crate::config::{
    Recipe, FIELD_ATTRIBUTION, FIELD_DISPLAY_TEXT, FIELD_ENDPOINT, FIELD_ICON_REFERENCE,
};
use crate::edit::{EditApplied, EditOptions, FileEditor};
use crate::error::StampError;
use crate::manifest::{FieldSet, ManifestUpdater};
use crate::rule::FieldRule;
use log::{debug, warn};
use std::fmt;
use std::path::{Path, PathBuf};

pub use packager::{CommandPackager, Packager, RunStatus};

/// Values collected from the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionInputs {
    pub display_text: String,
    pub attribution: String,
    /// `None` skips the endpoint step.
    pub endpoint: Option<String>,
    /// `None` skips the icon step.
    pub icon: Option<PathBuf>,
    pub package: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Init,
    Validating,
    Patching { step: usize, total: usize },
    Done,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    DisplayText,
    Endpoint,
    Icon,
    Manifest,
    Package,
}

impl StepKind {
    pub const ALL: [StepKind; 5] = [
        StepKind::DisplayText,
        StepKind::Endpoint,
        StepKind::Icon,
        StepKind::Manifest,
        StepKind::Package,
    ];
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StepKind::DisplayText => "display text",
            StepKind::Endpoint => "endpoint",
            StepKind::Icon => "icon",
            StepKind::Manifest => "manifest",
            StepKind::Package => "package",
        };
        f.write_str(label)
    }
}

#[derive(Debug)]
pub enum StepStatus {
    /// Step did its work. `changed` is false when everything was already current.
    Succeeded { detail: String, changed: bool },
    Skipped { reason: String },
    Failed(StampError),
}

#[derive(Debug)]
pub struct StepOutcome {
    pub kind: StepKind,
    pub status: StepStatus,
    /// Unified diffs produced on a dry run.
    pub diffs: Vec<String>,
}

impl StepOutcome {
    fn succeeded(kind: StepKind, detail: impl Into<String>, changed: bool) -> Self {
        Self {
            kind,
            status: StepStatus::Succeeded {
                detail: detail.into(),
                changed,
            },
            diffs: Vec::new(),
        }
    }

    fn skipped(kind: StepKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            status: StepStatus::Skipped {
                reason: reason.into(),
            },
            diffs: Vec::new(),
        }
    }

    fn failed(kind: StepKind, error: StampError) -> Self {
        Self {
            kind,
            status: StepStatus::Failed(error),
            diffs: Vec::new(),
        }
    }

    fn with_diff(mut self, diff: Option<String>) -> Self {
        self.diffs.extend(diff);
        self
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.status, StepStatus::Failed(_))
    }

    pub fn error(&self) -> Option<&StampError> {
        match &self.status {
            StepStatus::Failed(e) => Some(e),
            _ => None,
        }
    }
}

#[derive(Debug)]
#[must_use = "SessionReport should be checked for failures"]
pub struct SessionReport {
    pub state: SessionState,
    /// Required files found missing during validation.
    pub missing: Vec<String>,
    pub steps: Vec<StepOutcome>,
}

impl SessionReport {
    pub fn is_aborted(&self) -> bool {
        self.state == SessionState::Aborted
    }

    pub fn failures(&self) -> impl Iterator<Item = &StepOutcome> {
        self.steps.iter().filter(|s| s.is_failure())
    }

    pub fn step(&self, kind: StepKind) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.kind == kind)
    }
}

pub struct CustomizationSession {
    root: PathBuf,
    recipe: Recipe,
    options: EditOptions,
    packager: Box<dyn Packager>,
    state: SessionState,
}

impl fmt::Debug for CustomizationSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomizationSession")
            .field("root", &self.root)
            .field("options", &self.options)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl CustomizationSession {
    pub fn new(root: impl Into<PathBuf>, recipe: Recipe) -> Self {
        Self {
            root: root.into(),
            recipe,
            options: EditOptions::default(),
            packager: Box::new(CommandPackager),
            state: SessionState::Init,
        }
    }

    pub fn with_options(mut self, options: EditOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_packager(mut self, packager: impl Packager + 'static) -> Self {
        self.packager = Box::new(packager);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn run(&mut self, inputs: &SessionInputs) -> SessionReport {
        self.run_with(inputs, |_| {})
    }

    /// Run the session, calling `on_step` as soon as each step finishes.
    pub fn run_with<F>(&mut self, inputs: &SessionInputs, mut on_step: F) -> SessionReport
    where
        F: FnMut(&StepOutcome),
    {
        self.transition(SessionState::Validating);
        let missing = self.missing_files();
        if !missing.is_empty() {
            warn!("aborting: missing {}", missing.join(", "));
            self.transition(SessionState::Aborted);
            return SessionReport {
                state: SessionState::Aborted,
                missing,
                steps: Vec::new(),
            };
        }

        let total = StepKind::ALL.len();
        let mut steps = Vec::with_capacity(total);
        let mut icon: Option<CopiedIcon> = None;

        for (index, kind) in StepKind::ALL.into_iter().enumerate() {
            self.transition(SessionState::Patching {
                step: index + 1,
                total,
            });
            let outcome = match kind {
                StepKind::DisplayText => self.rewrite_display_text(inputs),
                StepKind::Endpoint => self.rewrite_endpoint(inputs),
                StepKind::Icon => {
                    let (outcome, copied) = self.replace_icon(inputs);
                    icon = copied;
                    outcome
                }
                StepKind::Manifest => self.merge_manifest(inputs, icon.as_ref()),
                StepKind::Package => self.package(inputs),
            };
            on_step(&outcome);
            steps.push(outcome);
        }

        self.transition(SessionState::Done);
        SessionReport {
            state: SessionState::Done,
            missing: Vec::new(),
            steps,
        }
    }

    fn transition(&mut self, next: SessionState) {
        debug!("session {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Required siblings absent from the target directory, in recipe order.
    pub fn missing_files(&self) -> Vec<String> {
        self.recipe
            .files
            .required
            .iter()
            .filter(|name| !self.root.join(name.as_str()).is_file())
            .cloned()
            .collect()
    }

    fn compile(&self, id: &str, value: &str) -> Result<Option<FieldRule>, StampError> {
        match self.recipe.field(id) {
            Some(spec) => Ok(Some(spec.compile(value)?)),
            None => Ok(None),
        }
    }

    fn rewrite_display_text(&self, inputs: &SessionInputs) -> StepOutcome {
        let kind = StepKind::DisplayText;
        let rules = match self.compile_all(&[
            (FIELD_DISPLAY_TEXT, inputs.display_text.as_str()),
            (FIELD_ATTRIBUTION, inputs.attribution.as_str()),
        ]) {
            Ok(rules) => rules,
            Err(e) => return StepOutcome::failed(kind, e),
        };
        let path = self.root.join(&self.recipe.files.markup);
        match FileEditor::new(path, self.options).patch(&rules).into_result() {
            Ok(applied) => edited(
                kind,
                applied,
                format!(
                    "display text '{}', attribution '{}'",
                    inputs.display_text, inputs.attribution
                ),
            ),
            Err(e) => StepOutcome::failed(kind, e),
        }
    }

    fn rewrite_endpoint(&self, inputs: &SessionInputs) -> StepOutcome {
        let kind = StepKind::Endpoint;
        let Some(endpoint) = inputs.endpoint.as_deref() else {
            return StepOutcome::skipped(kind, "no endpoint given");
        };
        let rules = match self.compile_all(&[(FIELD_ENDPOINT, endpoint)]) {
            Ok(rules) => rules,
            Err(e) => return StepOutcome::failed(kind, e),
        };
        let path = self.root.join(&self.recipe.files.script);
        match FileEditor::new(path, self.options).patch(&rules).into_result() {
            Ok(applied) => edited(kind, applied, format!("endpoint set to {endpoint}")),
            Err(e) => StepOutcome::failed(kind, e),
        }
    }

    fn replace_icon(&self, inputs: &SessionInputs) -> (StepOutcome, Option<CopiedIcon>) {
        let kind = StepKind::Icon;
        let Some(source) = inputs.icon.as_deref() else {
            return (StepOutcome::skipped(kind, "no icon given"), None);
        };

        let files = &self.recipe.files;
        let copied = match copy_icon(
            source,
            &self.root,
            &files.assets_dir,
            &files.icon_stem,
            self.options.dry_run,
        ) {
            Ok(copied) => copied,
            Err(e) => return (StepOutcome::failed(kind, e), None),
        };

        let rules = match self.compile_all(&[(FIELD_ICON_REFERENCE, copied.relative.as_str())]) {
            Ok(rules) => rules,
            Err(e) => return (StepOutcome::failed(kind, e), Some(copied)),
        };
        let detail = format!("copied to {}", copied.relative);
        if rules.is_empty() {
            return (StepOutcome::succeeded(kind, detail, true), Some(copied));
        }

        let path = self.root.join(&files.markup);
        let outcome = match FileEditor::new(path, self.options).patch(&rules).into_result() {
            Ok(applied) => {
                let detail = if applied.skipped.is_empty() {
                    format!("{detail}, markup updated")
                } else {
                    format!("{detail}, markup has no icon reference")
                };
                StepOutcome::succeeded(kind, detail, true).with_diff(applied.diff)
            }
            Err(e) => StepOutcome::failed(kind, e),
        };
        (outcome, Some(copied))
    }

    /// The fields merged into the manifest for these inputs.
    pub fn manifest_fields(&self, inputs: &SessionInputs, icon: Option<&CopiedIcon>) -> FieldSet {
        let spec = &self.recipe.manifest;
        let mut fields = FieldSet::new()
            .set("main", spec.entry_point.as_str())
            .set("description", spec.description.as_str());
        for script in &spec.scripts {
            fields.insert(format!("scripts.{}", script.name), script.command.as_str());
        }
        fields.insert("build.appId", spec.app_id.as_str());
        fields.insert("build.productName", inputs.display_text.as_str());
        fields.insert("build.directories.output", spec.output_dir.as_str());
        fields.insert(format!("build.{}.target", spec.platform), spec.target.as_str());
        if let Some(icon) = icon.filter(|i| i.format.usable_for_packaging()) {
            fields.insert(format!("build.{}.icon", spec.platform), icon.relative.as_str());
        }
        fields
    }

    fn merge_manifest(&self, inputs: &SessionInputs, icon: Option<&CopiedIcon>) -> StepOutcome {
        let kind = StepKind::Manifest;
        let fields = self.manifest_fields(inputs, icon);
        let path = self.root.join(&self.recipe.files.manifest);
        match ManifestUpdater::new(path, self.options).update(&fields) {
            Ok(report) => {
                let detail = match &report.repaired {
                    Some(note) => format!("{} fields merged ({note})", fields.len()),
                    None => format!("{} fields merged", fields.len()),
                };
                StepOutcome::succeeded(kind, detail, report.changed).with_diff(report.diff)
            }
            Err(e) => StepOutcome::failed(kind, e),
        }
    }

    fn package(&self, inputs: &SessionInputs) -> StepOutcome {
        let kind = StepKind::Package;
        if !inputs.package {
            return StepOutcome::skipped(kind, "not requested");
        }
        if self.options.dry_run {
            return StepOutcome::skipped(kind, "dry run");
        }

        let spec = &self.recipe.packaging;
        let mut notes = Vec::new();
        if !spec.install_args.is_empty() {
            match self.invoke(&spec.program, &spec.install_args) {
                Ok(()) => {}
                Err(e) => {
                    // Build may still succeed with an existing install
                    warn!("{e}");
                    notes.push(format!("install step failed: {e}"));
                }
            }
        }

        match self.invoke(&spec.program, &spec.build_args) {
            Ok(()) => {
                let mut detail = format!(
                    "built into {}",
                    self.root.join(&self.recipe.manifest.output_dir).display()
                );
                for note in notes {
                    detail.push_str(&format!(" ({note})"));
                }
                StepOutcome::succeeded(kind, detail, true)
            }
            Err(e) => StepOutcome::failed(kind, e),
        }
    }

    fn invoke(&self, program: &str, args: &[String]) -> Result<(), StampError> {
        let command = packager::command_line(program, args);
        let status = self
            .packager
            .run(&self.root, program, args)
            .map_err(|source| StampError::io(PathBuf::from(program), source))?;
        if status.success() {
            Ok(())
        } else {
            Err(StampError::SubprocessFailure {
                command,
                code: status.code,
            })
        }
    }

    fn compile_all(&self, fields: &[(&str, &str)]) -> Result<Vec<FieldRule>, StampError> {
        let mut rules = Vec::with_capacity(fields.len());
        for (id, value) in fields {
            if let Some(rule) = self.compile(id, value)? {
                rules.push(rule);
            }
        }
        Ok(rules)
    }
}

fn edited(kind: StepKind, applied: EditApplied, detail: String) -> StepOutcome {
    let detail = if applied.skipped.is_empty() {
        detail
    } else {
        format!("{detail} (not found: {})", applied.skipped.join(", "))
    };
    StepOutcome::succeeded(kind, detail, applied.changed).with_diff(applied.diff)
}
