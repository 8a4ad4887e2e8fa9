//! Template Stamper: recipe-driven customization of desktop app templates
//!
//! A template directory holds a markup document, a script, a few sibling
//! assets and a `package.json` manifest. Stamping rewrites named fields in
//! the text assets, copies an icon, merges build fields into the manifest and
//! optionally hands off to an external packaging tool.
//!
//! # Architecture
//!
//! - [`PatternRule`] / [`FieldRule`]: declarative locate/replace rules with an
//!   ordered fallback chain per logical field
//! - [`AssetPatcher`]: applies field rules to an immutable [`Document`]
//! - [`FileEditor`]: read-modify-write of one file, all or nothing
//! - [`ManifestUpdater`]: dotted-path [`FieldSet`] merges into JSON
//! - [`CustomizationSession`]: validates the directory and runs every step,
//!   collecting failures instead of stopping at the first one
//!
//! # Safety
//!
//! - Atomic file writes (tempfile + fsync + rename)
//! - A file whose required field cannot be located is left byte-identical
//! - Malformed manifests are repaired from a default, not fatal
//! - Optional dry run and `.bak` backups
//!
//! # Example
//!
//! ```no_run
//! use template_stamper::{CustomizationSession, Recipe, SessionInputs};
//!
//! let mut session = CustomizationSession::new("./template", Recipe::default());
//! let report = session.run(&SessionInputs {
//!     display_text: "Demo".into(),
//!     attribution: "Example Corp".into(),
//!     ..Default::default()
//! });
//! for failure in report.failures() {
//!     eprintln!("{}: {:?}", failure.kind, failure.error());
//! }
//! ```

pub mod assets;
pub mod config;
pub mod console;
pub mod document;
pub mod edit;
pub mod error;
pub mod manifest;
pub mod patcher;
pub mod prompt;
pub mod rule;
pub mod session;

// Re-exports
pub use assets::{copy_icon, CopiedIcon, IconFormat};
pub use config::{load_from_path, load_from_str, ConfigError, Recipe};
pub use document::Document;
pub use edit::{EditApplied, EditOptions, EditOutcome, EditStatus, FileEditor};
pub use error::StampError;
pub use manifest::{merge_fields, FieldSet, ManifestReport, ManifestUpdater};
pub use patcher::{AssetPatcher, FieldApplication, MatchedBy, PatchOutcome, PatternNotFound};
pub use rule::{render_template, FieldRule, Heuristic, PatternRule};
pub use session::{
    CommandPackager, CustomizationSession, Packager, RunStatus, SessionInputs, SessionReport,
    SessionState, StepKind, StepOutcome, StepStatus,
};
