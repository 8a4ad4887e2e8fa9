pub mod loader;
pub mod schema;

pub use loader::{load_from_path, load_from_str, ConfigError};
pub use schema::{
    FieldSpec, FileLayout, FileRole, ManifestSpec, PackagingSpec, Recipe, RuleSpec, ScriptSpec,
    ValidationError, ValidationIssue, FIELD_ATTRIBUTION, FIELD_DISPLAY_TEXT, FIELD_ENDPOINT,
    FIELD_ICON_REFERENCE,
};
