use crate::config::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors surfaced by the stamping steps.
///
/// Every variant is caught at the step boundary and turned into one console
/// line; only [`StampError::MissingFile`] ends a session early.
#[derive(Error, Debug)]
pub enum StampError {
    #[error("missing required files: {}", .names.join(", "))]
    MissingFile { names: Vec<String> },

    #[error("could not locate field '{field}' in {}", .file.display())]
    PatternNotFound { file: PathBuf, field: String },

    #[error("malformed structured data in {} (repaired): {reason}", .path.display())]
    MalformedStructuredData { path: PathBuf, reason: String },

    #[error("command '{command}' failed with {}", exit_label(.code))]
    SubprocessFailure { command: String, code: Option<i32> },

    #[error("unsupported asset format '{extension}' for {}", .path.display())]
    UnsupportedAssetFormat { path: PathBuf, extension: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("recipe error: {0}")]
    Recipe(#[from] ConfigError),

    #[error("invalid rule pattern: {0}")]
    InvalidRule(#[from] regex::Error),
}

impl StampError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StampError::Io {
            path: path.into(),
            source,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_lists_names() {
        let err = StampError::MissingFile {
            names: vec!["index.js".into(), "styles.css".into()],
        };
        assert_eq!(err.to_string(), "missing required files: index.js, styles.css");
    }

    #[test]
    fn test_subprocess_failure_without_code() {
        let err = StampError::SubprocessFailure {
            command: "npm run build".into(),
            code: None,
        };
        assert!(err.to_string().contains("terminated by signal"));
    }
}
