use crate::document::Document;
use crate::error::StampError;
use crate::patcher::{AssetPatcher, PatternNotFound};
use crate::rule::FieldRule;
use log::debug;
use similar::TextDiff;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Knobs shared by every writer in a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditOptions {
    /// Compute changes and diffs but never write.
    pub dry_run: bool,
    /// Keep `<file>.bak` with the previous content before overwriting.
    pub backup: bool,
}

/// Coarse status of a file edit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditStatus {
    Ok,
    NotFound,
    NoMatch,
    IoError,
}

impl fmt::Display for EditStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            EditStatus::Ok => "ok",
            EditStatus::NotFound => "not-found",
            EditStatus::NoMatch => "no-match",
            EditStatus::IoError => "io-error",
        };
        f.write_str(label)
    }
}

/// Result of a read-modify-write on one file.
#[derive(Debug)]
#[must_use = "EditOutcome should be checked for success/failure"]
pub enum EditOutcome {
    /// Patch succeeded. `changed` is false when the content was already current.
    Ok {
        file: PathBuf,
        changed: bool,
        skipped: Vec<String>,
        diff: Option<String>,
    },
    /// Target file is absent.
    NotFound { file: PathBuf },
    /// A required field could not be located; the file was not touched.
    NoMatch { file: PathBuf, field: String },
    /// Reading or writing failed; the file was not touched.
    IoError { file: PathBuf, source: io::Error },
}

impl EditOutcome {
    pub fn status(&self) -> EditStatus {
        match self {
            EditOutcome::Ok { .. } => EditStatus::Ok,
            EditOutcome::NotFound { .. } => EditStatus::NotFound,
            EditOutcome::NoMatch { .. } => EditStatus::NoMatch,
            EditOutcome::IoError { .. } => EditStatus::IoError,
        }
    }

    pub fn file(&self) -> &Path {
        match self {
            EditOutcome::Ok { file, .. }
            | EditOutcome::NotFound { file }
            | EditOutcome::NoMatch { file, .. }
            | EditOutcome::IoError { file, .. } => file,
        }
    }

    /// Fold the failure variants into the crate error taxonomy.
    pub fn into_result(self) -> Result<EditApplied, StampError> {
        match self {
            EditOutcome::Ok {
                file,
                changed,
                skipped,
                diff,
            } => Ok(EditApplied {
                file,
                changed,
                skipped,
                diff,
            }),
            EditOutcome::NotFound { file } => Err(StampError::MissingFile {
                names: vec![display_name(&file)],
            }),
            EditOutcome::NoMatch { file, field } => {
                Err(StampError::PatternNotFound { file, field })
            }
            EditOutcome::IoError { file, source } => Err(StampError::io(file, source)),
        }
    }
}

/// Success half of [`EditOutcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditApplied {
    pub file: PathBuf,
    pub changed: bool,
    pub skipped: Vec<String>,
    pub diff: Option<String>,
}

/// Scoped read-modify-write of a single file.
///
/// The file is read in full, transformed in memory and written back through a
/// tempfile + fsync + rename, so it either holds the old content or the new
/// content, never a mix.
#[derive(Debug, Clone)]
pub struct FileEditor {
    path: PathBuf,
    options: EditOptions,
}

impl FileEditor {
    pub fn new(path: impl Into<PathBuf>, options: EditOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `fields` through an [`AssetPatcher`] and persist the result.
    pub fn patch(&self, fields: &[FieldRule]) -> EditOutcome {
        let patcher = AssetPatcher::new();
        self.rewrite(|document| {
            patcher
                .apply(document, fields)
                .map(|outcome| {
                    let skipped = outcome.skipped().map(str::to_string).collect();
                    (outcome.document, skipped)
                })
        })
    }

    /// Generic read-modify-write. `transform` gets the current snapshot and
    /// returns the replacement plus the names of skipped fields.
    pub fn rewrite<F>(&self, transform: F) -> EditOutcome
    where
        F: FnOnce(&Document) -> Result<(Document, Vec<String>), PatternNotFound>,
    {
        let file = self.path.clone();
        let original = match fs::read_to_string(&self.path) {
            Ok(text) => Document::new(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return EditOutcome::NotFound { file };
            }
            Err(source) => return EditOutcome::IoError { file, source },
        };

        let (patched, skipped) = match transform(&original) {
            Ok(result) => result,
            Err(PatternNotFound { field }) => return EditOutcome::NoMatch { file, field },
        };

        if patched.digest() == original.digest() && patched == original {
            debug!("{} already up to date", self.path.display());
            return EditOutcome::Ok {
                file,
                changed: false,
                skipped,
                diff: None,
            };
        }

        let diff = self
            .options
            .dry_run
            .then(|| unified_diff(&self.path, original.text(), patched.text()));

        if let Err(source) = persist(&self.path, patched.text().as_bytes(), self.options) {
            return EditOutcome::IoError { file, source };
        }

        EditOutcome::Ok {
            file,
            changed: true,
            skipped,
            diff,
        }
    }
}

/// Write `content` to `path` honoring `options`: nothing happens on a dry run,
/// and a `.bak` copy of the old content is kept when requested.
pub(crate) fn persist(path: &Path, content: &[u8], options: EditOptions) -> io::Result<()> {
    if options.dry_run {
        debug!("dry run: skipping write to {}", path.display());
        return Ok(());
    }
    if options.backup && path.exists() {
        fs::copy(path, backup_path(path))?;
    }
    atomic_write(path, content)?;

    let now = filetime::FileTime::now();
    filetime::set_file_mtime(path, now)?;
    debug!("wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    path.with_file_name(name)
}

/// Unified diff between two versions of `path`.
pub fn unified_diff(path: &Path, before: &str, after: &str) -> String {
    let name = path.display().to_string();
    TextDiff::from_lines(before, after)
        .unified_diff()
        .context_radius(2)
        .header(&format!("a/{name}"), &format!("b/{name}"))
        .to_string()
}

/// Atomic file write: tempfile + fsync + rename.
///
/// Either the full write succeeds or nothing changes.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    // Tempfile in the same directory so the rename stays on one filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "path has no parent directory",
            ))
        }
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

pub(crate) fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{render_template, PatternRule};

    fn title_field(value: &str) -> FieldRule {
        FieldRule::new("title").candidate(
            PatternRule::new(
                "title",
                r"(<title>).*?(</title>)",
                render_template("${1}{value}${2}", value),
                true,
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_patch_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "<title>Old</title>").unwrap();

        let outcome = FileEditor::new(&path, EditOptions::default()).patch(&[title_field("New")]);
        assert_eq!(outcome.status(), EditStatus::Ok);
        assert_eq!(fs::read_to_string(&path).unwrap(), "<title>New</title>");
    }

    #[test]
    fn test_patch_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = FileEditor::new(dir.path().join("missing.html"), EditOptions::default())
            .patch(&[title_field("New")]);
        assert_eq!(outcome.status(), EditStatus::NotFound);
        assert!(matches!(
            outcome.into_result(),
            Err(StampError::MissingFile { names }) if names == vec!["missing.html".to_string()]
        ));
    }

    #[test]
    fn test_no_match_leaves_file_identical() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        let original = b"<h1>No title here</h1>\r\n";
        fs::write(&path, original).unwrap();

        let outcome = FileEditor::new(&path, EditOptions::default()).patch(&[title_field("New")]);
        assert_eq!(outcome.status(), EditStatus::NoMatch);
        assert_eq!(fs::read(&path).unwrap(), original);
    }

    #[test]
    fn test_unchanged_content_reports_not_changed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "<title>Same</title>").unwrap();

        match FileEditor::new(&path, EditOptions::default()).patch(&[title_field("Same")]) {
            EditOutcome::Ok { changed, .. } => assert!(!changed),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_dry_run_produces_diff_without_writing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "<title>Old</title>\n").unwrap();

        let options = EditOptions {
            dry_run: true,
            backup: false,
        };
        let applied = FileEditor::new(&path, options)
            .patch(&[title_field("New")])
            .into_result()
            .unwrap();
        let diff = applied.diff.unwrap();
        assert!(diff.contains("-<title>Old</title>"));
        assert!(diff.contains("+<title>New</title>"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "<title>Old</title>\n");
    }

    #[test]
    fn test_backup_keeps_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.html");
        fs::write(&path, "<title>Old</title>").unwrap();

        let options = EditOptions {
            dry_run: false,
            backup: true,
        };
        let _ = FileEditor::new(&path, options).patch(&[title_field("New")]);
        assert_eq!(
            fs::read_to_string(backup_path(&path)).unwrap(),
            "<title>Old</title>"
        );
        assert_eq!(fs::read_to_string(&path).unwrap(), "<title>New</title>");
    }

    #[test]
    fn test_invalid_utf8_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bin.html");
        fs::write(&path, [0xff, 0xfe, 0x00]).unwrap();

        let outcome = FileEditor::new(&path, EditOptions::default()).patch(&[title_field("x")]);
        assert_eq!(outcome.status(), EditStatus::IoError);
        assert_eq!(fs::read(&path).unwrap(), vec![0xff, 0xfe, 0x00]);
    }
}
