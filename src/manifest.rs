//! Structured manifest (`package.json`) updates.
//!
//! A [`FieldSet`] names leaves by dotted path. Merging walks the parsed tree,
//! creates intermediate objects on demand and overwrites only the named
//! leaves; everything else round-trips untouched (key order included, via
//! `serde_json`'s `preserve_order`).

use crate::edit::{persist, unified_diff, EditOptions};
use crate::error::StampError;
use log::{debug, warn};
use serde_json::{Map, Value};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Ordered dotted-path updates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldSet {
    entries: Vec<(String, Value)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the value for `path` (e.g. `build.win.icon`).
    pub fn set(mut self, path: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(path, value);
        self
    }

    pub fn insert(&mut self, path: impl Into<String>, value: impl Into<Value>) {
        let path = path.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((path, value)),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        self.entries.iter().find(|(p, _)| p == path).map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(p, v)| (p.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Merge `fields` into `root` in order.
///
/// A non-object value sitting where an intermediate object is needed is
/// replaced by an empty object; a non-object root is replaced the same way.
pub fn merge_fields(root: &mut Value, fields: &FieldSet) {
    for (path, value) in fields.iter() {
        set_path(root, path, value.clone());
    }
}

fn set_path(root: &mut Value, path: &str, value: Value) {
    let mut segments: Vec<&str> = path.split('.').filter(|s| !s.is_empty()).collect();
    let Some(leaf) = segments.pop() else {
        return;
    };

    let mut node = root;
    for segment in segments {
        node = ensure_object(node)
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
    ensure_object(node).insert(leaf.to_string(), value);
}

fn ensure_object(node: &mut Value) -> &mut Map<String, Value> {
    if !node.is_object() {
        *node = Value::Object(Map::new());
    }
    match node {
        Value::Object(map) => map,
        _ => unreachable!("node was just replaced with an object"),
    }
}

/// The manifest `npm init -y` would produce for a directory named `name`.
pub fn default_manifest(name: &str) -> Value {
    serde_json::json!({
        "name": package_name(name),
        "version": "1.0.0",
        "description": "",
        "main": "index.js",
        "scripts": {
            "test": "echo \"Error: no test specified\" && exit 1"
        },
        "keywords": [],
        "author": "",
        "license": "ISC"
    })
}

/// npm package names are lowercase with no spaces.
fn package_name(dir_name: &str) -> String {
    let name: String = dir_name
        .trim()
        .chars()
        .map(|c| match c {
            c if c.is_ascii_alphanumeric() => c.to_ascii_lowercase(),
            '-' | '_' | '.' => c,
            _ => '-',
        })
        .collect();
    let name = name.trim_matches(|c| c == '.' || c == '_').to_string();
    if name.is_empty() {
        "app".to_string()
    } else {
        name
    }
}

pub fn to_manifest_string(value: &Value) -> String {
    // to_string_pretty only fails on non-string map keys, which Value cannot hold
    let mut text = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    text.push('\n');
    text
}

/// What [`ManifestUpdater::update`] did.
#[derive(Debug)]
pub struct ManifestReport {
    pub path: PathBuf,
    /// Set when the manifest was missing or malformed and a default was used.
    pub repaired: Option<StampError>,
    pub changed: bool,
    pub diff: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ManifestUpdater {
    path: PathBuf,
    options: EditOptions,
}

impl ManifestUpdater {
    pub fn new(path: impl Into<PathBuf>, options: EditOptions) -> Self {
        Self {
            path: path.into(),
            options,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the manifest, repairing it if needed.
    ///
    /// Returns the tree, the original text (if any) and the repair note.
    pub fn load(&self) -> Result<(Value, Option<String>, Option<StampError>), StampError> {
        let original = match fs::read_to_string(&self.path) {
            Ok(text) => Some(text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) if e.kind() == io::ErrorKind::InvalidData => {
                warn!("{} is not UTF-8; starting from a default manifest", self.path.display());
                return Ok((
                    self.default_value(),
                    None,
                    Some(self.malformed("not valid UTF-8".to_string())),
                ));
            }
            Err(source) => return Err(StampError::io(&self.path, source)),
        };

        let Some(text) = original else {
            debug!("{} missing; using default manifest", self.path.display());
            return Ok((
                self.default_value(),
                None,
                Some(self.malformed("file not found".to_string())),
            ));
        };

        match serde_json::from_str::<Value>(&text) {
            Ok(value) if value.is_object() => Ok((value, Some(text), None)),
            Ok(_) => Ok((
                self.default_value(),
                Some(text),
                Some(self.malformed("top-level value is not an object".to_string())),
            )),
            Err(e) => {
                warn!("{} is malformed: {}", self.path.display(), e);
                Ok((self.default_value(), Some(text), Some(self.malformed(e.to_string()))))
            }
        }
    }

    /// Merge `fields` and write the manifest back.
    ///
    /// Only an I/O failure while reading an existing file or writing the
    /// result is an error; corruption is repaired.
    pub fn update(&self, fields: &FieldSet) -> Result<ManifestReport, StampError> {
        let (mut value, original, repaired) = self.load()?;
        merge_fields(&mut value, fields);
        let rendered = to_manifest_string(&value);

        let changed = original.as_deref() != Some(rendered.as_str());
        let diff = (self.options.dry_run && changed).then(|| {
            unified_diff(&self.path, original.as_deref().unwrap_or(""), &rendered)
        });

        if changed {
            persist(&self.path, rendered.as_bytes(), self.options)
                .map_err(|source| StampError::io(&self.path, source))?;
        }

        Ok(ManifestReport {
            path: self.path.clone(),
            repaired,
            changed,
            diff,
        })
    }

    fn default_value(&self) -> Value {
        let dir_name = self
            .path
            .parent()
            .and_then(Path::file_name)
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        default_manifest(&dir_name)
    }

    fn malformed(&self, reason: String) -> StampError {
        StampError::MalformedStructuredData {
            path: self.path.clone(),
            reason,
        }
    }
}
