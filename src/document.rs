use std::fmt;
use std::sync::Arc;
use xxhash_rust::xxh3::xxh3_64;

/// Immutable snapshot of a text asset.
///
/// Transformations return a new `Document`; the source snapshot is never
/// touched, so a failed patch can always fall back to the original text.
#[derive(Clone, PartialEq, Eq)]
pub struct Document {
    text: Arc<str>,
}

impl Document {
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self { text: text.into() }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Produce a new snapshot with `text`, leaving `self` as it was.
    pub fn with_text(&self, text: impl Into<Arc<str>>) -> Self {
        Self::new(text)
    }

    /// xxh3 digest of the content, used to detect no-op patches.
    pub fn digest(&self) -> u64 {
        xxh3_64(self.text.as_bytes())
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("len", &self.text.len())
            .field("digest", &format_args!("{:016x}", self.digest()))
            .finish()
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self::new(text)
    }
}

impl From<String> for Document {
    fn from(text: String) -> Self {
        Self::new(text)
    }
}
