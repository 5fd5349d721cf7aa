//! Content hash of one source compilation

use std::fmt;
use std::path::Path;

use sha2::{Digest, Sha256};

/// `sha256:<hex>` digest keying a cache entry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHash(String);

impl ContentHash {
    pub const PREFIX: &'static str = "sha256:";

    /// Digest of raw text
    pub fn from_content(content: &str) -> Self {
        Self::digest([content.as_bytes()])
    }

    /// Digest of a source's contents, its cache key and the project config
    /// path, NUL-separated
    pub fn for_source(contents: &str, source_key: &str, config_path: Option<&Path>) -> Self {
        let config = config_path
            .map(|path| path.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::digest([contents.as_bytes(), source_key.as_bytes(), config.as_bytes()])
    }

    fn digest<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = Sha256::new();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                hasher.update([0u8]);
            }
            hasher.update(part);
        }
        Self(format!("{}{:x}", Self::PREFIX, hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Compare against a stored hash string
    pub fn matches_str(&self, stored: &str) -> bool {
        self.0 == stored
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
