mod local;
mod s3;

pub use local::{LocalStore, LOCAL_PUBLIC_PREFIX};
pub use s3::S3Store;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;

#[derive(Debug, Error)]
pub enum FileStoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Object not found: {0}")]
    NotFound(String),
    #[error("Invalid file name: {0:?}")]
    InvalidName(String),
    #[error("Location is not managed by this store: {0}")]
    InvalidLocation(String),
    #[error("Backend error: {0}")]
    Backend(String),
}

/// Result of removing a stored object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Removed,
    /// Nothing was stored at the location. Not an error for callers.
    AlreadyAbsent,
}

/// Abstraction over file storage backends.
///
/// `put` returns a location string which is persisted in the catalog and later
/// handed back to `get`/`delete`. Locations are relative filenames for the
/// local backend and absolute URLs for S3.
#[async_trait]
pub trait FileStore: Send + Sync {
    async fn put(
        &self,
        suggested_name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<String, FileStoreError>;
    async fn get(&self, location: &str) -> Result<Bytes, FileStoreError>;
    async fn delete(&self, location: &str) -> Result<DeleteOutcome, FileStoreError>;
    async fn exists(&self, location: &str) -> Result<bool, FileStoreError>;
    /// URL a browser can use to download the object.
    fn public_url(&self, location: &str) -> String;
}

/// Reduce a client-supplied filename to a storage-safe identifier.
///
/// The name is NFKD-decomposed so accented letters keep their base letter.
/// Path separators and whitespace split it into words joined by `_`;
/// anything outside `[A-Za-z0-9._-]` is dropped, and leading/trailing `.` and
/// `_` are trimmed so the result can never be `..` or a hidden file.
/// Returns `None` when nothing usable is left.
pub fn sanitize_filename(name: &str) -> Option<String> {
    let decomposed: String = name.nfkd().collect();
    let words: Vec<String> = decomposed
        .split(|c: char| c.is_whitespace() || c == '/' || c == '\\')
        .map(|word| {
            word.chars()
                .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .collect();

    let joined = words.join("_");
    let trimmed = joined.trim_matches(|c: char| c == '.' || c == '_');

    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// A location is only accepted back if it is already in sanitized form.
fn is_safe_name(name: &str) -> bool {
    sanitize_filename(name).as_deref() == Some(name)
}
