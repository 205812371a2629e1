use async_trait::async_trait;
use bytes::Bytes;
use std::path::{Path, PathBuf};

use super::{is_safe_name, sanitize_filename, DeleteOutcome, FileStore, FileStoreError};

/// URL prefix under which the HTTP layer serves locally stored files.
pub const LOCAL_PUBLIC_PREFIX: &str = "/static/uploads";

/// Local filesystem store. Locations are bare filenames inside `base_path`.
pub struct LocalStore {
    base_path: PathBuf,
}

impl LocalStore {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self, std::io::Error> {
        let base_path = base_path.as_ref().to_path_buf();
        std::fs::create_dir_all(&base_path)?;
        Ok(Self { base_path })
    }

    fn object_path(&self, location: &str) -> Result<PathBuf, FileStoreError> {
        if !is_safe_name(location) {
            return Err(FileStoreError::InvalidLocation(location.to_string()));
        }
        Ok(self.base_path.join(location))
    }
}

#[async_trait]
impl FileStore for LocalStore {
    async fn put(
        &self,
        suggested_name: &str,
        _content_type: Option<&str>,
        data: Bytes,
    ) -> Result<String, FileStoreError> {
        let safe_name = sanitize_filename(suggested_name)
            .ok_or_else(|| FileStoreError::InvalidName(suggested_name.to_string()))?;
        let path = self.object_path(&safe_name)?;
        tokio::fs::write(&path, &data).await?;
        Ok(safe_name)
    }

    async fn get(&self, location: &str) -> Result<Bytes, FileStoreError> {
        let path = self.object_path(location)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(FileStoreError::NotFound(location.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, location: &str) -> Result<DeleteOutcome, FileStoreError> {
        let path = self.object_path(location)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(DeleteOutcome::Removed),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DeleteOutcome::AlreadyAbsent),
            Err(e) => Err(e.into()),
        }
    }

    async fn exists(&self, location: &str) -> Result<bool, FileStoreError> {
        let path = self.object_path(location)?;
        Ok(tokio::fs::try_exists(&path).await?)
    }

    fn public_url(&self, location: &str) -> String {
        format!("{LOCAL_PUBLIC_PREFIX}/{location}")
    }
}
