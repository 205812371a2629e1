use async_trait::async_trait;
use bytes::Bytes;
use s3::creds::Credentials;
use s3::{Bucket, Region};
use tracing::debug;

use super::{is_safe_name, sanitize_filename, DeleteOutcome, FileStore, FileStoreError};
use crate::config::S3Config;

/// Amazon S3 store.
///
/// Locations are public object URLs of the form
/// `https://{bucket}.s3.{region}.amazonaws.com/{safe_name}`, whichever
/// endpoint the requests actually go to.
pub struct S3Store {
    bucket: Box<Bucket>,
    public_base: String,
}

impl S3Store {
    pub fn new(config: &S3Config) -> Result<Self, FileStoreError> {
        let credentials = Credentials::new(
            Some(&config.access_key_id),
            Some(&config.secret_access_key),
            None,
            None,
            None,
        )
        .map_err(|e| FileStoreError::Backend(format!("Invalid S3 credentials: {e}")))?;

        let endpoint = match config.endpoint {
            Some(ref endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://s3.{}.amazonaws.com", config.region),
        };
        let region = Region::Custom {
            region: config.region.clone(),
            endpoint,
        };

        let mut bucket = Bucket::new(&config.bucket, region, credentials)
            .map_err(|e| FileStoreError::Backend(format!("Failed to create S3 bucket: {e}")))?;

        // S3-compatible servers are addressed as http://endpoint/bucket
        if config.endpoint.is_some() {
            bucket.set_path_style();
        }

        Ok(Self {
            bucket,
            public_base: format!("https://{}.s3.{}.amazonaws.com", config.bucket, config.region),
        })
    }

    fn public_base(&self) -> &str {
        &self.public_base
    }

    /// Recover the object key from a location previously returned by `put`.
    fn key_from_location<'a>(&self, location: &'a str) -> Result<&'a str, FileStoreError> {
        let key = location
            .strip_prefix(self.public_base())
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| FileStoreError::InvalidLocation(location.to_string()))?;

        if !is_safe_name(key) {
            return Err(FileStoreError::InvalidLocation(location.to_string()));
        }
        Ok(key)
    }
}

#[async_trait]
impl FileStore for S3Store {
    async fn put(
        &self,
        suggested_name: &str,
        content_type: Option<&str>,
        data: Bytes,
    ) -> Result<String, FileStoreError> {
        let safe_name = sanitize_filename(suggested_name)
            .ok_or_else(|| FileStoreError::InvalidName(suggested_name.to_string()))?;
        let content_type = content_type.unwrap_or("application/octet-stream");

        let response = self
            .bucket
            .put_object_with_content_type(&safe_name, &data, content_type)
            .await
            .map_err(|e| FileStoreError::Backend(format!("S3 upload failed: {e}")))?;

        let status = response.status_code();
        if !is_success(status) {
            return Err(status_error("upload", status, &response.to_vec()));
        }

        debug!("Uploaded '{}' to bucket '{}'", safe_name, self.bucket.name());
        Ok(format!("{}/{safe_name}", self.public_base()))
    }

    async fn get(&self, location: &str) -> Result<Bytes, FileStoreError> {
        let key = self.key_from_location(location)?;
        let response = self
            .bucket
            .get_object(key)
            .await
            .map_err(|e| FileStoreError::Backend(format!("S3 download failed: {e}")))?;

        match response.status_code() {
            404 => Err(FileStoreError::NotFound(location.to_string())),
            status if is_success(status) => Ok(Bytes::from(response.to_vec())),
            status => Err(status_error("download", status, &response.to_vec())),
        }
    }

    /// S3 answers a delete of a missing key with 204, so a missing object is
    /// only reported as `AlreadyAbsent` by servers that answer 404.
    async fn delete(&self, location: &str) -> Result<DeleteOutcome, FileStoreError> {
        let key = self.key_from_location(location)?;
        let response = self
            .bucket
            .delete_object(key)
            .await
            .map_err(|e| FileStoreError::Backend(format!("S3 delete failed: {e}")))?;

        match response.status_code() {
            404 => Ok(DeleteOutcome::AlreadyAbsent),
            status if is_success(status) => {
                debug!("Deleted '{}' from bucket '{}'", key, self.bucket.name());
                Ok(DeleteOutcome::Removed)
            }
            status => Err(status_error("delete", status, &response.to_vec())),
        }
    }

    async fn exists(&self, location: &str) -> Result<bool, FileStoreError> {
        let key = self.key_from_location(location)?;
        let (_, status) = self
            .bucket
            .head_object(key)
            .await
            .map_err(|e| FileStoreError::Backend(format!("S3 head failed: {e}")))?;

        match status {
            404 => Ok(false),
            status if is_success(status) => Ok(true),
            status => Err(status_error("head", status, &[])),
        }
    }

    fn public_url(&self, location: &str) -> String {
        location.to_string()
    }
}

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn status_error(action: &str, status: u16, body: &[u8]) -> FileStoreError {
    FileStoreError::Backend(format!(
        "S3 {action} failed ({status}): {}",
        String::from_utf8_lossy(body)
    ))
}
