//! Shared test helpers: application state on temporary directories and
//! misbehaving file stores.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use crate::catalog::CatalogService;
use crate::config::{AdminConfig, Config, NodeConfig, StorageConfig};
use crate::file_store::{DeleteOutcome, FileStore, FileStoreError, LocalStore};
use crate::session::{AdminContext, AdminGate};
use crate::storage::Database;
use crate::AppState;

pub const TEST_PASSWORD: &str = "senha-de-teste";

pub fn test_config(temp_dir: &tempfile::TempDir) -> Config {
    let data_dir = temp_dir.path().join("data");
    let files_dir = temp_dir.path().join("uploads");

    Config {
        admin: AdminConfig {
            password: Some(TEST_PASSWORD.to_string()),
            secret_key: b"test-secret-key-test-secret-key!".to_vec(),
        },
        node: NodeConfig {
            bind_address: "127.0.0.1:0".to_string(),
            data_dir: data_dir.to_string_lossy().to_string(),
        },
        storage: StorageConfig {
            upload_folder: files_dir.to_string_lossy().to_string(),
            ..Default::default()
        },
        max_upload_size: 10 * 1024 * 1024, // 10MB for tests
    }
}

/// Create a test AppState with a temporary database and local file store.
pub fn test_state(temp_dir: &tempfile::TempDir) -> Arc<AppState> {
    let config = test_config(temp_dir);
    let store =
        LocalStore::new(&config.storage.upload_folder).expect("Failed to create test file store");
    test_state_with_store(temp_dir, Arc::new(store))
}

/// Same as [`test_state`] but with a caller-chosen file store.
pub fn test_state_with_store(
    temp_dir: &tempfile::TempDir,
    store: Arc<dyn FileStore>,
) -> Arc<AppState> {
    let config = test_config(temp_dir);
    let db = Database::open(&config.node.data_dir).expect("Failed to open test database");

    Arc::new(AppState {
        admin: AdminGate::new(&config.admin),
        catalog: CatalogService::new(db, store),
        config,
    })
}

/// An admin context obtained the same way a request would get one.
pub fn admin_context(state: &AppState) -> AdminContext {
    let token = state.admin.issue_token();
    state
        .admin
        .verify_token(&token)
        .expect("freshly issued token should verify")
}

/// Store whose backend rejects every write, e.g. bad credentials.
pub struct RejectingStore;

#[async_trait]
impl FileStore for RejectingStore {
    async fn put(
        &self,
        _suggested_name: &str,
        _content_type: Option<&str>,
        _data: Bytes,
    ) -> Result<String, FileStoreError> {
        Err(FileStoreError::Backend(
            "S3 upload failed (403 Forbidden): InvalidAccessKeyId".to_string(),
        ))
    }

    async fn get(&self, location: &str) -> Result<Bytes, FileStoreError> {
        Err(FileStoreError::NotFound(location.to_string()))
    }

    async fn delete(&self, _location: &str) -> Result<DeleteOutcome, FileStoreError> {
        Err(FileStoreError::Backend("S3 delete failed (403 Forbidden)".to_string()))
    }

    async fn exists(&self, _location: &str) -> Result<bool, FileStoreError> {
        Ok(false)
    }

    fn public_url(&self, location: &str) -> String {
        location.to_string()
    }
}
