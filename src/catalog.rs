//! Upload and delete orchestration over the file store and the catalog
//! database.
//!
//! An upload moves through `received -> file stored -> metadata committed`.
//! Validation happens before any bytes are written, and a record is only
//! created after the store has accepted the file, so a failed upload never
//! leaves a record behind.

use std::sync::Arc;

use bytes::Bytes;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::file_store::{sanitize_filename, DeleteOutcome, FileStore, FileStoreError};
use crate::session::AdminContext;
use crate::storage::models::{
    FileRecord, NewFileRecord, MAX_CATEGORY_LEN, MAX_DESCRIPTION_LEN, MAX_LOCATION_LEN,
    MAX_NAME_LEN,
};
use crate::storage::{Database, DatabaseError};

pub const NO_FILE_SENT: &str = "Nenhum arquivo enviado";
pub const NO_FILE_SELECTED: &str = "Nenhum arquivo selecionado";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Storage(#[from] FileStoreError),
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
    #[error("File {0} not found")]
    NotFound(u64),
}

/// The file part of an upload form.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Raw upload form. Every part is optional here; `CatalogService::upload`
/// decides what is missing.
#[derive(Debug, Clone, Default)]
pub struct UploadForm {
    pub file: Option<UploadedFile>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
}

pub struct CatalogService {
    db: Database,
    store: Arc<dyn FileStore>,
}

impl CatalogService {
    pub fn new(db: Database, store: Arc<dyn FileStore>) -> Self {
        Self { db, store }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn store(&self) -> &Arc<dyn FileStore> {
        &self.store
    }

    /// Store the uploaded file, then record it in the catalog.
    pub async fn upload(
        &self,
        _admin: &AdminContext,
        form: UploadForm,
    ) -> Result<FileRecord, CatalogError> {
        let file = form
            .file
            .ok_or_else(|| CatalogError::Validation(NO_FILE_SENT.to_string()))?;
        if file.file_name.is_empty() {
            return Err(CatalogError::Validation(NO_FILE_SELECTED.to_string()));
        }

        let name = required_field("nome", form.name, MAX_NAME_LEN)?;
        let description = required_field("descricao", form.description, MAX_DESCRIPTION_LEN)?;
        let category = required_field("categoria", form.category, MAX_CATEGORY_LEN)?;
        if name.trim().is_empty() {
            return Err(CatalogError::Validation(
                "O campo nome não pode ficar vazio".to_string(),
            ));
        }
        if category.trim().is_empty() {
            return Err(CatalogError::Validation(
                "O campo categoria não pode ficar vazio".to_string(),
            ));
        }

        if let Some(safe_name) = sanitize_filename(&file.file_name) {
            if safe_name.chars().count() > MAX_LOCATION_LEN {
                return Err(CatalogError::Validation(format!(
                    "O nome do arquivo excede {MAX_LOCATION_LEN} caracteres"
                )));
            }
        }

        // Phase 1: bytes to the file store
        let location = self
            .store
            .put(&file.file_name, file.content_type.as_deref(), file.data)
            .await?;

        match self.db.find_by_location(&location) {
            Ok(existing) if !existing.is_empty() => {
                let ids: Vec<u64> = existing.iter().map(|f| f.id).collect();
                warn!(
                    location = %location,
                    ?ids,
                    "Upload replaced a stored file that other records point to"
                );
            }
            Ok(_) => {}
            Err(e) => warn!(location = %location, error = %e, "Could not check for shared location"),
        }

        // Phase 2: metadata
        let record = NewFileRecord {
            name,
            description,
            location: location.clone(),
            category,
        };
        let file = match self.db.create_file(record) {
            Ok(file) => file,
            Err(e) => {
                self.discard(&location).await;
                return Err(e.into());
            }
        };

        info!(
            file_id = file.id,
            location = %file.location,
            category = %file.category,
            "Uploaded file"
        );
        Ok(file)
    }

    /// Remove the stored object, then the record.
    ///
    /// The object is kept while another record still points at it. A stored
    /// object that is already gone only produces a warning. Any other store
    /// failure aborts the delete and leaves the record in place. If the record
    /// delete fails after the object was removed, the record is left pointing
    /// at nothing; this is logged and reported.
    pub async fn delete(&self, _admin: &AdminContext, id: u64) -> Result<FileRecord, CatalogError> {
        let file = self.db.get_file(id)?.ok_or(CatalogError::NotFound(id))?;

        let shared = self
            .db
            .find_by_location(&file.location)?
            .iter()
            .any(|other| other.id != id);

        if shared {
            info!(file_id = id, location = %file.location, "Stored file still in use, keeping it");
        } else {
            self.delete_stored(id, &file.location).await?;
        }

        match self.db.delete_file(id) {
            Ok(true) => {}
            // Raced with another delete of the same record.
            Ok(false) => return Err(CatalogError::NotFound(id)),
            Err(e) => {
                error!(
                    file_id = id,
                    location = %file.location,
                    error = %e,
                    "Stored file removed but record delete failed"
                );
                return Err(e.into());
            }
        }

        info!(file_id = id, location = %file.location, "Deleted file");
        Ok(file)
    }

    pub fn list_by_category(&self, category: &str) -> Result<Vec<FileRecord>, CatalogError> {
        Ok(self.db.list_by_category(category)?)
    }

    pub fn list_files(&self) -> Result<Vec<FileRecord>, CatalogError> {
        Ok(self.db.list_files()?)
    }

    pub fn search(&self, term: &str) -> Result<Vec<FileRecord>, CatalogError> {
        Ok(self.db.search(term)?)
    }

    pub fn get(&self, id: u64) -> Result<FileRecord, CatalogError> {
        self.db.get_file(id)?.ok_or(CatalogError::NotFound(id))
    }

    pub fn count_files(&self) -> Result<u64, CatalogError> {
        Ok(self.db.count_files()?)
    }

    pub fn count_by_category(&self, category: &str) -> Result<u64, CatalogError> {
        Ok(self.db.count_by_category(category)?)
    }

    async fn delete_stored(&self, id: u64, location: &str) -> Result<(), CatalogError> {
        match self.store.delete(location).await {
            Ok(DeleteOutcome::Removed) => Ok(()),
            Ok(DeleteOutcome::AlreadyAbsent) | Err(FileStoreError::NotFound(_)) => {
                warn!(file_id = id, location = %location, "Stored file was already missing");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Best-effort removal of an object whose record was never written.
    async fn discard(&self, location: &str) {
        if let Err(e) = self.store.delete(location).await {
            error!(location = %location, error = %e, "Failed to remove orphaned upload");
        }
    }
}

fn required_field(
    field: &'static str,
    value: Option<String>,
    max_len: usize,
) -> Result<String, CatalogError> {
    let value = value
        .ok_or_else(|| CatalogError::Validation(format!("Campo obrigatório ausente: {field}")))?;
    if value.chars().count() > max_len {
        return Err(CatalogError::Validation(format!(
            "O campo {field} excede {max_len} caracteres"
        )));
    }
    Ok(value)
}
