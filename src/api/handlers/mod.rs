mod admin;
mod pages;
mod static_files;

use chrono::SecondsFormat;
use serde::Serialize;

use crate::file_store::FileStore;
use crate::storage::models::FileRecord;

pub use admin::{delete_file, health, login, manage, upload_file, upload_form};
pub use pages::{index, list_category, search};
pub use static_files::serve_upload;

#[derive(Debug, Serialize)]
pub struct FileResponse {
    pub category: String,
    pub created_at: String,
    pub description: String,
    pub id: u64,
    pub location: String,
    pub name: String,
    /// Where a browser can fetch the file
    pub url: String,
}

fn file_to_response(store: &dyn FileStore, file: &FileRecord) -> FileResponse {
    FileResponse {
        category: file.category.clone(),
        created_at: file.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        description: file.description.clone(),
        id: file.id,
        location: file.location.clone(),
        name: file.name.clone(),
        url: store.public_url(&file.location),
    }
}

fn files_to_response(store: &dyn FileStore, files: &[FileRecord]) -> Vec<FileResponse> {
    files.iter().map(|f| file_to_response(store, f)).collect()
}
