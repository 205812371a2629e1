//! materials-catalog - A small catalog of educational materials
//!
//! Visitors browse files by category and search by name or description; an
//! administrator holding the shared password uploads and deletes files.
//! - Swappable file storage backends (local filesystem, Amazon S3)
//! - redb embedded database for the catalog records
//! - Signed session cookies for the admin gate
//! - HTTP API with multipart upload support

pub mod api;
pub mod catalog;
pub mod config;
pub mod file_store;
pub mod session;
pub mod storage;
#[cfg(test)]
pub mod testutil;

use catalog::CatalogService;
use config::Config;
use session::AdminGate;

/// Shared application state
pub struct AppState {
    pub config: Config,
    pub admin: AdminGate,
    pub catalog: CatalogService,
}
