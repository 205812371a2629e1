//! Catalog repository: file metadata records in an embedded redb database.

pub mod db;
mod files;
pub mod models;
mod tables;

pub use db::{Database, DatabaseError};
pub use tables::*;
