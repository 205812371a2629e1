use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{files_to_response, FileResponse};
use crate::api::response::{ApiError, AppQuery, JSend};
use crate::storage::models::{is_known_category, KNOWN_CATEGORIES};
use crate::AppState;

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct CategorySummary {
    pub category: &'static str,
    pub count: u64,
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct IndexResponse {
    pub categories: Vec<CategorySummary>,
    pub total: u64,
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: String,
    pub files: Vec<FileResponse>,
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub results: Vec<FileResponse>,
    pub term: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// Landing page: the browsable categories and how many files each holds.
pub async fn index(
    State(state): State<Arc<AppState>>,
) -> Result<Json<JSend<IndexResponse>>, ApiError> {
    let mut categories = Vec::with_capacity(KNOWN_CATEGORIES.len());
    for category in KNOWN_CATEGORIES {
        categories.push(CategorySummary {
            category,
            count: state.catalog.count_by_category(category)?,
            path: format!("/{category}"),
        });
    }

    let total = state.catalog.count_files()?;

    Ok(JSend::success(IndexResponse { categories, total }))
}

pub async fn list_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<JSend<CategoryResponse>>, ApiError> {
    if !is_known_category(&category) {
        return Err(ApiError::not_found("Página não encontrada"));
    }

    let files = state.catalog.list_by_category(&category)?;
    let files = files_to_response(state.catalog.store().as_ref(), &files);

    Ok(JSend::success(CategoryResponse { category, files }))
}

/// Substring search over name and description. No term, no results.
pub async fn search(
    State(state): State<Arc<AppState>>,
    AppQuery(params): AppQuery<SearchParams>,
) -> Result<Json<JSend<SearchResponse>>, ApiError> {
    let results = match params.q.as_deref() {
        Some(term) if !term.is_empty() => state.catalog.search(term)?,
        _ => Vec::new(),
    };

    Ok(JSend::success(SearchResponse {
        results: files_to_response(state.catalog.store().as_ref(), &results),
        term: params.q,
    }))
}
