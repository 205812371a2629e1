use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use cookie::Cookie;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::catalog::CatalogError;
use crate::file_store::FileStoreError;
use crate::session::{AdminContext, SESSION_COOKIE};
use crate::AppState;

// ============================================================================
// JSend success envelope
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JSendStatus {
    Success,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct JSend<T: Serialize> {
    pub data: T,
    pub status: JSendStatus,
}

impl<T: Serialize> JSend<T> {
    pub fn success(data: T) -> Json<JSend<T>> {
        Json(JSend {
            data,
            status: JSendStatus::Success,
        })
    }
}

// ============================================================================
// Unified error type for handlers
// ============================================================================

/// Handler error. Rendered as a plain-text body, or as a redirect.
#[derive(Debug)]
pub enum ApiError {
    Text(StatusCode, String),
    Redirect(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Text(code, msg) => (code, msg).into_response(),
            ApiError::Redirect(to) => Redirect::to(to).into_response(),
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Text(StatusCode::BAD_REQUEST, message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Text(StatusCode::FORBIDDEN, message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::Text(StatusCode::NOT_FOUND, message.into())
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::Text(StatusCode::PAYLOAD_TOO_LARGE, message.into())
    }

    pub fn bad_gateway(message: impl Into<String>) -> Self {
        ApiError::Text(StatusCode::BAD_GATEWAY, message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Text(StatusCode::INTERNAL_SERVER_ERROR, message.into())
    }
}

impl From<CatalogError> for ApiError {
    fn from(e: CatalogError) -> Self {
        match e {
            CatalogError::Validation(msg) => ApiError::bad_request(msg),
            CatalogError::NotFound(_) => ApiError::not_found(e.to_string()),
            CatalogError::Storage(ref store_error) => match store_error {
                FileStoreError::InvalidName(_) | FileStoreError::InvalidLocation(_) => {
                    ApiError::bad_request(e.to_string())
                }
                FileStoreError::NotFound(_) => ApiError::not_found(e.to_string()),
                FileStoreError::Backend(_) => ApiError::bad_gateway(e.to_string()),
                FileStoreError::Io(_) => ApiError::internal(e.to_string()),
            },
            CatalogError::Database(_) => ApiError::internal(e.to_string()),
        }
    }
}

// ============================================================================
// Custom extractors
// ============================================================================

/// `axum::extract::Query` replacement that rejects with a plain-text `ApiError`.
pub struct AppQuery<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequestParts<S> for AppQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, ApiError> {
        let query = parts.uri.query().unwrap_or_default();
        serde_qs::from_str(query)
            .map(AppQuery)
            .map_err(|e| ApiError::bad_request(format!("Invalid query parameter: {e}")))
    }
}

/// The caller's admin session, if the request carries a valid session cookie.
pub struct Session(pub Option<AdminContext>);

#[axum::async_trait]
impl FromRequestParts<Arc<AppState>> for Session {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let admin = parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| Cookie::split_parse(value))
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == SESSION_COOKIE)
            .and_then(|cookie| state.admin.verify_token(cookie.value()));

        Ok(Session(admin))
    }
}
