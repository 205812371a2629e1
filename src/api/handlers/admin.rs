use axum::extract::{Multipart, Path, State};
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{files_to_response, FileResponse};
use crate::api::response::{ApiError, JSend, Session};
use crate::catalog::{UploadForm, UploadedFile};
use crate::storage::models::KNOWN_CATEGORIES;
use crate::AppState;

pub const MANAGE_PATH: &str = "/gerenciar";
pub const WRONG_PASSWORD: &str = "Senha Incorreta. Tente novamente.";
pub const ACCESS_DENIED: &str = "Acesso negado.";

// ============================================================================
// Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Management page: the login form when logged out, the full listing when in.
#[derive(Debug, Serialize)]
pub struct ManageResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<FileResponse>>,
}

#[derive(Debug, Serialize)]
pub struct UploadFormResponse {
    pub categories: [&'static str; 4],
    pub fields: [&'static str; 4],
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub senha: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> Json<JSend<HealthResponse>> {
    JSend::success(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn manage(
    State(state): State<Arc<AppState>>,
    Session(admin): Session,
) -> Result<Json<JSend<ManageResponse>>, ApiError> {
    if admin.is_none() {
        return Ok(JSend::success(ManageResponse {
            authenticated: false,
            files: None,
        }));
    }

    let files = state.catalog.list_files()?;
    Ok(JSend::success(ManageResponse {
        authenticated: true,
        files: Some(files_to_response(state.catalog.store().as_ref(), &files)),
    }))
}

/// Check the shared password. Success sets the session cookie and goes back
/// to the management page; failure answers in plain text.
pub async fn login(State(state): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    let password = form.senha.unwrap_or_default();
    if !state.admin.authenticate(&password) {
        tracing::info!("Rejected admin login");
        return WRONG_PASSWORD.into_response();
    }

    tracing::info!("Admin logged in");
    let cookie = state.admin.session_cookie();
    (
        AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
        Redirect::to(MANAGE_PATH),
    )
        .into_response()
}

pub async fn upload_form(
    Session(admin): Session,
) -> Result<Json<JSend<UploadFormResponse>>, ApiError> {
    if admin.is_none() {
        return Err(ApiError::Redirect(MANAGE_PATH));
    }

    Ok(JSend::success(UploadFormResponse {
        categories: KNOWN_CATEGORIES,
        fields: ["arquivo", "nome", "descricao", "categoria"],
    }))
}

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    Session(admin): Session,
    mut multipart: Multipart,
) -> Result<Redirect, ApiError> {
    let admin = admin.ok_or(ApiError::Redirect(MANAGE_PATH))?;

    let mut form = UploadForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart data: {e}")))?
    {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "arquivo" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(|s| s.to_string());

                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(format!("Failed to read file: {e}")))?;

                if data.len() as u64 > state.config.max_upload_size {
                    return Err(ApiError::payload_too_large(format!(
                        "File exceeds maximum upload size of {} bytes",
                        state.config.max_upload_size
                    )));
                }

                // Fall back to the extension when the browser sends no useful type
                let content_type = content_type
                    .filter(|ct| ct != "application/octet-stream")
                    .or_else(|| mime_guess::from_path(&file_name).first().map(|m| m.to_string()));

                form.file = Some(UploadedFile {
                    file_name,
                    content_type,
                    data,
                });
            }
            "nome" => form.name = Some(text_field(field, "nome").await?),
            "descricao" => form.description = Some(text_field(field, "descricao").await?),
            "categoria" => form.category = Some(text_field(field, "categoria").await?),
            _ => {
                // Ignore unknown fields
            }
        }
    }

    state.catalog.upload(&admin, form).await?;
    Ok(Redirect::to(MANAGE_PATH))
}

pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Session(admin): Session,
    Path(id): Path<String>,
) -> Result<Redirect, ApiError> {
    let admin = admin.ok_or_else(|| ApiError::forbidden(ACCESS_DENIED))?;

    let id: u64 = id
        .parse()
        .map_err(|_| ApiError::not_found("File not found"))?;

    state.catalog.delete(&admin, id).await?;

    Ok(Redirect::to(MANAGE_PATH))
}

// ============================================================================
// Helpers
// ============================================================================

async fn text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, ApiError> {
    field
        .text()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid {name}: {e}")))
}
