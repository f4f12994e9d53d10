//! Image upload proxy.
//!
//! The content form posts the picked file here; it is forwarded to the
//! backend with the staff member's session and the public URL comes back as
//! JSON for the form's image field.

use axum::{
    Json,
    extract::{Multipart, State},
};
use serde::Serialize;
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::middleware::RequireAdminAuth;
use crate::state::AppState;

/// Image types the storefront can display.
pub const ALLOWED_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp", "image/gif"];

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Check the declared type of an uploaded file.
///
/// # Errors
///
/// Returns `AppError::BadRequest` for anything but the allowed image types.
pub fn check_type(content_type: Option<&str>) -> Result<&'static str> {
    let declared = content_type.unwrap_or_default();
    ALLOWED_TYPES
        .iter()
        .find(|t| declared.eq_ignore_ascii_case(t))
        .copied()
        .ok_or_else(|| AppError::BadRequest("Solo se permiten imágenes JPG, PNG, WebP o GIF".into()))
}

#[instrument(skip(admin, state, multipart))]
pub async fn upload(
    RequireAdminAuth(admin): RequireAdminAuth,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let content_type = check_type(field.content_type())?;
        let file_name = field.file_name().unwrap_or("imagen").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?;
        if bytes.is_empty() {
            return Err(AppError::BadRequest("El archivo está vacío".into()));
        }

        tracing::info!(file_name = %file_name, size = bytes.len(), "Uploading image");
        let url = state
            .api()
            .as_user(&admin.backend)
            .upload(&file_name, content_type, bytes.to_vec())
            .await?;
        return Ok(Json(UploadResponse { url }));
    }

    Err(AppError::BadRequest("Falta el archivo".into()))
}
