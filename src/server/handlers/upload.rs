use std::path::Path;

use axum::extract::multipart::MultipartRejection;
use axum::extract::Multipart;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::{ApiError, Stage, StageError};

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "markdown"];

/// Accepts a plain-text document in the `file` field and returns its text.
pub async fn upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, StageError> {
    read_upload(multipart).await.map_err(|e| {
        tracing::warn!("Upload rejected: {}", e);
        e.during(Stage::Upload)
    })
}

async fn read_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.txt").to_string();
        let content_type = field.content_type().map(str::to_string);
        if !is_text_document(&filename, content_type.as_deref()) {
            return Err(ApiError::invalid(format!(
                "unsupported file type for {}; upload .txt or .md",
                filename
            )));
        }

        let bytes = field.bytes().await?;
        let text = String::from_utf8(bytes.to_vec())
            .map_err(|_| ApiError::invalid(format!("{} is not valid UTF-8 text", filename)))?;
        if text.trim().is_empty() {
            return Err(ApiError::invalid(format!("{} is empty", filename)));
        }

        let characters = text.chars().count();
        tracing::info!(filename = %filename, characters, "Document uploaded");
        return Ok(Json(json!({
            "filename": filename,
            "text": text,
            "characters": characters,
        })));
    }

    Err(ApiError::invalid("multipart field `file` is required"))
}

fn is_text_document(filename: &str, content_type: Option<&str>) -> bool {
    let by_extension = Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            TEXT_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
        .unwrap_or(false);
    let by_mime = content_type
        .map(|mime| mime.trim().to_ascii_lowercase().starts_with("text/"))
        .unwrap_or(false);
    by_extension || by_mime
}
