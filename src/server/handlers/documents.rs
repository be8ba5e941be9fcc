use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::core::errors::{Stage, StageError};
use crate::state::AppState;

pub async fn list_documents(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, StageError> {
    let documents = state.rag.documents().await.map_err(|e| e.during(Stage::Documents))?;
    Ok(Json(json!({ "documents": documents })))
}

pub async fn delete_document(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, StageError> {
    let deleted = state
        .rag
        .delete_document(&id)
        .await
        .map_err(|e| e.during(Stage::Documents))?;
    Ok(Json(json!({ "id": id, "deleted": deleted })))
}
