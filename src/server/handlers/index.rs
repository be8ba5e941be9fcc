use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::{ApiError, Stage, StageError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct IndexRequest {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub text: String,
}

pub async fn index_document(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<IndexRequest>, JsonRejection>,
) -> Result<impl IntoResponse, StageError> {
    let Json(request) = payload.map_err(|e| ApiError::from(e).during(Stage::Index))?;

    let chunks = state
        .rag
        .index(&request.id, &request.text)
        .await
        .map_err(|e| e.during(Stage::Index))?;

    Ok(Json(json!({ "id": request.id, "chunks": chunks })))
}
