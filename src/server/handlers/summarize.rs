use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::core::errors::{ApiError, Stage, StageError};
use crate::llm::GenerationOverrides;
use crate::state::AppState;
use crate::summary::heuristic_summary;

#[derive(Debug, Deserialize)]
pub struct HeuristicRequest {
    #[serde(default)]
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub struct LlmSummaryRequest {
    #[serde(default)]
    pub text: String,
    #[serde(flatten)]
    pub overrides: GenerationOverrides,
}

pub async fn heuristic(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<HeuristicRequest>, JsonRejection>,
) -> Result<impl IntoResponse, StageError> {
    let Json(request) = payload.map_err(|e| ApiError::from(e).during(Stage::Summarize))?;
    let summary = heuristic_summary(&request.text, state.settings.summary.heuristic_sentences)
        .map_err(|e| e.during(Stage::Summarize))?;
    Ok(Json(json!({ "summary": summary })))
}

pub async fn llm(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LlmSummaryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, StageError> {
    let Json(request) = payload.map_err(|e| ApiError::from(e).during(Stage::Summarize))?;
    let params = request
        .overrides
        .apply(state.settings.generation.summary)
        .map_err(|e| e.during(Stage::Summarize))?;

    let summary = state
        .summarizer
        .summarize(&request.text, &params)
        .await
        .map_err(|e| {
            tracing::warn!("LLM summary failed: {}", e);
            e.during(Stage::Summarize)
        })?;
    Ok(Json(json!({ "summary": summary })))
}
