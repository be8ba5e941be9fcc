use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::errors::{ApiError, Stage, StageError};
use crate::llm::GenerationOverrides;
use crate::rag::{QueryOptions, ScoredRecord};
use crate::state::AppState;

/// `topK` names the retrieval count; `modelTopK` is the sampling parameter.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    #[serde(default)]
    pub query: String,
    #[serde(alias = "topK")]
    pub limit: Option<i64>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub model_top_k: Option<i64>,
    pub max_output_tokens: Option<i64>,
}

impl QueryRequest {
    fn generation_overrides(&self) -> GenerationOverrides {
        GenerationOverrides {
            temperature: self.temperature,
            top_p: self.top_p,
            top_k: self.model_top_k,
            max_output_tokens: self.max_output_tokens,
        }
    }
}

/// A retrieved chunk as returned to clients, without its embedding.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchView<'a> {
    pub identifier: &'a str,
    pub parent_identifier: &'a str,
    pub text: &'a str,
    pub score: f32,
}

fn match_views(results: &[ScoredRecord]) -> Vec<MatchView<'_>> {
    results
        .iter()
        .map(|scored| MatchView {
            identifier: &scored.record.identifier,
            parent_identifier: &scored.record.parent_identifier,
            text: &scored.record.text,
            score: scored.score,
        })
        .collect()
}

fn resolve_limit(requested: Option<i64>, default_limit: usize) -> Result<usize, ApiError> {
    match requested {
        None => Ok(default_limit),
        Some(value) if value >= 1 => usize::try_from(value).map_err(|e| ApiError::invalid(e.to_string())),
        Some(value) => Err(ApiError::invalid(format!(
            "limit must be a positive integer, got {}",
            value
        ))),
    }
}

pub async fn query(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<impl IntoResponse, StageError> {
    let Json(request) = payload.map_err(|e| ApiError::from(e).during(Stage::Query))?;

    let limit = resolve_limit(request.limit, state.settings.rag.default_limit)
        .map_err(|e| e.during(Stage::Query))?;
    let generation = request
        .generation_overrides()
        .apply(state.settings.generation.query)
        .map_err(|e| e.during(Stage::Query))?;

    match state
        .rag
        .answer(&request.query, QueryOptions { limit, generation })
        .await
    {
        Ok(answer) => Ok(Json(json!({
            "answer": answer.answer,
            "results": match_views(&answer.results),
        }))),
        Err(failure) => {
            let mut error = failure.error.during(Stage::Query);
            if !failure.results.is_empty() {
                error = error.with_results(json!(match_views(&failure.results)));
            }
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn top_k_is_an_alias_for_the_retrieval_limit() {
        let request: QueryRequest =
            serde_json::from_str(r#"{"query":"notice?","topK":5,"modelTopK":12}"#).unwrap();
        assert_eq!(request.limit, Some(5));
        assert_eq!(request.generation_overrides().top_k, Some(12));
    }

    #[test]
    fn limit_defaults_and_rejects_non_positive_values() {
        assert_eq!(resolve_limit(None, 3).unwrap(), 3);
        assert_eq!(resolve_limit(Some(7), 3).unwrap(), 7);
        assert!(matches!(resolve_limit(Some(0), 3), Err(ApiError::InvalidArgument(_))));
        assert!(matches!(resolve_limit(Some(-2), 3), Err(ApiError::InvalidArgument(_))));
    }
}
