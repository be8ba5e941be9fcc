use std::fmt;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::extract::rejection::JsonRejection;
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("embedding failed: {0}")]
    Embedding(String),
    #[error("generation failed: {0}")]
    Generation(String),
    #[error("storage failed: {0}")]
    Storage(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn internal<E: fmt::Display>(err: E) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn storage<E: fmt::Display>(err: E) -> Self {
        ApiError::Storage(err.to_string())
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::InvalidArgument(message.into())
    }

    /// Machine-readable error kind used in response bodies.
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::InvalidArgument(_) => "invalid_argument",
            ApiError::NotFound(_) => "not_found",
            ApiError::Embedding(_) => "embedding_failure",
            ApiError::Generation(_) => "generation_failure",
            ApiError::Storage(_) => "storage_failure",
            ApiError::Internal(_) => "internal",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Embedding(_) | ApiError::Generation(_) => StatusCode::BAD_GATEWAY,
            ApiError::Storage(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Attaches the request stage that failed.
    pub fn during(self, stage: Stage) -> StageError {
        StageError {
            stage,
            error: self,
            results: None,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidArgument(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::InvalidArgument(rejection.body_text())
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::InvalidArgument(err.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let body = Json(json!({ "error": self.to_string(), "kind": self.kind() }));
        (self.status(), body).into_response()
    }
}

/// The user-facing operation a request was performing when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Summarize,
    Index,
    Query,
    Documents,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Upload => "upload",
            Stage::Summarize => "summarize",
            Stage::Index => "index",
            Stage::Query => "query",
            Stage::Documents => "documents",
        };
        f.write_str(name)
    }
}

#[derive(Debug)]
pub struct StageError {
    pub stage: Stage,
    pub error: ApiError,
    pub results: Option<Value>,
}

impl StageError {
    pub fn with_results(mut self, results: Value) -> Self {
        self.results = Some(results);
        self
    }
}

impl IntoResponse for StageError {
    fn into_response(self) -> axum::response::Response {
        let status = self.error.status();
        let mut body = json!({
            "error": format!("{} failed", self.stage),
            "kind": self.error.kind(),
            "details": self.error.to_string(),
        });
        if let (Some(results), Some(map)) = (self.results, body.as_object_mut()) {
            map.insert("results".to_string(), results);
        }
        (status, Json(body)).into_response()
    }
}
