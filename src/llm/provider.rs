use async_trait::async_trait;

use super::types::GenerationParams;
use crate::core::errors::ApiError;

/// Turns text into a fixed-length vector.
///
/// Implementations make a single attempt per call and report any transport or
/// API failure as `ApiError::Embedding`.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// return the provider name (e.g. "gemini", "openai_compatible")
    fn name(&self) -> &str;

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError>;
}

/// Turns a prompt into a text completion.
///
/// Failures are reported as `ApiError::Generation`. A response without any
/// candidate text yields an empty string rather than an error.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, ApiError>;
}
