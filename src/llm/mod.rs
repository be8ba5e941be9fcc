pub mod gemini;
pub mod openai;
pub mod provider;
pub mod types;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

pub use gemini::GeminiClient;
pub use openai::OpenAiCompatibleClient;
pub use provider::{EmbeddingClient, GenerationClient};
pub use types::{GenerationOverrides, GenerationParams};

use crate::core::config::settings::{LlmConfig, LlmProvider};
use crate::core::errors::ApiError;

/// Embedding and generation clients built from one provider configuration.
#[derive(Clone)]
pub struct LlmClients {
    pub embedder: Arc<dyn EmbeddingClient>,
    pub generator: Arc<dyn GenerationClient>,
}

pub fn build_clients(config: &LlmConfig) -> Result<LlmClients, ApiError> {
    let client = Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(ApiError::internal)?;

    match config.provider {
        LlmProvider::Gemini => {
            if config.api_key.is_none() {
                tracing::warn!("No Gemini API key configured; embedding and generation calls will fail");
            }
            let gemini = Arc::new(GeminiClient::new(
                client,
                config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| gemini::DEFAULT_BASE_URL.to_string()),
                config.api_key.clone(),
                config.embedding_model.clone(),
                config.generation_model.clone(),
            ));
            Ok(LlmClients {
                embedder: gemini.clone(),
                generator: gemini,
            })
        }
        LlmProvider::OpenAiCompatible => {
            let openai = Arc::new(OpenAiCompatibleClient::new(
                client,
                config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| openai::DEFAULT_BASE_URL.to_string()),
                config.api_key.clone(),
                config.embedding_model.clone(),
                config.generation_model.clone(),
            ));
            Ok(LlmClients {
                embedder: openai.clone(),
                generator: openai,
            })
        }
    }
}
