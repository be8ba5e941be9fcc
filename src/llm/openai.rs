use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{EmbeddingClient, GenerationClient};
use super::types::GenerationParams;
use crate::core::errors::ApiError;

pub const DEFAULT_BASE_URL: &str = "http://localhost:1234";

/// Client for OpenAI-compatible servers (LM Studio, llama.cpp server, vLLM).
#[derive(Clone)]
pub struct OpenAiCompatibleClient {
    base_url: String,
    api_key: Option<String>,
    embedding_model: String,
    generation_model: String,
    client: Client,
}

impl OpenAiCompatibleClient {
    pub fn new(
        client: Client,
        base_url: String,
        api_key: Option<String>,
        embedding_model: String,
        generation_model: String,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            embedding_model,
            generation_model,
            client,
        }
    }

    async fn post(&self, path: &str, body: &Value) -> Result<reqwest::Response, reqwest::Error> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.post(&url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        request.send().await
    }
}

fn chat_body(model: &str, prompt: &str, params: &GenerationParams) -> Value {
    json!({
        "model": model,
        "messages": [{ "role": "user", "content": prompt }],
        "stream": false,
        "temperature": params.temperature,
        "top_p": params.top_p,
        "top_k": params.top_k,
        "max_tokens": params.max_output_tokens,
    })
}

fn embedding_from_payload(payload: &Value) -> Vec<f32> {
    payload["data"][0]["embedding"]
        .as_array()
        .map(|vals| {
            vals.iter()
                .filter_map(|v| v.as_f64().map(|f| f as f32))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl EmbeddingClient for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let body = json!({
            "model": self.embedding_model,
            "input": text,
        });

        let res = self
            .post("/v1/embeddings", &body)
            .await
            .map_err(|err| ApiError::Embedding(err.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Embedding(format!(
                "embedding endpoint error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|err| ApiError::Embedding(err.to_string()))?;

        let embedding = embedding_from_payload(&payload);
        if embedding.is_empty() {
            return Err(ApiError::Embedding(
                "embedding endpoint returned no vector".to_string(),
            ));
        }
        Ok(embedding)
    }
}

#[async_trait]
impl GenerationClient for OpenAiCompatibleClient {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, ApiError> {
        let body = chat_body(&self.generation_model, prompt, params);

        let res = self
            .post("/v1/chat/completions", &body)
            .await
            .map_err(|err| ApiError::Generation(err.to_string()))?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Generation(format!(
                "chat endpoint error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res
            .json()
            .await
            .map_err(|err| ApiError::Generation(err.to_string()))?;

        let content = payload["choices"][0]["message"]["content"]
            .as_str()
            .unwrap_or_default()
            .to_string();

        Ok(content)
    }
}
