use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use super::provider::{EmbeddingClient, GenerationClient};
use super::types::GenerationParams;
use crate::core::errors::ApiError;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Client for the Google Generative Language REST API.
#[derive(Clone)]
pub struct GeminiClient {
    base_url: String,
    api_key: Option<String>,
    embedding_model: String,
    generation_model: String,
    client: Client,
}

impl GeminiClient {
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

    fn endpoint(&self, model: &str, method: &str) -> String {
        let model = model.strip_prefix("models/").unwrap_or(model);
        format!("{}/models/{}:{}", self.base_url, model, method)
    }

    async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response, String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| "Gemini API key is not configured".to_string())?;

        self.client
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| err.to_string())
    }
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: Option<ContentEmbedding>,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    #[serde(default)]
    values: Vec<f32>,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

fn embed_body(model: &str, text: &str) -> Value {
    let model = model.strip_prefix("models/").unwrap_or(model);
    json!({
        "model": format!("models/{}", model),
        "content": { "parts": [{ "text": text }] },
    })
}

fn generate_body(prompt: &str, params: &GenerationParams) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
        "generationConfig": {
            "temperature": params.temperature,
            "topP": params.top_p,
            "topK": params.top_k,
            "maxOutputTokens": params.max_output_tokens,
        },
    })
}

/// Text of the first candidate, or an empty string when there is none.
fn first_candidate_text(response: GenerateContentResponse) -> String {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[async_trait]
impl EmbeddingClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
        let url = self.endpoint(&self.embedding_model, "embedContent");
        let body = embed_body(&self.embedding_model, text);

        let res = self.post(&url, &body).await.map_err(ApiError::Embedding)?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Embedding(format!(
                "Gemini embed error ({}): {}",
                status, text
            )));
        }

        let payload: EmbedContentResponse = res
            .json()
            .await
            .map_err(|err| ApiError::Embedding(err.to_string()))?;

        let values = payload
            .embedding
            .map(|embedding| embedding.values)
            .unwrap_or_default();
        if values.is_empty() {
            return Err(ApiError::Embedding(
                "Gemini returned an empty embedding".to_string(),
            ));
        }
        Ok(values)
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    fn name(&self) -> &str {
        "gemini"
    }

    async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, ApiError> {
        let url = self.endpoint(&self.generation_model, "generateContent");
        let body = generate_body(prompt, params);

        let res = self.post(&url, &body).await.map_err(ApiError::Generation)?;
        let status = res.status();
        if !status.is_success() {
            let text = res.text().await.unwrap_or_default();
            return Err(ApiError::Generation(format!(
                "Gemini generate error ({}): {}",
                status, text
            )));
        }

        let payload: GenerateContentResponse = res
            .json()
            .await
            .map_err(|err| ApiError::Generation(err.to_string()))?;

        Ok(first_candidate_text(payload))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GeminiClient {
        GeminiClient::new(
            Client::new(),
            "https://example.test/v1beta/".to_string(),
            Some("key".to_string()),
            "text-embedding-004".to_string(),
            "models/gemini-1.5-flash".to_string(),
        )
    }

    #[test]
    fn endpoint_strips_trailing_slash_and_model_prefix() {
        let gemini = client();
        assert_eq!(
            gemini.endpoint("models/gemini-1.5-flash", "generateContent"),
            "https://example.test/v1beta/models/gemini-1.5-flash:generateContent"
        );
        assert_eq!(
            gemini.endpoint("text-embedding-004", "embedContent"),
            "https://example.test/v1beta/models/text-embedding-004:embedContent"
        );
    }

    #[test]
    fn generate_body_carries_every_sampling_parameter() {
        let body = generate_body("hello", &GenerationParams::summary_defaults());
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(body["generationConfig"]["temperature"], 0.7);
        assert_eq!(body["generationConfig"]["topP"], 0.9);
        assert_eq!(body["generationConfig"]["topK"], 40);
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 800);
    }

    #[test]
    fn embed_body_names_the_model_once() {
        let body = embed_body("models/text-embedding-004", "clause");
        assert_eq!(body["model"], "models/text-embedding-004");
        assert_eq!(body["content"]["parts"][0]["text"], "clause");
    }

    #[test]
    fn missing_candidates_yield_empty_text() {
        let empty: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(first_candidate_text(empty), "");

        let blocked: GenerateContentResponse =
            serde_json::from_value(json!({ "candidates": [{ "finishReason": "SAFETY" }] }))
                .unwrap();
        assert_eq!(first_candidate_text(blocked), "");
    }

    #[test]
    fn candidate_parts_are_concatenated() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": { "parts": [{ "text": "Thirty " }, { "text": "days." }] }
            }]
        }))
        .unwrap();
        assert_eq!(first_candidate_text(response), "Thirty days.");
    }

    #[tokio::test]
    async fn missing_api_key_is_an_embedding_failure() {
        let gemini = GeminiClient::new(
            Client::new(),
            DEFAULT_BASE_URL.to_string(),
            Some("  ".to_string()),
            "text-embedding-004".to_string(),
            "gemini-1.5-flash".to_string(),
        );
        let err = gemini.embed("text").await.unwrap_err();
        assert!(matches!(err, ApiError::Embedding(_)));
    }
}
