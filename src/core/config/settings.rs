use serde::{Deserialize, Serialize};

use crate::llm::GenerationParams;

/// Typed application configuration.
///
/// Every section has serde defaults so a missing or partial `config.yml`
/// still yields a complete configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub store: StoreConfig,
    pub rag: RagConfig,
    pub generation: GenerationDefaults,
    pub summary: SummaryConfig,
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            cors_allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LlmProvider {
    #[serde(rename = "gemini")]
    Gemini,
    #[serde(rename = "openai_compatible")]
    OpenAiCompatible,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub provider: LlmProvider,
    /// Falls back to the provider's public endpoint when unset.
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub embedding_model: String,
    pub generation_model: String,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProvider::Gemini,
            base_url: None,
            api_key: None,
            embedding_model: "text-embedding-004".to_string(),
            generation_model: "gemini-1.5-flash".to_string(),
            timeout_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Relative paths resolve against the user data directory.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "vector_store.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub max_chunk_chars: usize,
    pub default_limit: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            max_chunk_chars: crate::rag::MAX_CHUNK_CHARS,
            default_limit: 3,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationDefaults {
    pub query: GenerationParams,
    pub summary: GenerationParams,
}

impl Default for GenerationDefaults {
    fn default() -> Self {
        Self {
            query: GenerationParams::query_defaults(),
            summary: GenerationParams::summary_defaults(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub max_input_chars: usize,
    pub heuristic_sentences: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self {
            max_input_chars: 30_000,
            heuristic_sentences: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub max_bytes: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_bytes: 10 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_fields() {
        let yaml = r#"
llm:
  provider: openai_compatible
  base_url: http://localhost:8080
generation:
  query:
    temperature: 0.1
    top_p: 0.5
    top_k: 10
    max_output_tokens: 256
"#;
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.llm.provider, LlmProvider::OpenAiCompatible);
        assert_eq!(config.llm.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(config.llm.timeout_secs, 60);
        assert_eq!(config.generation.query.max_output_tokens, 256);
        assert_eq!(config.generation.summary.max_output_tokens, 800);
        assert_eq!(config.rag.max_chunk_chars, 2000);
        assert_eq!(config.rag.default_limit, 3);
        assert_eq!(config.server.port, 5000);
    }
}
