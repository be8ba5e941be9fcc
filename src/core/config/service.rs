use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{Map, Value};

use super::paths::AppPaths;
use super::settings::AppConfig;
use super::validation::validate_config;
use crate::core::errors::ApiError;

const REDACT_PLACEHOLDER: &str = "****";

const SENSITIVE_PATTERNS: [&str; 10] = [
    "api_key",
    "secret",
    "password",
    "_token",
    "token_",
    "credential",
    "private_key",
    "access_key",
    "bearer",
    "authorization",
];

const SENSITIVE_WHITELIST: [&str; 4] = ["max_tokens", "max_output_tokens", "top_k", "tokens"];

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    pub fn config_path(&self) -> PathBuf {
        if let Ok(path) = env::var("LEGAL_ASSISTANT_CONFIG_PATH") {
            return PathBuf::from(path);
        }

        let user_config = self.paths.user_data_dir.join("config.yml");
        if user_config.exists() {
            return user_config;
        }

        self.paths.project_root.join("config.yml")
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.paths.secrets_path.clone()
    }

    /// Public config deep-merged with secrets, as raw JSON.
    pub fn load_config(&self) -> Value {
        let public_config = load_yaml_file(&self.config_path());
        let secrets_config = load_yaml_file(&self.secrets_path());
        deep_merge(&public_config, &secrets_config)
    }

    /// Typed configuration with environment overrides applied and validated.
    pub fn load_settings(&self) -> Result<AppConfig, ApiError> {
        let merged = self.load_config();
        let mut settings: AppConfig = serde_json::from_value(merged)
            .map_err(|err| ApiError::invalid(format!("invalid configuration: {}", err)))?;
        apply_env_overrides(&mut settings, |name| env::var(name).ok());
        validate_config(&settings)?;
        Ok(settings)
    }

    pub fn redact_sensitive_values(&self, value: &Value) -> Value {
        redact_sensitive_values(value)
    }
}

fn load_yaml_file(path: &Path) -> Value {
    if !path.exists() {
        return Value::Object(Map::new());
    }

    match fs::read_to_string(path) {
        Ok(contents) => match serde_yaml::from_str::<Value>(&contents) {
            Ok(value @ Value::Object(_)) => value,
            Ok(_) => Value::Object(Map::new()),
            Err(err) => {
                tracing::warn!("Ignoring malformed config file {}: {}", path.display(), err);
                Value::Object(Map::new())
            }
        },
        Err(err) => {
            tracing::warn!("Failed to read config file {}: {}", path.display(), err);
            Value::Object(Map::new())
        }
    }
}

fn apply_env_overrides<F>(settings: &mut AppConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = lookup("LLM_API_KEY").or_else(|| lookup("GEMINI_API_KEY"));
    if let Some(key) = api_key.filter(|key| !key.trim().is_empty()) {
        settings.llm.api_key = Some(key);
    }
    if let Some(host) = lookup("HOST").filter(|host| !host.trim().is_empty()) {
        settings.server.host = host;
    }
    if let Some(port) = lookup("PORT").and_then(|val| val.parse::<u16>().ok()) {
        settings.server.port = port;
    }
}

fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

fn redact_sensitive_values(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut redacted = Map::new();
            for (key, val) in map {
                if is_sensitive_key(key) && !val.is_null() {
                    redacted.insert(key.clone(), Value::String(REDACT_PLACEHOLDER.to_string()));
                } else {
                    redacted.insert(key.clone(), redact_sensitive_values(val));
                }
            }
            Value::Object(redacted)
        }
        Value::Array(items) => Value::Array(items.iter().map(redact_sensitive_values).collect()),
        _ => value.clone(),
    }
}

fn is_sensitive_key(key: &str) -> bool {
    let key_lower = key.to_lowercase();
    if SENSITIVE_WHITELIST
        .iter()
        .any(|allowed| *allowed == key_lower)
    {
        return false;
    }
    SENSITIVE_PATTERNS
        .iter()
        .any(|pattern| key_lower.contains(pattern))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "llm": { "provider": "gemini", "timeout_secs": 60 },
            "server": { "cors_allowed_origins": ["http://localhost:3000"] }
        });
        let secrets = json!({
            "llm": { "api_key": "abc" },
            "server": { "cors_allowed_origins": ["http://localhost:5173"] }
        });

        let merged = deep_merge(&base, &secrets);

        assert_eq!(
            merged,
            json!({
                "llm": { "provider": "gemini", "timeout_secs": 60, "api_key": "abc" },
                "server": { "cors_allowed_origins": ["http://localhost:5173"] }
            })
        );
    }

    #[test]
    fn redact_sensitive_values_replaces_secrets_only() {
        let input = json!({
            "llm": { "api_key": "secret", "embedding_model": "text-embedding-004" },
            "generation": { "query": { "max_output_tokens": 500, "top_k": 40 } },
            "unset": { "api_key": null }
        });

        let redacted = redact_sensitive_values(&input);

        assert_eq!(
            redacted,
            json!({
                "llm": { "api_key": "****", "embedding_model": "text-embedding-004" },
                "generation": { "query": { "max_output_tokens": 500, "top_k": 40 } },
                "unset": { "api_key": null }
            })
        );
    }

    #[test]
    fn env_overrides_take_precedence_over_files() {
        let mut settings = AppConfig::default();
        apply_env_overrides(&mut settings, |name| match name {
            "GEMINI_API_KEY" => Some("from-env".to_string()),
            "PORT" => Some("8123".to_string()),
            _ => None,
        });
        assert_eq!(settings.llm.api_key.as_deref(), Some("from-env"));
        assert_eq!(settings.server.port, 8123);
        assert_eq!(settings.server.host, "127.0.0.1");
    }

    #[test]
    fn settings_load_from_config_and_secrets_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("config.yml"),
            "rag:\n  default_limit: 5\nllm:\n  provider: openai_compatible\n",
        )
        .unwrap();
        fs::write(dir.path().join("secrets.yaml"), "llm:\n  api_key: local-key\n").unwrap();

        let service = ConfigService::new(Arc::new(AppPaths::from_dir(dir.path())));
        let raw = service.load_config();
        assert_eq!(raw["llm"]["api_key"], "local-key");
        assert_eq!(raw["rag"]["default_limit"], 5);

        let redacted = service.redact_sensitive_values(&raw);
        assert_eq!(redacted["llm"]["api_key"], "****");
    }
}
