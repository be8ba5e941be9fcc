use super::settings::AppConfig;
use crate::core::errors::ApiError;

pub fn validate_config(config: &AppConfig) -> Result<(), ApiError> {
    validate_non_empty_string("server.host", &config.server.host)?;
    for (index, origin) in config.server.cors_allowed_origins.iter().enumerate() {
        validate_non_empty_string(&format!("server.cors_allowed_origins[{}]", index), origin)?;
    }

    if let Some(base_url) = &config.llm.base_url {
        validate_non_empty_string("llm.base_url", base_url)?;
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ApiError::invalid(format!(
                "Invalid config at 'llm.base_url': expected an http(s) URL, got '{}'",
                base_url
            )));
        }
    }
    validate_non_empty_string("llm.embedding_model", &config.llm.embedding_model)?;
    validate_non_empty_string("llm.generation_model", &config.llm.generation_model)?;
    validate_range("llm.timeout_secs", config.llm.timeout_secs as usize, 1, 3_600)?;

    validate_non_empty_string("store.path", &config.store.path)?;

    validate_range("rag.max_chunk_chars", config.rag.max_chunk_chars, 1, 100_000)?;
    validate_range("rag.default_limit", config.rag.default_limit, 1, 1_000)?;

    config.generation.query.validate("generation.query")?;
    config.generation.summary.validate("generation.summary")?;

    validate_range(
        "summary.max_input_chars",
        config.summary.max_input_chars,
        1,
        10_000_000,
    )?;
    validate_range(
        "summary.heuristic_sentences",
        config.summary.heuristic_sentences,
        1,
        100,
    )?;

    validate_range("upload.max_bytes", config.upload.max_bytes, 1, 1 << 30)?;

    Ok(())
}

fn validate_range(path: &str, value: usize, min: usize, max: usize) -> Result<(), ApiError> {
    if value < min || value > max {
        return Err(ApiError::invalid(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_non_empty_string(path: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        validate_config(&AppConfig::default()).unwrap();
    }

    #[test]
    fn zero_default_limit_is_rejected() {
        let mut config = AppConfig::default();
        config.rag.default_limit = 0;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("rag.default_limit"));
    }

    #[test]
    fn base_url_must_be_http() {
        let mut config = AppConfig::default();
        config.llm.base_url = Some("ftp://models.local".to_string());
        assert!(matches!(
            validate_config(&config),
            Err(ApiError::InvalidArgument(_))
        ));
    }

    #[test]
    fn generation_defaults_are_range_checked() {
        let mut config = AppConfig::default();
        config.generation.summary.temperature = 3.5;
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("generation.summary.temperature"));
    }
}
