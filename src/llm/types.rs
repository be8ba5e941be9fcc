use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// Sampling parameters forwarded to the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    pub temperature: f64,
    pub top_p: f64,
    pub top_k: u32,
    pub max_output_tokens: u32,
}

impl GenerationParams {
    /// Defaults used when answering questions against indexed documents.
    pub const fn query_defaults() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.9,
            top_k: 40,
            max_output_tokens: 500,
        }
    }

    /// Defaults used for document summaries.
    pub const fn summary_defaults() -> Self {
        Self {
            max_output_tokens: 800,
            ..Self::query_defaults()
        }
    }

    pub fn validate(&self, scope: &str) -> Result<(), ApiError> {
        if !self.temperature.is_finite() || !(0.0..=2.0).contains(&self.temperature) {
            return Err(ApiError::invalid(format!(
                "{scope}.temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }
        if !self.top_p.is_finite() || self.top_p <= 0.0 || self.top_p > 1.0 {
            return Err(ApiError::invalid(format!(
                "{scope}.top_p must be in (0, 1], got {}",
                self.top_p
            )));
        }
        if self.top_k == 0 {
            return Err(ApiError::invalid(format!("{scope}.top_k must be positive")));
        }
        if self.max_output_tokens == 0 {
            return Err(ApiError::invalid(format!(
                "{scope}.max_output_tokens must be positive"
            )));
        }
        Ok(())
    }
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self::query_defaults()
    }
}

/// Per-request overrides; any field left out keeps the configured default.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationOverrides {
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub top_k: Option<i64>,
    pub max_output_tokens: Option<i64>,
}

impl GenerationOverrides {
    pub fn apply(&self, base: GenerationParams) -> Result<GenerationParams, ApiError> {
        let params = GenerationParams {
            temperature: self.temperature.unwrap_or(base.temperature),
            top_p: self.top_p.unwrap_or(base.top_p),
            top_k: match self.top_k {
                Some(value) => positive_u32(value, "topK")?,
                None => base.top_k,
            },
            max_output_tokens: match self.max_output_tokens {
                Some(value) => positive_u32(value, "maxOutputTokens")?,
                None => base.max_output_tokens,
            },
        };
        params.validate("request")?;
        Ok(params)
    }
}

fn positive_u32(value: i64, field: &str) -> Result<u32, ApiError> {
    if value <= 0 {
        return Err(ApiError::invalid(format!(
            "{field} must be a positive integer, got {value}"
        )));
    }
    u32::try_from(value)
        .map_err(|_| ApiError::invalid(format!("{field} is too large: {value}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_defaults_only_raise_the_token_budget() {
        let query = GenerationParams::query_defaults();
        let summary = GenerationParams::summary_defaults();
        assert_eq!(query.max_output_tokens, 500);
        assert_eq!(summary.max_output_tokens, 800);
        assert_eq!(summary.temperature, 0.7);
        assert_eq!(summary.top_p, 0.9);
        assert_eq!(summary.top_k, 40);
    }

    #[test]
    fn overrides_replace_only_supplied_fields() {
        let overrides = GenerationOverrides {
            temperature: Some(0.2),
            top_k: Some(8),
            ..Default::default()
        };
        let params = overrides
            .apply(GenerationParams::query_defaults())
            .unwrap();
        assert_eq!(params.temperature, 0.2);
        assert_eq!(params.top_k, 8);
        assert_eq!(params.top_p, 0.9);
        assert_eq!(params.max_output_tokens, 500);
    }

    #[test]
    fn out_of_range_overrides_are_rejected() {
        let bad_top_p = GenerationOverrides {
            top_p: Some(1.5),
            ..Default::default()
        };
        assert!(matches!(
            bad_top_p.apply(GenerationParams::query_defaults()),
            Err(ApiError::InvalidArgument(_))
        ));

        let negative_tokens = GenerationOverrides {
            max_output_tokens: Some(-1),
            ..Default::default()
        };
        assert!(matches!(
            negative_tokens.apply(GenerationParams::query_defaults()),
            Err(ApiError::InvalidArgument(_))
        ));
    }
}
