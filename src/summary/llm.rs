use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::{GenerationClient, GenerationParams};

/// Summarizes documents through the configured generation client.
#[derive(Clone)]
pub struct LlmSummarizer {
    generator: Arc<dyn GenerationClient>,
    max_input_chars: usize,
}

impl LlmSummarizer {
    pub fn new(generator: Arc<dyn GenerationClient>, max_input_chars: usize) -> Self {
        Self {
            generator,
            max_input_chars,
        }
    }

    pub async fn summarize(&self, text: &str, params: &GenerationParams) -> Result<String, ApiError> {
        if text.trim().is_empty() {
            return Err(ApiError::invalid("text is required"));
        }

        let (excerpt, truncated) = clip(text, self.max_input_chars);
        if truncated {
            tracing::info!(
                limit = self.max_input_chars,
                "Document truncated before summarization"
            );
        }
        let prompt = build_summary_prompt(excerpt);
        tracing::debug!(
            provider = self.generator.name(),
            prompt_chars = prompt.len(),
            "Requesting summary"
        );
        self.generator.generate(&prompt, params).await
    }
}

pub fn build_summary_prompt(document: &str) -> String {
    format!(
        "Summarize the following legal document for a non-lawyer. Cover:\n\
- the parties involved\n\
- key obligations of each party\n\
- payment terms\n\
- termination conditions\n\
- notable risks or unusual clauses\n\
Use short bullet points and only state what the document says.\n\n\
DOCUMENT:\n{}",
        document
    )
}

fn clip(text: &str, max_chars: usize) -> (&str, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => (&text[..byte_index], true),
        None => (text, false),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct CapturingGenerator {
        last: Mutex<Option<(String, GenerationParams)>>,
    }

    #[async_trait]
    impl GenerationClient for CapturingGenerator {
        fn name(&self) -> &str {
            "capturing"
        }

        async fn generate(&self, prompt: &str, params: &GenerationParams) -> Result<String, ApiError> {
            *self.last.lock().unwrap() = Some((prompt.to_string(), *params));
            Ok("- Parties: Acme and Beta".to_string())
        }
    }

    #[tokio::test]
    async fn long_documents_are_clipped_before_prompting() {
        let generator = Arc::new(CapturingGenerator::default());
        let summarizer = LlmSummarizer::new(generator.clone(), 10);

        let summary = summarizer
            .summarize("0123456789ABCDEF", &GenerationParams::summary_defaults())
            .await
            .unwrap();

        assert_eq!(summary, "- Parties: Acme and Beta");
        let (prompt, params) = generator.last.lock().unwrap().clone().unwrap();
        assert!(prompt.ends_with("DOCUMENT:\n0123456789"));
        assert_eq!(params.max_output_tokens, 800);
    }

    #[tokio::test]
    async fn blank_text_never_reaches_the_model() {
        let generator = Arc::new(CapturingGenerator::default());
        let summarizer = LlmSummarizer::new(generator.clone(), 100);

        let err = summarizer
            .summarize("   ", &GenerationParams::summary_defaults())
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::InvalidArgument(_)));
        assert!(generator.last.lock().unwrap().is_none());
    }
}
