//! Grounded answer synthesis.
//!
//! Builds a prompt from retrieved chunks and asks the generation client to
//! answer from that context only. Grounding is a prompting convention; the
//! returned text is not checked against the context.

use std::sync::Arc;

use super::store::ScoredRecord;
use crate::core::errors::ApiError;
use crate::llm::{GenerationClient, GenerationParams};

/// Literal phrase the model is told to use when the context lacks the answer.
pub const NOT_FOUND_PHRASE: &str = "not found in documents";

/// Retrieved texts joined by a blank line, highest score first.
pub fn build_context(retrieved: &[ScoredRecord]) -> String {
    retrieved
        .iter()
        .map(|scored| scored.record.text.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_prompt(query: &str, context: &str) -> String {
    format!(
        "Answer strictly using the CONTEXT below. If the answer is not in the CONTEXT, say \"{}\".\n\nCONTEXT:\n{}\n\nQUESTION:\n{}",
        NOT_FOUND_PHRASE, context, query
    )
}

#[derive(Clone)]
pub struct AnswerSynthesizer {
    generator: Arc<dyn GenerationClient>,
}

impl AnswerSynthesizer {
    pub fn new(generator: Arc<dyn GenerationClient>) -> Self {
        Self { generator }
    }

    pub async fn synthesize(
        &self,
        query: &str,
        retrieved: &[ScoredRecord],
        params: &GenerationParams,
    ) -> Result<String, ApiError> {
        let context = build_context(retrieved);
        let prompt = build_prompt(query, &context);
        tracing::debug!(
            chunks = retrieved.len(),
            context_chars = context.len(),
            provider = self.generator.name(),
            "Synthesizing answer"
        );
        self.generator.generate(&prompt, params).await
    }
}
