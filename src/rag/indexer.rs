use std::sync::Arc;

use super::chunker::split_segments;
use super::store::{run_blocking, VectorStore};
use crate::core::errors::ApiError;
use crate::llm::EmbeddingClient;

/// Splits documents into chunks, embeds them and appends them to the store.
#[derive(Clone)]
pub struct Indexer {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingClient>,
    max_chunk_chars: usize,
}

impl Indexer {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingClient>,
        max_chunk_chars: usize,
    ) -> Self {
        Self {
            store,
            embedder,
            max_chunk_chars,
        }
    }

    /// Index one document and return how many chunks were added.
    ///
    /// Every chunk is embedded before the store is touched, so a failed
    /// embedding call leaves the store exactly as it was.
    pub async fn index(&self, parent_identifier: &str, full_text: &str) -> Result<usize, ApiError> {
        if parent_identifier.trim().is_empty() {
            return Err(ApiError::invalid("document id is required"));
        }
        if full_text.trim().is_empty() {
            return Err(ApiError::invalid("document text is required"));
        }

        let segments = split_segments(full_text, self.max_chunk_chars);
        tracing::info!(
            parent = parent_identifier,
            segments = segments.len(),
            "Indexing document"
        );

        let mut embedded = Vec::with_capacity(segments.len());
        for (index, segment) in segments.into_iter().enumerate() {
            let embedding = self.embedder.embed(&segment).await.map_err(|err| {
                tracing::warn!(
                    parent = parent_identifier,
                    chunk = index,
                    "Embedding failed, discarding document: {}",
                    err
                );
                err
            })?;
            embedded.push((segment, embedding));
        }

        let store = self.store.clone();
        let parent = parent_identifier.to_string();
        let identifiers =
            run_blocking(move || store.append_document(&parent, embedded)).await?;
        tracing::info!(
            parent = parent_identifier,
            added = identifiers.len(),
            "Document indexed"
        );
        Ok(identifiers.len())
    }
}
