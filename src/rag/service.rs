use std::sync::Arc;

use super::indexer::Indexer;
use super::ranking::{retrieve, RankingStrategy};
use super::store::{run_blocking, DocumentSummary, ScoredRecord, VectorStore};
use super::synthesizer::AnswerSynthesizer;
use crate::core::errors::ApiError;
use crate::llm::{EmbeddingClient, GenerationClient, GenerationParams};

/// Options for one question, already validated at the request boundary.
#[derive(Debug, Clone, Copy)]
pub struct QueryOptions {
    pub limit: usize,
    pub generation: GenerationParams,
}

#[derive(Debug, Clone)]
pub struct QueryAnswer {
    pub answer: String,
    pub results: Vec<ScoredRecord>,
}

/// A failed query, carrying whatever was retrieved before the failure.
#[derive(Debug)]
pub struct QueryFailure {
    pub error: ApiError,
    pub results: Vec<ScoredRecord>,
}

impl From<ApiError> for QueryFailure {
    fn from(error: ApiError) -> Self {
        Self {
            error,
            results: Vec::new(),
        }
    }
}

/// Indexing and question answering over one vector store.
#[derive(Clone)]
pub struct RagService {
    store: Arc<dyn VectorStore>,
    embedder: Arc<dyn EmbeddingClient>,
    ranking: Arc<dyn RankingStrategy>,
    indexer: Indexer,
    synthesizer: AnswerSynthesizer,
}

impl RagService {
    pub fn new(
        store: Arc<dyn VectorStore>,
        embedder: Arc<dyn EmbeddingClient>,
        generator: Arc<dyn GenerationClient>,
        ranking: Arc<dyn RankingStrategy>,
        max_chunk_chars: usize,
    ) -> Self {
        let indexer = Indexer::new(store.clone(), embedder.clone(), max_chunk_chars);
        let synthesizer = AnswerSynthesizer::new(generator);
        Self {
            store,
            embedder,
            ranking,
            indexer,
            synthesizer,
        }
    }

    pub async fn index(&self, parent_identifier: &str, full_text: &str) -> Result<usize, ApiError> {
        self.indexer.index(parent_identifier, full_text).await
    }

    /// Embed the query and rank the whole store against it.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<Vec<ScoredRecord>, ApiError> {
        if query.trim().is_empty() {
            return Err(ApiError::invalid("query is required"));
        }
        let query_embedding = self.embedder.embed(query).await?;
        let store = self.store.clone();
        let records = run_blocking(move || store.load()).await?;
        let total = records.len();
        let results = retrieve(self.ranking.as_ref(), &query_embedding, limit, records)?;
        tracing::debug!(
            strategy = self.ranking.name(),
            scanned = total,
            returned = results.len(),
            "Retrieved chunks"
        );
        Ok(results)
    }

    /// Retrieve, then generate an answer grounded in the retrieved chunks.
    pub async fn answer(&self, query: &str, options: QueryOptions) -> Result<QueryAnswer, QueryFailure> {
        let results = self.retrieve(query, options.limit).await?;

        match self
            .synthesizer
            .synthesize(query, &results, &options.generation)
            .await
        {
            Ok(answer) => {
                tracing::info!(matches = results.len(), "Query answered");
                Ok(QueryAnswer { answer, results })
            }
            Err(error) => {
                tracing::warn!(matches = results.len(), "Answer generation failed: {}", error);
                Err(QueryFailure { error, results })
            }
        }
    }

    pub async fn documents(&self) -> Result<Vec<DocumentSummary>, ApiError> {
        let store = self.store.clone();
        run_blocking(move || store.documents()).await
    }

    pub async fn delete_document(&self, parent_identifier: &str) -> Result<usize, ApiError> {
        let store = self.store.clone();
        let parent = parent_identifier.to_string();
        let removed = run_blocking(move || store.delete_document(&parent)).await?;
        tracing::info!(parent = parent_identifier, removed, "Document deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::rag::json_store::JsonVectorStore;
    use crate::rag::ranking::DotProductScan;

    /// Two-dimensional embedding: [mentions termination, mentions payment].
    struct KeywordEmbedder;

    #[async_trait]
    impl EmbeddingClient for KeywordEmbedder {
        fn name(&self) -> &str {
            "keyword"
        }

        async fn embed(&self, text: &str) -> Result<Vec<f32>, ApiError> {
            let lower = text.to_lowercase();
            Ok(vec![
                if lower.contains("terminat") { 1.0 } else { 0.0 },
                if lower.contains("pay") { 1.0 } else { 0.0 },
            ])
        }
    }

    struct EchoGenerator {
        fail: bool,
    }

    #[async_trait]
    impl GenerationClient for EchoGenerator {
        fn name(&self) -> &str {
            "echo"
        }

        async fn generate(&self, prompt: &str, _params: &GenerationParams) -> Result<String, ApiError> {
            if self.fail {
                return Err(ApiError::Generation("model overloaded".to_string()));
            }
            Ok(format!("prompt had {} chars", prompt.len()))
        }
    }

    fn service(fail_generation: bool) -> (tempfile::TempDir, RagService) {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(JsonVectorStore::new(dir.path().join("store.json")));
        let service = RagService::new(
            store,
            Arc::new(KeywordEmbedder),
            Arc::new(EchoGenerator {
                fail: fail_generation,
            }),
            Arc::new(DotProductScan),
            crate::rag::MAX_CHUNK_CHARS,
        );
        (dir, service)
    }

    fn options(limit: usize) -> QueryOptions {
        QueryOptions {
            limit,
            generation: GenerationParams::query_defaults(),
        }
    }

    #[tokio::test]
    async fn answer_returns_best_matching_chunks_first() {
        let (_dir, service) = service(false);
        service
            .index(
                "lease",
                "Payment is due monthly.\n\nTermination requires 30 days notice.\n\nGoverning law is Delaware.",
            )
            .await
            .unwrap();

        let answer = service
            .answer("How do I terminate?", options(2))
            .await
            .unwrap();

        assert!(answer.answer.starts_with("prompt had"));
        assert_eq!(answer.results.len(), 2);
        assert_eq!(answer.results[0].record.identifier, "lease::1");
        assert_eq!(answer.results[0].score, 1.0);
    }

    #[tokio::test]
    async fn empty_store_still_generates_from_empty_context() {
        let (_dir, service) = service(false);
        let answer = service.answer("Anything?", options(3)).await.unwrap();
        assert!(answer.results.is_empty());
        assert!(!answer.answer.is_empty());
    }

    #[tokio::test]
    async fn generation_failure_keeps_retrieved_matches() {
        let (_dir, service) = service(true);
        service
            .index("lease", "Termination requires 30 days notice.")
            .await
            .unwrap();

        let failure = service
            .answer("termination notice?", options(3))
            .await
            .unwrap_err();

        assert!(matches!(failure.error, ApiError::Generation(_)));
        assert_eq!(failure.results.len(), 1);
        assert_eq!(failure.results[0].record.identifier, "lease::0");
    }

    #[tokio::test]
    async fn blank_query_is_rejected() {
        let (_dir, service) = service(false);
        let failure = service.answer("   ", options(3)).await.unwrap_err();
        assert!(matches!(failure.error, ApiError::InvalidArgument(_)));
        assert!(failure.results.is_empty());
    }

    #[tokio::test]
    async fn locked_store_does_not_stall_the_runtime() {
        use fs2::FileExt;

        let (dir, service) = service(false);
        let holder = std::fs::File::create(dir.path().join("store.json.lock")).unwrap();
        holder.lock_exclusive().unwrap();

        let pending = tokio::spawn({
            let service = service.clone();
            async move { service.documents().await }
        });

        // Single-threaded runtime: this only completes if the store wait is off-thread.
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(!pending.is_finished());

        holder.unlock().unwrap();
        let documents = pending.await.unwrap().unwrap();
        assert!(documents.is_empty());
    }
}
