use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::core::config::{AppConfig, AppPaths, ConfigService};
use crate::llm::{build_clients, EmbeddingClient, GenerationClient};
use crate::rag::{DotProductScan, JsonVectorStore, RagService};
use crate::summary::LlmSummarizer;

pub mod error;

use error::InitializationError;

/// Shared state handed to every route.
///
/// Holds the resolved configuration, the RAG service bound to the JSON
/// vector store, and the model-backed summarizer.
#[derive(Clone)]
pub struct AppState {
    pub config: ConfigService,
    pub settings: Arc<AppConfig>,
    pub rag: RagService,
    pub summarizer: LlmSummarizer,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Builds state from the on-disk configuration and the configured provider.
    pub fn initialize(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: AppConfig,
    ) -> Result<Arc<Self>, InitializationError> {
        let clients =
            build_clients(&settings.llm).map_err(|e| InitializationError::Llm(e.into()))?;
        tracing::info!(
            provider = clients.generator.name(),
            embedding_model = %settings.llm.embedding_model,
            generation_model = %settings.llm.generation_model,
            "LLM clients ready"
        );

        Ok(Self::from_parts(
            paths,
            config,
            settings,
            clients.embedder,
            clients.generator,
        ))
    }

    /// Wires state around explicit clients.
    pub fn from_parts(
        paths: Arc<AppPaths>,
        config: ConfigService,
        settings: AppConfig,
        embedder: Arc<dyn EmbeddingClient>,
        generator: Arc<dyn GenerationClient>,
    ) -> Arc<Self> {
        let store_path = paths.resolve_data_path(&settings.store.path);
        tracing::info!(path = %store_path.display(), "Using JSON vector store");

        let store = Arc::new(JsonVectorStore::new(store_path));
        let rag = RagService::new(
            store,
            embedder,
            generator.clone(),
            Arc::new(DotProductScan),
            settings.rag.max_chunk_chars,
        );
        let summarizer = LlmSummarizer::new(generator, settings.summary.max_input_chars);

        Arc::new(AppState {
            config,
            settings: Arc::new(settings),
            rag,
            summarizer,
            started_at: Utc::now(),
        })
    }
}
