//! Retrieval-augmented answering over uploaded documents.
//!
//! - `chunker`: splits documents into paragraph segments
//! - `json_store`: the persistent vector store
//! - `ranking`: dot-product retrieval
//! - `synthesizer`: grounded prompt construction and generation
//! - `service`: ties the above into index / query operations

pub mod chunker;
pub mod indexer;
pub mod json_store;
pub mod ranking;
pub mod service;
pub mod store;
pub mod synthesizer;

pub use chunker::{split_segments, MAX_CHUNK_CHARS};
pub use indexer::Indexer;
pub use json_store::JsonVectorStore;
pub use ranking::{DotProductScan, RankingStrategy};
pub use service::{QueryAnswer, QueryFailure, QueryOptions, RagService};
pub use store::{ChunkRecord, DocumentSummary, ScoredRecord, VectorStore};
pub use synthesizer::{AnswerSynthesizer, NOT_FOUND_PHRASE};
