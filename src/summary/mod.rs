//! Document summaries: an offline extractive one and a model-written one.

pub mod heuristic;
pub mod llm;

pub use heuristic::summarize as heuristic_summary;
pub use llm::LlmSummarizer;
