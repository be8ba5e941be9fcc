//! Chunk records and the `VectorStore` trait.
//!
//! The primary implementation is `JsonVectorStore` in the `json_store` module.

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

/// Separator between a document identifier and a chunk's sequence index.
pub const ID_SEPARATOR: &str = "::";

/// A stored chunk with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkRecord {
    /// `<parentIdentifier>::<sequenceIndex>`, unique within a store.
    pub identifier: String,
    /// Source document this chunk was cut from.
    pub parent_identifier: String,
    pub text: String,
    pub embedding: Vec<f32>,
}

impl ChunkRecord {
    pub fn new(parent_identifier: &str, sequence: usize, text: String, embedding: Vec<f32>) -> Self {
        Self {
            identifier: format!("{}{}{}", parent_identifier, ID_SEPARATOR, sequence),
            parent_identifier: parent_identifier.to_string(),
            text,
            embedding,
        }
    }

    /// Sequence index parsed back out of the identifier.
    pub fn sequence_index(&self) -> Option<usize> {
        self.identifier
            .strip_prefix(&self.parent_identifier)?
            .strip_prefix(ID_SEPARATOR)?
            .parse()
            .ok()
    }
}

/// A chunk scored against a query. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredRecord {
    #[serde(flatten)]
    pub record: ChunkRecord,
    /// Similarity score (higher = better).
    pub score: f32,
}

/// Per-document view of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentSummary {
    pub parent_identifier: String,
    pub chunk_count: usize,
}

/// Abstract trait for chunk storage backends.
///
/// Implementations must:
/// - treat a missing backing file as an empty store
/// - keep identifiers unique and embedding lengths equal across records
/// - make each mutation all-or-nothing
pub trait VectorStore: Send + Sync {
    /// Load every record, in stored order.
    fn load(&self) -> Result<Vec<ChunkRecord>, ApiError>;

    /// Append the embedded segments of one document and persist once.
    ///
    /// Sequence numbering continues after the highest index already stored
    /// for `parent_identifier`. Returns the new records' identifiers.
    fn append_document(
        &self,
        parent_identifier: &str,
        segments: Vec<(String, Vec<f32>)>,
    ) -> Result<Vec<String>, ApiError>;

    /// Delete every chunk of a document. Returns how many were removed.
    fn delete_document(&self, parent_identifier: &str) -> Result<usize, ApiError>;

    fn count(&self) -> Result<usize, ApiError> {
        Ok(self.load()?.len())
    }

    /// Documents in first-appearance order with their chunk counts.
    fn documents(&self) -> Result<Vec<DocumentSummary>, ApiError> {
        Ok(summarize_documents(&self.load()?))
    }
}

/// Run a store call on the blocking pool; file locks may wait on other processes.
pub async fn run_blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(ApiError::internal)?
}

pub fn summarize_documents(records: &[ChunkRecord]) -> Vec<DocumentSummary> {
    let mut summaries: Vec<DocumentSummary> = Vec::new();
    for record in records {
        match summaries
            .iter_mut()
            .find(|summary| summary.parent_identifier == record.parent_identifier)
        {
            Some(summary) => summary.chunk_count += 1,
            None => summaries.push(DocumentSummary {
                parent_identifier: record.parent_identifier.clone(),
                chunk_count: 1,
            }),
        }
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifier_round_trips_sequence_index() {
        let record = ChunkRecord::new("lease::2024", 7, "text".into(), vec![1.0]);
        assert_eq!(record.identifier, "lease::2024::7");
        assert_eq!(record.sequence_index(), Some(7));
    }

    #[test]
    fn records_serialize_with_camel_case_fields() {
        let record = ChunkRecord::new("a", 0, "Termination requires 30 days notice.".into(), vec![1.0, 0.0]);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["identifier"], "a::0");
        assert_eq!(json["parentIdentifier"], "a");
        assert_eq!(json["embedding"][0], 1.0);

        let scored = ScoredRecord { record, score: 1.0 };
        let json = serde_json::to_value(&scored).unwrap();
        assert_eq!(json["identifier"], "a::0");
        assert_eq!(json["score"], 1.0);
    }

    #[test]
    fn documents_are_grouped_in_first_appearance_order() {
        let records = vec![
            ChunkRecord::new("b", 0, "x".into(), vec![1.0]),
            ChunkRecord::new("a", 0, "y".into(), vec![1.0]),
            ChunkRecord::new("b", 1, "z".into(), vec![1.0]),
        ];
        assert_eq!(
            summarize_documents(&records),
            vec![
                DocumentSummary { parent_identifier: "b".into(), chunk_count: 2 },
                DocumentSummary { parent_identifier: "a".into(), chunk_count: 1 },
            ]
        );
    }
}
