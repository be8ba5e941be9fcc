use std::cmp::Ordering;

use super::store::{ChunkRecord, ScoredRecord};
use crate::core::errors::ApiError;

/// Scores every candidate against a query embedding.
///
/// A strategy returns one score per record, in record order; ordering and
/// truncation are left to `retrieve`.
pub trait RankingStrategy: Send + Sync {
    fn name(&self) -> &str;

    fn score_all(&self, query: &[f32], records: &[ChunkRecord]) -> Result<Vec<f32>, ApiError>;
}

/// Exhaustive dot-product scan over every stored record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DotProductScan;

impl RankingStrategy for DotProductScan {
    fn name(&self) -> &str {
        "dot_product_scan"
    }

    fn score_all(&self, query: &[f32], records: &[ChunkRecord]) -> Result<Vec<f32>, ApiError> {
        records
            .iter()
            .map(|record| {
                if record.embedding.len() != query.len() {
                    return Err(ApiError::invalid(format!(
                        "Vector length mismatch for {}: query has {}, record has {}",
                        record.identifier,
                        query.len(),
                        record.embedding.len()
                    )));
                }
                Ok(dot(query, &record.embedding))
            })
            .collect()
    }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Top `limit` records by descending score. Equal scores keep store order.
pub fn retrieve(
    strategy: &dyn RankingStrategy,
    query: &[f32],
    limit: usize,
    records: Vec<ChunkRecord>,
) -> Result<Vec<ScoredRecord>, ApiError> {
    if limit == 0 || records.is_empty() {
        return Ok(Vec::new());
    }

    let scores = strategy.score_all(query, &records)?;
    if scores.len() != records.len() {
        return Err(ApiError::Internal(format!(
            "{} produced {} scores for {} records",
            strategy.name(),
            scores.len(),
            records.len()
        )));
    }

    let mut scored: Vec<ScoredRecord> = records
        .into_iter()
        .zip(scores)
        .map(|(record, score)| ScoredRecord { record, score })
        .collect();

    // `sort_by` is stable, which gives the tie-break on store order.
    scored.sort_by(|left, right| {
        right
            .score
            .partial_cmp(&left.score)
            .unwrap_or(Ordering::Equal)
    });
    scored.truncate(limit);
    Ok(scored)
}
