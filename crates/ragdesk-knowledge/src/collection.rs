//! In-memory knowledge collection with cosine similarity search.
//!
//! One collection per topic. Built once at startup, then shared read-only
//! behind an `Arc`, so searches need no locking.

use ragdesk_core::error::{RagDeskError, Result};
use ragdesk_core::types::{EmbeddedSegment, RetrievalResult, ScoredSegment};

/// Embedded segments for a single topic.
#[derive(Debug, Clone)]
pub struct KnowledgeCollection {
    name: String,
    dimension: usize,
    entries: Vec<EmbeddedSegment>,
}

impl KnowledgeCollection {
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert one embedded segment. The vector must match the collection's dimension.
    pub fn add(&mut self, entry: EmbeddedSegment) -> Result<()> {
        if entry.vector.len() != self.dimension {
            return Err(RagDeskError::DimensionMismatch {
                expected: self.dimension,
                actual: entry.vector.len(),
            });
        }
        self.entries.push(entry);
        Ok(())
    }

    /// Top `k` segments scoring at least `min_score`, best first.
    ///
    /// Scores are cosine similarity mapped to `[0, 1]`. Equal scores keep
    /// insertion order.
    pub fn search(&self, query: &[f32], k: usize, min_score: f32) -> Result<RetrievalResult> {
        if query.len() != self.dimension {
            return Err(RagDeskError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        if k == 0 {
            return Ok(RetrievalResult::empty());
        }

        let query_norm = norm(query);
        let mut matches: Vec<ScoredSegment> = self
            .entries
            .iter()
            .map(|entry| ScoredSegment {
                segment: entry.segment.clone(),
                score: relevance(query, query_norm, &entry.vector),
            })
            .filter(|m| m.score >= min_score)
            .collect();

        // `sort_by` is stable, which keeps ties in insertion order.
        matches.sort_by(|a, b| b.score.total_cmp(&a.score));
        matches.truncate(k);

        tracing::debug!(
            "🔎 {}: {} match(es) (k={}, min_score={})",
            self.name,
            matches.len(),
            k,
            min_score
        );
        Ok(RetrievalResult { matches })
    }
}

fn norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// `(cos + 1) / 2`, or 0 when either vector has zero norm.
fn relevance(query: &[f32], query_norm: f32, other: &[f32]) -> f32 {
    let other_norm = norm(other);
    if query_norm == 0.0 || other_norm == 0.0 {
        return 0.0;
    }
    let dot: f32 = query.iter().zip(other).map(|(a, b)| a * b).sum();
    let cos = dot / (query_norm * other_norm);
    ((cos + 1.0) / 2.0).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragdesk_core::types::Segment;

    fn entry(text: &str, vector: Vec<f32>) -> EmbeddedSegment {
        EmbeddedSegment {
            segment: Segment {
                text: text.into(),
                source_id: "doc".into(),
                offset: 0,
                index: 0,
            },
            vector,
        }
    }

    fn collection() -> KnowledgeCollection {
        let mut c = KnowledgeCollection::new("ml", 3);
        c.add(entry("x", vec![1.0, 0.0, 0.0])).unwrap();
        c.add(entry("y", vec![0.0, 1.0, 0.0])).unwrap();
        c.add(entry("neg-x", vec![-1.0, 0.0, 0.0])).unwrap();
        c.add(entry("xy", vec![1.0, 1.0, 0.0])).unwrap();
        c
    }

    #[test]
    fn test_self_query_scores_one() {
        let c = collection();
        let result = c.search(&[0.0, 1.0, 0.0], 10, 0.0).unwrap();
        assert_eq!(result.matches[0].segment.text, "y");
        assert!((result.matches[0].score - 1.0).abs() < 1e-6);
        assert_eq!(result.len(), 4);
    }

    #[test]
    fn test_results_sorted_and_thresholded() {
        let c = collection();
        let result = c.search(&[1.0, 0.0, 0.0], 10, 0.5).unwrap();
        let texts: Vec<&str> = result.texts().collect();
        // y is orthogonal (score 0.5), neg-x is opposite (score 0.0).
        assert_eq!(texts, vec!["x", "xy", "y"]);
        assert!(result.matches.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(result.matches.iter().all(|m| m.score >= 0.5));
    }

    #[test]
    fn test_k_limits_results() {
        let c = collection();
        assert_eq!(c.search(&[1.0, 0.0, 0.0], 2, 0.0).unwrap().len(), 2);
        assert!(c.search(&[1.0, 0.0, 0.0], 0, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_no_match_is_empty_not_error() {
        let c = collection();
        let result = c.search(&[0.0, 0.0, 1.0], 5, 0.9).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut c = KnowledgeCollection::new("rag", 2);
        c.add(entry("first", vec![1.0, 0.0])).unwrap();
        c.add(entry("second", vec![2.0, 0.0])).unwrap();
        let result = c.search(&[1.0, 0.0], 2, 0.0).unwrap();
        let texts: Vec<&str> = result.texts().collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let mut c = KnowledgeCollection::new("rag", 2);
        c.add(entry("blank", vec![0.0, 0.0])).unwrap();
        assert!(c.search(&[1.0, 0.0], 1, 0.1).unwrap().is_empty());
        assert_eq!(c.search(&[0.0, 0.0], 1, 0.0).unwrap().matches[0].score, 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut c = KnowledgeCollection::new("rag", 3);
        let err = c.add(entry("bad", vec![1.0])).unwrap_err();
        assert!(matches!(
            err,
            RagDeskError::DimensionMismatch {
                expected: 3,
                actual: 1
            }
        ));
        assert!(c.search(&[1.0, 0.0], 1, 0.0).is_err());
        assert!(c.is_empty());
    }
}
