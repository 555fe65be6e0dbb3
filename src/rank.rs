//! Cosine-similarity ranking of a query vector against the embedding cache.

use crate::embedding::EmbeddingCache;

/// A ranked corpus entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub post_id: u64,
    pub score: f32,
}

/// Cosine similarity between two equal-length vectors.
///
/// Returns a value in [-1.0, 1.0]. If either vector has zero norm the
/// similarity is defined as 0.0 — never NaN and never an error.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Score the query against every valid cache entry and return the top `k`.
///
/// Invalid entries, length-mismatched vectors, and non-finite scores are
/// skipped. Ordering is descending by score; ties keep corpus order (the
/// sort is stable and entries are scored in corpus order).
pub fn rank(query: &[f32], cache: &EmbeddingCache, k: usize) -> Vec<Match> {
    let mut scored: Vec<Match> = Vec::new();

    for entry in cache.entries() {
        let Some(vector) = &entry.vector else {
            continue;
        };
        if vector.len() != query.len() {
            continue;
        }
        let score = cosine_similarity(query, vector);
        if !score.is_finite() {
            continue;
        }
        scored.push(Match {
            post_id: entry.post_id,
            score,
        });
    }

    scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    scored.truncate(k);
    scored
}
