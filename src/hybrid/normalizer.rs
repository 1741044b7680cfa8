//! Score normalization for hybrid search.
//!
//! Keyword scores are unbounded and vector scores live in a similarity or
//! distance range, so each source ranking is rescaled onto [0, 1] with
//! min-max normalization before relative score fusion combines them.

use crate::hybrid::types::{Payload, ScoredItem, SourceRanking};

/// A source item with its score rescaled onto [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedItem<'a> {
    pub id: &'a str,
    pub normalized_score: f64,
    pub rank: usize,
    pub payload: &'a Payload,
}

impl<'a> NormalizedItem<'a> {
    fn from_item(item: &'a ScoredItem, normalized_score: f64) -> Self {
        Self {
            id: &item.id,
            normalized_score,
            rank: item.rank,
            payload: &item.payload,
        }
    }
}

/// Min-max normalize a ranking.
///
/// Scales scores linearly using `(score - min) / (max - min)`. When every
/// score is identical (including a single item) all items get `1.0`. The
/// output keeps the input order and length; an empty ranking yields an
/// empty vector.
///
/// # Examples
///
/// ```
/// use vectory::hybrid::normalizer::normalize;
/// use vectory::hybrid::types::SourceRanking;
///
/// let ranking = SourceRanking::from_scores([("a", 10.0), ("b", 5.0)]).unwrap();
/// let normalized = normalize(&ranking);
/// assert_eq!(normalized[0].normalized_score, 1.0);
/// assert_eq!(normalized[1].normalized_score, 0.0);
/// ```
pub fn normalize(ranking: &SourceRanking) -> Vec<NormalizedItem<'_>> {
    let Some((min, max)) = ranking.score_range() else {
        return Vec::new();
    };
    // Halve everything when the span itself overflows f64.
    let scale = if (max - min).is_finite() { 1.0 } else { 0.5 };
    let (min, max) = (min * scale, max * scale);
    let range = max - min;

    ranking
        .iter()
        .map(|item| {
            let score = if range > 0.0 {
                ((item.raw_score * scale - min) / range).clamp(0.0, 1.0)
            } else {
                1.0
            };
            NormalizedItem::from_item(item, score)
        })
        .collect()
}
