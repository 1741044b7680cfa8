//! Types and data structures for hybrid search fusion.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Result, VectoryError};
use crate::hybrid::fusion::FusionType;

/// Opaque object properties carried through fusion unchanged. Keys are
/// kept in name order.
pub type Payload = serde_json::Map<String, serde_json::Value>;

/// One candidate result from a single source ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredItem {
    /// Object identifier, stable across keyword and vector rankings.
    pub id: String,
    /// Relevance score as reported by the originating search.
    pub raw_score: f64,
    /// 1-based position within the source ranking.
    pub rank: usize,
    /// Object properties.
    #[serde(default)]
    pub payload: Payload,
}

/// Unranked input entry, as produced by a search backend or read from a
/// ranking file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub id: String,
    pub score: f64,
    #[serde(default)]
    pub payload: Payload,
}

impl RankingEntry {
    /// Create a new entry without payload.
    pub fn new<S: Into<String>>(id: S, score: f64) -> Self {
        Self {
            id: id.into(),
            score,
            payload: Payload::new(),
        }
    }

    /// Attach object properties.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }
}

/// Results of one search source, ordered by decreasing raw score.
///
/// Ranks are consecutive integers starting at 1. Entries with equal scores
/// keep their input order, and an id that occurs more than once keeps only
/// its best-ranked occurrence.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SourceRanking {
    items: Vec<ScoredItem>,
}

impl SourceRanking {
    /// An empty ranking, used when a source produced nothing.
    pub fn empty() -> Self {
        Self { items: Vec::new() }
    }

    /// Build a ranking from unordered entries.
    ///
    /// Fails with [`VectoryError::InvalidParameter`] if any score is NaN or
    /// infinite.
    pub fn new(mut entries: Vec<RankingEntry>) -> Result<Self> {
        if let Some(entry) = entries.iter().find(|e| !e.score.is_finite()) {
            return Err(VectoryError::invalid_parameter(format!(
                "score for '{}' is not finite: {}",
                entry.id, entry.score
            )));
        }

        // Stable: equal scores keep input order. `+ 0.0` makes -0.0 tie with 0.0.
        entries.sort_by(|a, b| (b.score + 0.0).total_cmp(&(a.score + 0.0)));

        let mut seen = AHashSet::with_capacity(entries.len());
        let mut items = Vec::with_capacity(entries.len());
        for entry in entries {
            if !seen.insert(entry.id.clone()) {
                warn!(id = %entry.id, "dropping duplicate id from source ranking");
                continue;
            }
            items.push(ScoredItem {
                rank: items.len() + 1,
                id: entry.id,
                raw_score: entry.score,
                payload: entry.payload,
            });
        }

        Ok(Self { items })
    }

    /// Build a ranking from `(id, score)` pairs without payloads.
    pub fn from_scores<S, I>(scores: I) -> Result<Self>
    where
        S: Into<String>,
        I: IntoIterator<Item = (S, f64)>,
    {
        Self::new(
            scores
                .into_iter()
                .map(|(id, score)| RankingEntry::new(id, score))
                .collect(),
        )
    }

    /// Items in rank order.
    pub fn items(&self) -> &[ScoredItem] {
        &self.items
    }

    /// Iterate over items in rank order.
    pub fn iter(&self) -> std::slice::Iter<'_, ScoredItem> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Look up an item by id.
    pub fn get(&self, id: &str) -> Option<&ScoredItem> {
        self.items.iter().find(|item| item.id == id)
    }

    /// Keep only the first `len` items.
    pub fn truncate(&mut self, len: usize) {
        self.items.truncate(len);
    }

    /// Smallest and largest raw score, or `None` for an empty ranking.
    pub fn score_range(&self) -> Option<(f64, f64)> {
        // Items are sorted descending.
        match (self.items.last(), self.items.first()) {
            (Some(low), Some(high)) => Some((low.raw_score, high.raw_score)),
            _ => None,
        }
    }
}

impl<'a> IntoIterator for &'a SourceRanking {
    type Item = &'a ScoredItem;
    type IntoIter = std::slice::Iter<'a, ScoredItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl<'de> Deserialize<'de> for SourceRanking {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let entries = Vec::<RankingEntry>::deserialize(deserializer)?;
        SourceRanking::new(entries).map_err(serde::de::Error::custom)
    }
}

/// A single fused result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    /// Object identifier.
    pub id: String,
    /// Final score. Only comparable between results of the same fusion type.
    pub fused_score: f64,
    /// Rank in the keyword ranking (if matched).
    pub keyword_rank: Option<usize>,
    /// Rank in the vector ranking (if matched).
    pub vector_rank: Option<usize>,
    /// Raw keyword score (if matched).
    pub keyword_score: Option<f64>,
    /// Raw vector score (if matched).
    pub vector_score: Option<f64>,
    /// Object properties. The vector source's copy wins when both sources
    /// returned the object.
    pub payload: Payload,
}

impl FusedResult {
    /// The better (lower) of the two source ranks.
    pub fn best_rank(&self) -> Option<usize> {
        match (self.keyword_rank, self.vector_rank) {
            (Some(k), Some(v)) => Some(k.min(v)),
            (k, v) => k.or(v),
        }
    }

    /// Whether both sources returned this object.
    pub fn matched_both(&self) -> bool {
        self.keyword_rank.is_some() && self.vector_rank.is_some()
    }
}

/// Outcome of a hybrid search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HybridSearchResults {
    /// Fused results, best first.
    pub results: Vec<FusedResult>,
    /// Number of keyword matches fetched.
    pub keyword_matches: usize,
    /// Number of vector matches fetched.
    pub vector_matches: usize,
    /// False when the collection could not produce a vector ranking.
    pub vector_available: bool,
    /// Fusion algorithm used.
    pub fusion_type: FusionType,
    /// Blend factor used.
    pub alpha: f64,
    /// Time taken for the search in milliseconds.
    pub took_ms: u64,
    /// The original query text.
    pub query_text: String,
}

impl HybridSearchResults {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Get the best result.
    pub fn best_result(&self) -> Option<&FusedResult> {
        self.results.first()
    }
}
