//! Fusion strategies for combining keyword and vector rankings.
//!
//! Two algorithms are available:
//! - **Ranked fusion** (`rankedFusion`): scores each item by `1 / rank` in
//!   its source, ignoring raw score magnitudes.
//! - **Relative score fusion** (`relativeScoreFusion`): min-max normalizes
//!   each source's raw scores and blends them directly.
//!
//! Both blend the two per-source scores as
//! `(1 - alpha) * keyword + alpha * vector`, where an item missing from a
//! source contributes `0` for that source.

use std::fmt;
use std::str::FromStr;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VectoryError};
use crate::hybrid::normalizer::normalize;
use crate::hybrid::types::{ScoredItem, SourceRanking};

/// Fusion algorithm selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FusionType {
    /// Reciprocal rank based fusion.
    #[default]
    #[serde(rename = "rankedFusion", alias = "ranked")]
    Ranked,
    /// Normalized raw score fusion.
    #[serde(rename = "relativeScoreFusion", alias = "relative_score")]
    RelativeScore,
}

impl FusionType {
    /// Name as used by the search backend.
    pub fn name(&self) -> &'static str {
        match self {
            FusionType::Ranked => "rankedFusion",
            FusionType::RelativeScore => "relativeScoreFusion",
        }
    }

    /// Parse a fusion type from a string.
    ///
    /// Accepts the backend names (`rankedFusion`, `relativeScoreFusion`) and
    /// the short forms `ranked` and `relative_score`, case-insensitively.
    pub fn parse_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "rankedfusion" | "ranked" => Ok(FusionType::Ranked),
            "relativescorefusion" | "relative_score" | "relative-score" => {
                Ok(FusionType::RelativeScore)
            }
            _ => Err(VectoryError::invalid_parameter(format!(
                "unknown fusion type: {s} (expected rankedFusion or relativeScoreFusion)"
            ))),
        }
    }

    /// Combine two rankings into unsorted fusion candidates.
    ///
    /// Every id from either ranking appears exactly once. Candidates are
    /// returned in first-seen order: keyword ranking first, then ids that
    /// only the vector ranking contains.
    pub fn combine<'a>(
        &self,
        keyword: &'a SourceRanking,
        vector: &'a SourceRanking,
        alpha: f64,
    ) -> Vec<FusionCandidate<'a>> {
        match self {
            FusionType::Ranked => ranked_fusion(keyword, vector, alpha),
            FusionType::RelativeScore => relative_score_fusion(keyword, vector, alpha),
        }
    }
}

impl fmt::Display for FusionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FusionType {
    type Err = VectoryError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse_str(s)
    }
}

/// An id with its blended score and references to its source items.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionCandidate<'a> {
    pub id: &'a str,
    pub fused_score: f64,
    pub keyword: Option<&'a ScoredItem>,
    pub vector: Option<&'a ScoredItem>,
}

/// Per-source score used by ranked fusion.
pub fn rank_score(rank: usize) -> f64 {
    1.0 / rank as f64
}

fn ranked_fusion<'a>(
    keyword: &'a SourceRanking,
    vector: &'a SourceRanking,
    alpha: f64,
) -> Vec<FusionCandidate<'a>> {
    blend(
        keyword.iter().map(|item| (item, rank_score(item.rank))),
        vector.iter().map(|item| (item, rank_score(item.rank))),
        alpha,
    )
}

fn relative_score_fusion<'a>(
    keyword: &'a SourceRanking,
    vector: &'a SourceRanking,
    alpha: f64,
) -> Vec<FusionCandidate<'a>> {
    let keyword_scores = normalize(keyword);
    let vector_scores = normalize(vector);

    blend(
        keyword
            .iter()
            .zip(keyword_scores)
            .map(|(item, n)| (item, n.normalized_score)),
        vector
            .iter()
            .zip(vector_scores)
            .map(|(item, n)| (item, n.normalized_score)),
        alpha,
    )
}

#[derive(Default)]
struct Partial<'a> {
    keyword: Option<(&'a ScoredItem, f64)>,
    vector: Option<(&'a ScoredItem, f64)>,
}

/// Union both sources by id and apply the alpha weights.
fn blend<'a, K, V>(keyword: K, vector: V, alpha: f64) -> Vec<FusionCandidate<'a>>
where
    K: Iterator<Item = (&'a ScoredItem, f64)>,
    V: Iterator<Item = (&'a ScoredItem, f64)>,
{
    let mut index: AHashMap<&'a str, usize> = AHashMap::new();
    let mut partials: Vec<(&'a str, Partial<'a>)> = Vec::new();

    for (item, score) in keyword {
        let slot = *index.entry(item.id.as_str()).or_insert_with(|| {
            partials.push((item.id.as_str(), Partial::default()));
            partials.len() - 1
        });
        partials[slot].1.keyword = Some((item, score));
    }

    for (item, score) in vector {
        let slot = *index.entry(item.id.as_str()).or_insert_with(|| {
            partials.push((item.id.as_str(), Partial::default()));
            partials.len() - 1
        });
        partials[slot].1.vector = Some((item, score));
    }

    partials
        .into_iter()
        .map(|(id, partial)| {
            let keyword_component = partial.keyword.map_or(0.0, |(_, s)| s);
            let vector_component = partial.vector.map_or(0.0, |(_, s)| s);
            FusionCandidate {
                id,
                fused_score: (1.0 - alpha) * keyword_component + alpha * vector_component,
                keyword: partial.keyword.map(|(item, _)| item),
                vector: partial.vector.map(|(item, _)| item),
            }
        })
        .collect()
}
