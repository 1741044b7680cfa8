//! Fusion engine: the single entry point that turns two source rankings into
//! one ordered, truncated result list.

use std::cmp::Ordering;

use tracing::debug;

use crate::error::{Result, VectoryError};
use crate::hybrid::config::HybridSearchConfig;
use crate::hybrid::fusion::{FusionCandidate, FusionType};
use crate::hybrid::types::{FusedResult, SourceRanking};

/// Validated fusion parameters.
///
/// # Examples
///
/// ```
/// use vectory::hybrid::engine::FusionEngine;
/// use vectory::hybrid::fusion::FusionType;
/// use vectory::hybrid::types::SourceRanking;
///
/// let keyword = SourceRanking::from_scores([("A", 2.0), ("B", 1.0)]).unwrap();
/// let vector = SourceRanking::from_scores([("B", 0.9), ("C", 0.8)]).unwrap();
///
/// let engine = FusionEngine::new(FusionType::Ranked, 0.5, 10).unwrap();
/// let results = engine.fuse(&keyword, &vector);
/// let ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
/// assert_eq!(ids, vec!["B", "A", "C"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FusionEngine {
    fusion_type: FusionType,
    alpha: f64,
    limit: usize,
}

impl FusionEngine {
    /// Create a new engine.
    ///
    /// Fails with [`VectoryError::InvalidParameter`] if `alpha` is outside
    /// `[0.0, 1.0]` or `limit` is zero.
    pub fn new(fusion_type: FusionType, alpha: f64, limit: usize) -> Result<Self> {
        validate_alpha(alpha)?;
        validate_limit(limit)?;
        Ok(Self {
            fusion_type,
            alpha,
            limit,
        })
    }

    /// Create an engine from a search configuration.
    pub fn from_config(config: &HybridSearchConfig) -> Result<Self> {
        Self::new(config.fusion_type, config.alpha, config.limit)
    }

    pub fn fusion_type(&self) -> FusionType {
        self.fusion_type
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Fuse two rankings.
    ///
    /// Either ranking may be empty. The output is sorted by fused score
    /// descending, then by the better of the two source ranks, then by id.
    pub fn fuse(&self, keyword: &SourceRanking, vector: &SourceRanking) -> Vec<FusedResult> {
        let mut candidates = self.fusion_type.combine(keyword, vector, self.alpha);
        let total = candidates.len();

        candidates.sort_by(compare_candidates);
        candidates.truncate(self.limit);

        debug!(
            fusion_type = %self.fusion_type,
            alpha = self.alpha,
            keyword = keyword.len(),
            vector = vector.len(),
            union = total,
            returned = candidates.len(),
            "fused rankings"
        );

        candidates.into_iter().map(into_result).collect()
    }
}

/// Fuse a keyword and a vector ranking into one ordered list.
///
/// This is [`FusionEngine::new`] followed by [`FusionEngine::fuse`].
pub fn fuse(
    keyword: &SourceRanking,
    vector: &SourceRanking,
    fusion_type: FusionType,
    alpha: f64,
    limit: usize,
) -> Result<Vec<FusedResult>> {
    Ok(FusionEngine::new(fusion_type, alpha, limit)?.fuse(keyword, vector))
}

/// Check that alpha is a finite value in `[0.0, 1.0]`.
pub fn validate_alpha(alpha: f64) -> Result<()> {
    if (0.0..=1.0).contains(&alpha) {
        Ok(())
    } else {
        Err(VectoryError::invalid_parameter(format!(
            "alpha must be within [0.0, 1.0], got {alpha}"
        )))
    }
}

/// Check that the result limit is positive.
pub fn validate_limit(limit: usize) -> Result<()> {
    if limit == 0 {
        return Err(VectoryError::invalid_parameter(
            "limit must be a positive integer",
        ));
    }
    Ok(())
}

fn best_rank(candidate: &FusionCandidate<'_>) -> usize {
    let keyword = candidate.keyword.map_or(usize::MAX, |item| item.rank);
    let vector = candidate.vector.map_or(usize::MAX, |item| item.rank);
    keyword.min(vector)
}

fn compare_candidates(a: &FusionCandidate<'_>, b: &FusionCandidate<'_>) -> Ordering {
    // `+ 0.0` folds -0.0 into 0.0 so total_cmp treats them as equal.
    (b.fused_score + 0.0)
        .total_cmp(&(a.fused_score + 0.0))
        .then_with(|| best_rank(a).cmp(&best_rank(b)))
        .then_with(|| a.id.cmp(b.id))
}

fn into_result(candidate: FusionCandidate<'_>) -> FusedResult {
    // Vector payload takes precedence when both sources returned the object.
    let payload = candidate
        .vector
        .or(candidate.keyword)
        .map(|item| item.payload.clone())
        .unwrap_or_default();

    FusedResult {
        id: candidate.id.to_string(),
        fused_score: candidate.fused_score,
        keyword_rank: candidate.keyword.map(|item| item.rank),
        vector_rank: candidate.vector.map(|item| item.rank),
        keyword_score: candidate.keyword.map(|item| item.raw_score),
        vector_score: candidate.vector.map(|item| item.raw_score),
        payload,
    }
}
