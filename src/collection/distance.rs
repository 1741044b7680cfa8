//! Distance metrics for vector similarity calculation.

use serde::{Deserialize, Serialize};

use crate::error::{Result, VectoryError};

/// Distance metrics for vector similarity calculation.
///
/// Serialized by [`DistanceMetric::name`] and parsed with
/// [`DistanceMetric::parse_str`], so collection files accept the same
/// aliases as the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum DistanceMetric {
    /// Cosine distance (1 - cosine similarity)
    #[default]
    Cosine,
    /// Euclidean (L2) distance
    Euclidean,
    /// Dot product similarity (higher is more similar)
    DotProduct,
}

/// Dot product accumulated in f64 so finite f32 inputs cannot overflow.
fn dot(a: &[f32], b: &[f32]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| f64::from(*x) * f64::from(*y))
        .sum()
}

impl DistanceMetric {
    /// Calculate the distance between two vectors using this metric.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> Result<f64> {
        if a.len() != b.len() {
            return Err(VectoryError::invalid_parameter(format!(
                "vector dimensions must match: {} != {}",
                a.len(),
                b.len()
            )));
        }

        let result = match self {
            DistanceMetric::Cosine => {
                let norm_a = dot(a, a).sqrt();
                let norm_b = dot(b, b).sqrt();

                if norm_a == 0.0 || norm_b == 0.0 {
                    1.0 // Maximum distance for zero vectors
                } else {
                    1.0 - (dot(a, b) / (norm_a * norm_b))
                }
            }
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b.iter())
                .map(|(x, y)| (f64::from(*x) - f64::from(*y)).powi(2))
                .sum::<f64>()
                .sqrt(),
            DistanceMetric::DotProduct => -dot(a, b),
        };

        Ok(result)
    }

    /// Calculate similarity (higher is more similar) between two vectors.
    ///
    /// Cosine similarity lies in [-1, 1], Euclidean is mapped into (0, 1],
    /// and dot product is returned unbounded.
    pub fn similarity(&self, a: &[f32], b: &[f32]) -> Result<f64> {
        let distance = self.distance(a, b)?;

        Ok(match self {
            DistanceMetric::Cosine => 1.0 - distance,
            DistanceMetric::Euclidean => 1.0 / (1.0 + distance),
            DistanceMetric::DotProduct => -distance,
        })
    }

    /// Get the name of this distance metric.
    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::DotProduct => "dot_product",
        }
    }

    /// Parse a distance metric from a string.
    pub fn parse_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "cosine" => Ok(DistanceMetric::Cosine),
            "euclidean" | "l2" | "l2-squared" => Ok(DistanceMetric::Euclidean),
            "dot_product" | "dot" => Ok(DistanceMetric::DotProduct),
            _ => Err(VectoryError::invalid_parameter(format!(
                "Unknown distance metric: {s}"
            ))),
        }
    }
}

impl TryFrom<String> for DistanceMetric {
    type Error = VectoryError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse_str(&value)
    }
}

impl From<DistanceMetric> for String {
    fn from(metric: DistanceMetric) -> Self {
        metric.name().to_string()
    }
}
