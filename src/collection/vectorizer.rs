//! Text vectorizers.
//!
//! A collection's vectorizer turns query text into a query vector when the
//! caller does not supply one.

use std::hash::BuildHasher;

use ahash::RandomState;

use crate::error::{Result, VectoryError};

/// Converts text into a dense vector.
pub trait Vectorizer: Send + Sync {
    /// Vectorizer name as stored in the collection settings.
    fn name(&self) -> &str;

    /// Output dimension.
    fn dimension(&self) -> usize;

    /// Embed a piece of text.
    fn vectorize(&self, text: &str) -> Result<Vec<f32>>;
}

/// Feature-hashing bag-of-words vectorizer.
///
/// Each lowercased alphanumeric token is hashed into one of `dimension`
/// buckets with a hash-derived sign, and the result is L2 normalized. Hash
/// seeds are fixed, so vectors repeat across runs of the same build on the
/// same machine. ahash output may change between ahash versions and CPUs,
/// so vectors are not a portable storage format.
#[derive(Debug, Clone)]
pub struct HashingVectorizer {
    dimension: usize,
    hasher: RandomState,
}

impl HashingVectorizer {
    pub const NAME: &'static str = "hashing";
    pub const DEFAULT_DIMENSION: usize = 64;

    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(VectoryError::invalid_parameter(
                "vectorizer dimension must be positive",
            ));
        }
        Ok(Self::with_dimension(dimension))
    }

    fn with_dimension(dimension: usize) -> Self {
        Self {
            dimension,
            hasher: RandomState::with_seeds(
                0x243f_6a88_85a3_08d3,
                0x1319_8a2e_0370_7344,
                0xa409_3822_299f_31d0,
                0x082e_fa98_ec4e_6c89,
            ),
        }
    }
}

impl Default for HashingVectorizer {
    fn default() -> Self {
        Self::with_dimension(Self::DEFAULT_DIMENSION)
    }
}

impl Vectorizer for HashingVectorizer {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn vectorize(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokenize(text) {
            let hash = self.hasher.hash_one(&token);
            let bucket = (hash % self.dimension as u64) as usize;
            let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }
}

/// Split text into lowercased alphanumeric tokens.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
}
