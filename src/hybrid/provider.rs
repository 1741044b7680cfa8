//! Search provider contracts.
//!
//! The hybrid searcher never talks to a backend directly. It asks a
//! [`KeywordSearchProvider`] and a [`VectorSearchProvider`] for their
//! rankings and fuses whatever comes back.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::hybrid::types::{Payload, SourceRanking};

/// A keyword (text) search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordQuery {
    /// Collection to search.
    pub collection: String,
    /// Query text.
    pub text: String,
    /// Properties to match against. `None` means all text properties.
    pub properties: Option<Vec<String>>,
    /// Only objects matching this filter are searched.
    #[serde(default)]
    pub filter: Option<Payload>,
    /// Maximum number of hits to return.
    pub limit: usize,
}

/// Where the query vector comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorInput {
    /// Use this vector as is.
    Vector(Vec<f32>),
    /// Derive the vector from this text with the collection's vectorizer.
    Text(String),
}

/// A vector (dense) search request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorQuery {
    pub collection: String,
    pub input: VectorInput,
    #[serde(default)]
    pub filter: Option<Payload>,
    pub limit: usize,
}

/// Whether `properties` satisfies a property-equality filter.
///
/// Every `name: value` pair of the filter must be present with an equal
/// value. An empty filter matches everything.
pub fn matches_filter(properties: &Payload, filter: &Payload) -> bool {
    filter
        .iter()
        .all(|(name, expected)| properties.get(name) == Some(expected))
}

/// Result of a vector search.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorSearchOutcome {
    /// The provider produced a ranking.
    Ranking(SourceRanking),
    /// The collection has no vectorizer and no vector was supplied.
    Unavailable,
}

impl VectorSearchOutcome {
    /// The ranking, with `Unavailable` mapped to an empty ranking.
    pub fn into_ranking(self) -> SourceRanking {
        match self {
            VectorSearchOutcome::Ranking(ranking) => ranking,
            VectorSearchOutcome::Unavailable => SourceRanking::empty(),
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, VectorSearchOutcome::Ranking(_))
    }
}

/// Produces keyword rankings.
pub trait KeywordSearchProvider: Send + Sync {
    /// Run a keyword search. Backend failures are reported as
    /// [`VectoryError::SearchUnavailable`](crate::error::VectoryError::SearchUnavailable).
    fn keyword_search(&self, query: &KeywordQuery) -> Result<SourceRanking>;
}

/// Produces vector rankings.
pub trait VectorSearchProvider: Send + Sync {
    /// Run a vector search.
    fn vector_search(&self, query: &VectorQuery) -> Result<VectorSearchOutcome>;
}

impl<T: KeywordSearchProvider + ?Sized> KeywordSearchProvider for &T {
    fn keyword_search(&self, query: &KeywordQuery) -> Result<SourceRanking> {
        (**self).keyword_search(query)
    }
}

impl<T: VectorSearchProvider + ?Sized> VectorSearchProvider for &T {
    fn vector_search(&self, query: &VectorQuery) -> Result<VectorSearchOutcome> {
        (**self).vector_search(query)
    }
}

impl<T: KeywordSearchProvider + ?Sized> KeywordSearchProvider for Box<T> {
    fn keyword_search(&self, query: &KeywordQuery) -> Result<SourceRanking> {
        (**self).keyword_search(query)
    }
}

impl<T: VectorSearchProvider + ?Sized> VectorSearchProvider for Box<T> {
    fn vector_search(&self, query: &VectorQuery) -> Result<VectorSearchOutcome> {
        (**self).vector_search(query)
    }
}
