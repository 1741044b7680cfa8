//! Hybrid search result fusion.
//!
//! This module combines a keyword (sparse) ranking and a vector (dense)
//! ranking of the same query into one ordered result list:
//!
//! - **Normalizer**: rescales one ranking's raw scores onto [0, 1]
//! - **Fusion**: ranked fusion and relative score fusion
//! - **Engine**: validation, union, deterministic ordering and truncation
//! - **Searcher**: fetches both rankings from providers and fuses them
//!
//! # Example
//!
//! ```
//! use vectory::hybrid::fusion::FusionType;
//! use vectory::hybrid::engine::fuse;
//! use vectory::hybrid::types::SourceRanking;
//!
//! let keyword = SourceRanking::from_scores([("A", 10.0), ("B", 5.0)]).unwrap();
//! let vector = SourceRanking::from_scores([("B", 0.9), ("C", 0.3)]).unwrap();
//!
//! let results = fuse(&keyword, &vector, FusionType::RelativeScore, 0.5, 10).unwrap();
//! assert_eq!(results[0].id, "A");
//! ```

pub mod config;
pub mod engine;
pub mod fusion;
pub mod normalizer;
pub mod provider;
pub mod searcher;
pub mod types;

pub use config::HybridSearchConfig;
pub use engine::{FusionEngine, fuse};
pub use fusion::FusionType;
pub use provider::{
    KeywordQuery, KeywordSearchProvider, VectorInput, VectorQuery, VectorSearchOutcome,
    VectorSearchProvider, matches_filter,
};
pub use searcher::{HybridSearchRequest, HybridSearcher};
pub use types::{
    FusedResult, HybridSearchResults, Payload, RankingEntry, ScoredItem, SourceRanking,
};
