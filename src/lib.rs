//! # Vectory
//!
//! Hybrid search result fusion for Rust.
//!
//! ## Features
//!
//! - Ranked fusion and relative score fusion of keyword and vector rankings
//! - Min-max score normalization
//! - Deterministic ordering with a stable tie-break
//! - Pluggable keyword and vector search providers
//! - In-memory collections loaded from JSON

pub mod cli;
pub mod collection;
pub mod error;
pub mod hybrid;

pub mod prelude {
    pub use crate::collection::{MemoryCollection, StoredObject};
    pub use crate::error::{Result, VectoryError};
    pub use crate::hybrid::{
        FusedResult, FusionEngine, FusionType, HybridSearchConfig, HybridSearchRequest,
        HybridSearcher, SourceRanking, fuse,
    };
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
