//! Local collections.
//!
//! An in-memory stand-in for a vector database collection. It answers
//! keyword and vector queries through the same provider traits a remote
//! backend would implement, so hybrid search can run against data loaded
//! from a JSON file.

pub mod distance;
pub mod memory;
pub mod vectorizer;

pub use distance::DistanceMetric;
pub use memory::{MemoryCollection, StoredObject};
pub use vectorizer::{HashingVectorizer, Vectorizer};
