//! Error types for the Vectory library.
//!
//! All errors are represented by the [`VectoryError`] enum. Fusion itself only
//! ever produces [`VectoryError::InvalidParameter`]; the remaining variants
//! come from search providers, file loading and the CLI.
//!
//! # Examples
//!
//! ```
//! use vectory::error::{VectoryError, Result};
//!
//! fn check_alpha(alpha: f64) -> Result<()> {
//!     if !(0.0..=1.0).contains(&alpha) {
//!         return Err(VectoryError::invalid_parameter("alpha out of range"));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_alpha(1.5).is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Vectory operations.
#[derive(Error, Debug)]
pub enum VectoryError {
    /// A caller-supplied parameter is out of range or malformed.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A search backend could not produce a ranking.
    #[error("Search unavailable: {0}")]
    SearchUnavailable(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// I/O errors (file operations, network, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for operations that may fail with VectoryError.
pub type Result<T> = std::result::Result<T, VectoryError>;

impl VectoryError {
    /// Create a new invalid parameter error.
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        VectoryError::InvalidParameter(msg.into())
    }

    /// Create a new search unavailable error.
    pub fn search_unavailable<S: Into<String>>(msg: S) -> Self {
        VectoryError::SearchUnavailable(msg.into())
    }

    /// Create a new configuration error.
    pub fn config<S: Into<String>>(msg: S) -> Self {
        VectoryError::Config(msg.into())
    }

    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        VectoryError::NotFound(msg.into())
    }

    /// Whether this error came from parameter validation.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, VectoryError::InvalidParameter(_))
    }
}
