//! Configuration for hybrid search.
//!
//! # Examples
//!
//! ```
//! use vectory::hybrid::config::HybridSearchConfig;
//! use vectory::hybrid::fusion::FusionType;
//!
//! let config = HybridSearchConfig::default()
//!     .with_alpha(0.75)
//!     .with_fusion_type(FusionType::RelativeScore);
//! assert!(config.validate().is_ok());
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VectoryError};
use crate::hybrid::engine::{validate_alpha, validate_limit};
use crate::hybrid::fusion::FusionType;
use crate::hybrid::types::Payload;

/// Configuration for hybrid search combining keyword and vector search.
///
/// `alpha` weighs the two sources: `0.0` is pure keyword search, `1.0` is
/// pure vector search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HybridSearchConfig {
    /// Blend factor between keyword (0.0) and vector (1.0) results.
    pub alpha: f64,
    /// Fusion algorithm.
    pub fusion_type: FusionType,
    /// Maximum number of results to return.
    pub limit: usize,
    /// Properties the keyword search looks at. `None` means all text properties.
    pub properties: Option<Vec<String>>,
    /// Property-equality filter applied to both sources before ranking.
    pub filter: Option<Payload>,
    /// Degrade to keyword-only results when the collection cannot produce a
    /// vector ranking. When false that situation is reported as an error.
    pub vectorizer_fallback: bool,
}

impl Default for HybridSearchConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            fusion_type: FusionType::Ranked,
            limit: 10,
            properties: None,
            filter: None,
            vectorizer_fallback: true,
        }
    }
}

impl HybridSearchConfig {
    /// Load a configuration from a JSON file. Missing fields take their
    /// default values.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            VectoryError::config(format!("cannot read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check alpha and limit.
    pub fn validate(&self) -> Result<()> {
        validate_alpha(self.alpha)?;
        validate_limit(self.limit)?;
        if let Some(properties) = &self.properties
            && properties.iter().any(|p| p.trim().is_empty())
        {
            return Err(VectoryError::invalid_parameter(
                "property names must not be empty",
            ));
        }
        Ok(())
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_fusion_type(mut self, fusion_type: FusionType) -> Self {
        self.fusion_type = fusion_type;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_properties(mut self, properties: Vec<String>) -> Self {
        self.properties = Some(properties);
        self
    }

    pub fn with_filter(mut self, filter: Payload) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_vectorizer_fallback(mut self, fallback: bool) -> Self {
        self.vectorizer_fallback = fallback;
        self
    }
}
