//! Command line argument parsing for the Vectory CLI using clap.

use clap::{Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Result, VectoryError};
use crate::hybrid::config::HybridSearchConfig;
use crate::hybrid::fusion::FusionType;
use crate::hybrid::types::Payload;

/// Vectory - hybrid keyword and vector search over local collections
#[derive(Parser, Debug, Clone)]
#[command(name = "vectory")]
#[command(about = "Hybrid keyword and vector search with result fusion")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct VectoryArgs {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,

    /// Output format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

impl VectoryArgs {
    /// Get the effective verbosity level (0=quiet, 1=normal, 2+=verbose)
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            self.verbose.saturating_add(1)
        }
    }

    /// Default log filter for the effective verbosity.
    pub fn log_level(&self) -> &'static str {
        match self.verbosity() {
            0 => "error",
            1 => "warn",
            2 => "info",
            3 => "debug",
            _ => "trace",
        }
    }
}

/// Output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table
    Human,
    /// JSON
    Json,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Search a collection
    Search(SearchArgs),

    /// Fuse two precomputed ranking files
    Fuse(FuseArgs),
}

/// Arguments for searching
#[derive(Parser, Debug, Clone)]
pub struct SearchArgs {
    #[command(subcommand)]
    pub command: SearchCommand,
}

/// Search kinds
#[derive(Subcommand, Debug, Clone)]
pub enum SearchCommand {
    /// Keyword and vector search with fused results
    Hybrid(HybridSearchArgs),

    /// Keyword-only search
    Text(TextSearchArgs),

    /// Vector-only search with an explicit query vector
    Vector(VectorSearchArgs),

    /// List objects whose properties match a filter
    Filter(FilterSearchArgs),
}

/// Parse a property filter given as a JSON object, e.g. `{"lang": "rust"}`.
pub fn parse_filter(s: &str) -> Result<Payload> {
    match serde_json::from_str::<serde_json::Value>(s)? {
        serde_json::Value::Object(filter) => Ok(filter),
        other => Err(VectoryError::invalid_parameter(format!(
            "filter must be a JSON object, got {other}"
        ))),
    }
}

/// Arguments for hybrid search
#[derive(Parser, Debug, Clone)]
pub struct HybridSearchArgs {
    /// Collection file (JSON)
    #[arg(value_name = "COLLECTION_FILE")]
    pub collection_file: PathBuf,

    /// Query text
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Blend factor: 0 is keyword only, 1 is vector only
    #[arg(short, long)]
    pub alpha: Option<f64>,

    /// Fusion algorithm (rankedFusion or relativeScoreFusion)
    #[arg(short = 't', long, value_parser = FusionType::parse_str)]
    pub fusion_type: Option<FusionType>,

    /// Maximum number of results to return
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Properties to match keywords against (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub properties: Option<Vec<String>>,

    /// Only search objects whose properties equal these values (JSON object)
    #[arg(long, value_name = "FILTER_JSON", value_parser = parse_filter)]
    pub filter: Option<Payload>,

    /// Query vector file (JSON array of numbers)
    #[arg(long, value_name = "VECTOR_FILE")]
    pub vector_file: Option<PathBuf>,

    /// Search configuration file (JSON)
    #[arg(short, long, value_name = "CONFIG_FILE")]
    pub config: Option<PathBuf>,

    /// Fail instead of falling back to keyword results when the collection
    /// has no vectorizer
    #[arg(long)]
    pub no_vectorizer_fallback: bool,
}

impl HybridSearchArgs {
    /// Build the effective search configuration: the config file (or the
    /// defaults) with command line flags applied on top.
    pub fn resolve_config(&self) -> Result<HybridSearchConfig> {
        let mut config = match &self.config {
            Some(path) => HybridSearchConfig::from_json_file(path)?,
            None => HybridSearchConfig::default(),
        };

        if let Some(alpha) = self.alpha {
            config = config.with_alpha(alpha);
        }
        if let Some(fusion_type) = self.fusion_type {
            config = config.with_fusion_type(fusion_type);
        }
        if let Some(limit) = self.limit {
            config = config.with_limit(limit);
        }
        if let Some(properties) = &self.properties {
            config = config.with_properties(properties.clone());
        }
        if let Some(filter) = &self.filter {
            config = config.with_filter(filter.clone());
        }
        if self.no_vectorizer_fallback {
            config = config.with_vectorizer_fallback(false);
        }

        Ok(config)
    }
}

/// Arguments for keyword-only search
#[derive(Parser, Debug, Clone)]
pub struct TextSearchArgs {
    /// Collection file (JSON)
    #[arg(value_name = "COLLECTION_FILE")]
    pub collection_file: PathBuf,

    /// Query text
    #[arg(value_name = "QUERY")]
    pub query: String,

    /// Maximum number of results to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,

    /// Properties to match against (comma-separated)
    #[arg(short, long, value_delimiter = ',')]
    pub properties: Option<Vec<String>>,

    /// Only search objects whose properties equal these values (JSON object)
    #[arg(long, value_name = "FILTER_JSON", value_parser = parse_filter)]
    pub filter: Option<Payload>,
}

/// Arguments for filtering objects by property values
#[derive(Parser, Debug, Clone)]
pub struct FilterSearchArgs {
    /// Collection file (JSON)
    #[arg(value_name = "COLLECTION_FILE")]
    pub collection_file: PathBuf,

    /// Required property values (JSON object)
    #[arg(value_name = "FILTER_JSON", value_parser = parse_filter)]
    pub filter: Payload,

    /// Maximum number of objects to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for vector-only search
#[derive(Parser, Debug, Clone)]
pub struct VectorSearchArgs {
    /// Collection file (JSON)
    #[arg(value_name = "COLLECTION_FILE")]
    pub collection_file: PathBuf,

    /// Query vector file (JSON array of numbers)
    #[arg(long, value_name = "VECTOR_FILE")]
    pub vector_file: PathBuf,

    /// Maximum number of results to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}

/// Arguments for fusing ranking files
#[derive(Parser, Debug, Clone)]
pub struct FuseArgs {
    /// Keyword ranking file (JSON array of {id, score, payload?})
    #[arg(short, long, value_name = "RANKING_FILE")]
    pub keyword: PathBuf,

    /// Vector ranking file (JSON array of {id, score, payload?})
    #[arg(long, value_name = "RANKING_FILE")]
    pub vector: PathBuf,

    /// Blend factor: 0 is keyword only, 1 is vector only
    #[arg(short, long, default_value = "0.5")]
    pub alpha: f64,

    /// Fusion algorithm (rankedFusion or relativeScoreFusion)
    #[arg(
        short = 't',
        long,
        default_value = "rankedFusion",
        value_parser = FusionType::parse_str
    )]
    pub fusion_type: FusionType,

    /// Maximum number of results to return
    #[arg(short, long, default_value = "10")]
    pub limit: usize,
}
