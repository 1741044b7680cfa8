//! Command implementations for the Vectory CLI.

use std::fs;
use std::path::Path;
use std::time::Instant;

use tracing::info;

use crate::cli::args::*;
use crate::cli::output::*;
use crate::collection::memory::{MemoryCollection, StoredObject};
use crate::error::{Result, VectoryError};
use crate::hybrid::engine::{FusionEngine, validate_limit};
use crate::hybrid::provider::{
    KeywordQuery, KeywordSearchProvider, VectorInput, VectorQuery, VectorSearchProvider,
};
use crate::hybrid::searcher::{HybridSearchRequest, HybridSearcher};
use crate::hybrid::types::SourceRanking;

/// Execute a CLI command.
pub fn execute_command(args: VectoryArgs) -> Result<()> {
    match &args.command {
        Command::Search(search_args) => match &search_args.command {
            SearchCommand::Hybrid(hybrid_args) => hybrid_search(hybrid_args, &args),
            SearchCommand::Text(text_args) => text_search(text_args, &args),
            SearchCommand::Vector(vector_args) => vector_search(vector_args, &args),
            SearchCommand::Filter(filter_args) => filter_search(filter_args, &args),
        },
        Command::Fuse(fuse_args) => fuse_rankings(fuse_args, &args),
    }
}

/// Run a hybrid search against a collection file.
fn hybrid_search(args: &HybridSearchArgs, cli_args: &VectoryArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let collection = MemoryCollection::from_json_file(&args.collection_file)?;
    info!(
        collection = collection.name(),
        objects = collection.len(),
        vectorizer = collection.vectorizer_name(),
        distance = collection.distance().name(),
        "loaded collection"
    );

    let mut request =
        HybridSearchRequest::new(collection.name(), args.query.as_str()).with_config(config);
    if let Some(vector_file) = &args.vector_file {
        request = request.with_vector(load_vector(vector_file)?);
    }

    let searcher = HybridSearcher::new(&collection, &collection);
    let results = searcher.search(&request)?;

    output_result(
        &format!("Hybrid search results for \"{}\"", args.query),
        &results,
        cli_args,
    )
}

/// Run a keyword-only search.
fn text_search(args: &TextSearchArgs, cli_args: &VectoryArgs) -> Result<()> {
    validate_limit(args.limit)?;
    let collection = MemoryCollection::from_json_file(&args.collection_file)?;

    let start = Instant::now();
    let ranking = collection.keyword_search(&KeywordQuery {
        collection: collection.name().to_string(),
        text: args.query.clone(),
        properties: args.properties.clone(),
        filter: args.filter.clone(),
        limit: args.limit,
    })?;
    let took_ms = start.elapsed().as_millis() as u64;
    info!(hits = ranking.len(), took_ms, "text search finished");

    output_result(
        &format!("Text search results for \"{}\"", args.query),
        &SearchResults::from_ranking("text", collection.name(), ranking, took_ms),
        cli_args,
    )
}

/// Run a vector-only search with an explicit query vector.
fn vector_search(args: &VectorSearchArgs, cli_args: &VectoryArgs) -> Result<()> {
    validate_limit(args.limit)?;
    let collection = MemoryCollection::from_json_file(&args.collection_file)?;
    let vector = load_vector(&args.vector_file)?;

    let start = Instant::now();
    let ranking = collection
        .vector_search(&VectorQuery {
            collection: collection.name().to_string(),
            input: VectorInput::Vector(vector),
            filter: None,
            limit: args.limit,
        })?
        .into_ranking();
    let took_ms = start.elapsed().as_millis() as u64;
    info!(hits = ranking.len(), took_ms, "vector search finished");

    output_result(
        "Vector search results",
        &SearchResults::from_ranking("vector", collection.name(), ranking, took_ms),
        cli_args,
    )
}

/// List the objects matching a property filter.
fn filter_search(args: &FilterSearchArgs, cli_args: &VectoryArgs) -> Result<()> {
    validate_limit(args.limit)?;
    let collection = MemoryCollection::from_json_file(&args.collection_file)?;

    let start = Instant::now();
    let objects: Vec<StoredObject> = collection
        .filter_objects(&args.filter, args.limit)
        .into_iter()
        .cloned()
        .collect();
    let took_ms = start.elapsed().as_millis() as u64;
    info!(matches = objects.len(), took_ms, "filter search finished");

    output_result(
        "Objects matching filter",
        &FilterResults {
            collection: collection.name().to_string(),
            filter: args.filter.clone(),
            objects,
            took_ms,
        },
        cli_args,
    )
}

/// Fuse two ranking files.
fn fuse_rankings(args: &FuseArgs, cli_args: &VectoryArgs) -> Result<()> {
    let engine = FusionEngine::new(args.fusion_type, args.alpha, args.limit)?;
    let keyword = load_ranking(&args.keyword)?;
    let vector = load_ranking(&args.vector)?;

    let results = engine.fuse(&keyword, &vector);
    info!(results = results.len(), "fused rankings");

    output_result(
        "Fused results",
        &FuseResults {
            fusion_type: engine.fusion_type(),
            alpha: engine.alpha(),
            keyword_count: keyword.len(),
            vector_count: vector.len(),
            results,
        },
        cli_args,
    )
}

/// Load a query vector from a JSON array of numbers.
pub fn load_vector(path: &Path) -> Result<Vec<f32>> {
    let content = fs::read_to_string(path)?;
    let vector: Vec<f32> = serde_json::from_str(&content)?;

    if vector.is_empty() {
        return Err(VectoryError::invalid_parameter(format!(
            "query vector in {} is empty",
            path.display()
        )));
    }
    if vector.iter().any(|x| !x.is_finite()) {
        return Err(VectoryError::invalid_parameter(format!(
            "query vector in {} contains a value outside the f32 range",
            path.display()
        )));
    }
    Ok(vector)
}

/// Load a ranking from a JSON array of `{id, score, payload?}` entries.
pub fn load_ranking(path: &Path) -> Result<SourceRanking> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
