//! In-memory collection implementing both search providers.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use ahash::AHashSet;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::collection::distance::DistanceMetric;
use crate::collection::vectorizer::{HashingVectorizer, Vectorizer, tokenize};
use crate::error::{Result, VectoryError};
use crate::hybrid::provider::{
    KeywordQuery, KeywordSearchProvider, VectorInput, VectorQuery, VectorSearchOutcome,
    VectorSearchProvider, matches_filter,
};
use crate::hybrid::types::{Payload, RankingEntry, SourceRanking};

/// Vectorizer setting meaning "no vectorizer".
pub const NO_VECTORIZER: &str = "none";

/// An object stored in a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredObject {
    pub id: String,
    #[serde(default)]
    pub properties: Payload,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
}

impl StoredObject {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            properties: Payload::new(),
            vector: None,
        }
    }

    /// Set a property.
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    /// String properties in name order, joined with spaces.
    fn text(&self) -> String {
        self.properties
            .values()
            .filter_map(|value| value.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[derive(Debug, Deserialize)]
struct CollectionFile {
    name: String,
    #[serde(default)]
    vectorizer: Option<String>,
    #[serde(default)]
    distance: DistanceMetric,
    #[serde(default)]
    objects: Vec<StoredObject>,
}

/// A collection held in memory.
///
/// Keyword search counts case-insensitive whole-token occurrences of the
/// query terms in the target properties. Vector search ranks objects that
/// carry a vector by similarity under the collection's distance metric.
///
/// # Examples
///
/// ```
/// use vectory::collection::memory::{MemoryCollection, StoredObject};
/// use vectory::hybrid::provider::{KeywordQuery, KeywordSearchProvider};
///
/// let mut collection = MemoryCollection::new("Articles");
/// collection
///     .add_object(StoredObject::new("a").with_property("text", "rust search"))
///     .unwrap();
///
/// let ranking = collection
///     .keyword_search(&KeywordQuery {
///         collection: "Articles".to_string(),
///         text: "search".to_string(),
///         properties: None,
///         filter: None,
///         limit: 10,
///     })
///     .unwrap();
/// assert_eq!(ranking.len(), 1);
/// ```
pub struct MemoryCollection {
    name: String,
    vectorizer_name: Option<String>,
    vectorizer: Option<Arc<dyn Vectorizer>>,
    distance: DistanceMetric,
    dimension: Option<usize>,
    objects: Vec<StoredObject>,
    ids: AHashSet<String>,
}

impl MemoryCollection {
    /// Create an empty collection without a vectorizer.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vectorizer_name: None,
            vectorizer: None,
            distance: DistanceMetric::default(),
            dimension: None,
            objects: Vec::new(),
            ids: AHashSet::new(),
        }
    }

    /// Attach a vectorizer used to turn query text into vectors.
    pub fn with_vectorizer(mut self, vectorizer: Arc<dyn Vectorizer>) -> Self {
        self.vectorizer_name = Some(vectorizer.name().to_string());
        self.vectorizer = Some(vectorizer);
        self
    }

    pub fn with_distance(mut self, distance: DistanceMetric) -> Self {
        self.distance = distance;
        self
    }

    /// Load a collection from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Load a collection from JSON of the form
    /// `{"name", "vectorizer", "distance", "objects": [{"id", "properties", "vector"}]}`.
    ///
    /// A `"hashing"` vectorizer is attached automatically and fills in the
    /// vectors of objects that have none. Any other vectorizer name is kept
    /// as a setting only; text queries against it fail as unavailable.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: CollectionFile = serde_json::from_str(json)?;

        let mut collection = Self::new(file.name).with_distance(file.distance);
        match file.vectorizer.as_deref() {
            None | Some(NO_VECTORIZER) => {}
            Some(HashingVectorizer::NAME) => {
                collection = collection.with_vectorizer(Arc::new(HashingVectorizer::default()));
            }
            Some(other) => collection.vectorizer_name = Some(other.to_string()),
        }

        for object in file.objects {
            collection.add_object(object)?;
        }
        Ok(collection)
    }

    /// Add an object. Ids must be unique within the collection.
    ///
    /// Vectors must be non-empty, finite, and share one dimension. That
    /// dimension comes from the vectorizer when one is attached, otherwise
    /// from the first stored vector.
    pub fn add_object(&mut self, mut object: StoredObject) -> Result<()> {
        if self.ids.contains(&object.id) {
            return Err(VectoryError::invalid_parameter(format!(
                "duplicate object id '{}' in collection '{}'",
                object.id, self.name
            )));
        }
        if object.vector.is_none()
            && let Some(vectorizer) = &self.vectorizer
        {
            object.vector = Some(vectorizer.vectorize(&object.text())?);
        }
        if let Some(vector) = &object.vector {
            self.check_vector(vector).map_err(|e| {
                VectoryError::invalid_parameter(format!("object '{}': {e}", object.id))
            })?;
            self.dimension = Some(vector.len());
        }
        self.ids.insert(object.id.clone());
        self.objects.push(object);
        Ok(())
    }

    /// Check a vector against the collection's dimension.
    fn check_vector(&self, vector: &[f32]) -> std::result::Result<(), String> {
        if vector.is_empty() {
            return Err("vector is empty".to_string());
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err("vector has non-finite components".to_string());
        }
        match self.dimension() {
            Some(expected) if expected != vector.len() => Err(format!(
                "vector has dimension {}, collection '{}' uses {expected}",
                vector.len(),
                self.name
            )),
            _ => Ok(()),
        }
    }

    /// Vector dimension, once known.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
            .or_else(|| self.vectorizer.as_ref().map(|v| v.dimension()))
    }

    /// Objects whose properties match `filter`, in insertion order.
    pub fn filter_objects(&self, filter: &Payload, limit: usize) -> Vec<&StoredObject> {
        self.objects
            .iter()
            .filter(|object| matches_filter(&object.properties, filter))
            .take(limit)
            .collect()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn distance(&self) -> DistanceMetric {
        self.distance
    }

    /// Whether a vectorizer is configured (attached or named).
    pub fn has_vectorizer(&self) -> bool {
        self.vectorizer_name.is_some()
    }

    /// Configured vectorizer name, or `"none"`.
    pub fn vectorizer_name(&self) -> &str {
        self.vectorizer_name.as_deref().unwrap_or(NO_VECTORIZER)
    }

    /// Look up an object by id.
    pub fn get(&self, id: &str) -> Option<&StoredObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    fn check_collection(&self, requested: &str) -> Result<()> {
        if requested == self.name {
            Ok(())
        } else {
            Err(VectoryError::not_found(format!(
                "collection '{requested}' (loaded collection is '{}')",
                self.name
            )))
        }
    }

    /// Resolve the query vector, or `None` when vector search is unavailable.
    fn query_vector(&self, input: &VectorInput) -> Result<Option<Vec<f32>>> {
        match input {
            VectorInput::Vector(vector) => {
                self.check_vector(vector).map_err(|e| {
                    VectoryError::invalid_parameter(format!("query vector: {e}"))
                })?;
                Ok(Some(vector.clone()))
            }
            VectorInput::Text(text) => match (&self.vectorizer, &self.vectorizer_name) {
                (Some(vectorizer), _) => vectorizer.vectorize(text).map(Some),
                (None, Some(name)) => Err(VectoryError::search_unavailable(format!(
                    "vectorizer '{name}' of collection '{}' is not available locally",
                    self.name
                ))),
                (None, None) => Ok(None),
            },
        }
    }
}

fn keyword_score(object: &StoredObject, terms: &[String], properties: Option<&[String]>) -> f64 {
    let fields: Vec<&str> = match properties {
        Some(names) => names
            .iter()
            .filter_map(|name| object.properties.get(name))
            .filter_map(|value| value.as_str())
            .collect(),
        None => object
            .properties
            .values()
            .filter_map(|value| value.as_str())
            .collect(),
    };

    fields
        .into_iter()
        .flat_map(tokenize)
        .filter(|token| terms.contains(token))
        .count() as f64
}

impl KeywordSearchProvider for MemoryCollection {
    fn keyword_search(&self, query: &KeywordQuery) -> Result<SourceRanking> {
        self.check_collection(&query.collection)?;

        let terms: Vec<String> = tokenize(&query.text).collect();
        if terms.is_empty() {
            return Ok(SourceRanking::empty());
        }
        let properties = query.properties.as_deref();
        let filter = query.filter.as_ref();

        let entries: Vec<RankingEntry> = self
            .objects
            .par_iter()
            .filter(|object| filter.is_none_or(|f| matches_filter(&object.properties, f)))
            .filter_map(|object| {
                let score = keyword_score(object, &terms, properties);
                (score > 0.0).then(|| {
                    RankingEntry::new(object.id.clone(), score)
                        .with_payload(object.properties.clone())
                })
            })
            .collect();

        let mut ranking = SourceRanking::new(entries)?;
        ranking.truncate(query.limit);
        debug!(collection = %self.name, hits = ranking.len(), "keyword search");
        Ok(ranking)
    }
}

impl VectorSearchProvider for MemoryCollection {
    fn vector_search(&self, query: &VectorQuery) -> Result<VectorSearchOutcome> {
        self.check_collection(&query.collection)?;

        let Some(query_vector) = self.query_vector(&query.input)? else {
            return Ok(VectorSearchOutcome::Unavailable);
        };

        let filter = query.filter.as_ref();
        let scored = self
            .objects
            .par_iter()
            .filter(|object| filter.is_none_or(|f| matches_filter(&object.properties, f)))
            .filter_map(|object| {
                let vector = object.vector.as_ref()?;
                Some(
                    self.distance
                        .similarity(&query_vector, vector)
                        .map(|similarity| (object, similarity)),
                )
            })
            .collect::<Result<Vec<_>>>()?;

        let mut entries = Vec::with_capacity(scored.len());
        for (object, similarity) in scored {
            if !similarity.is_finite() {
                warn!(
                    collection = %self.name,
                    id = %object.id,
                    "skipping object with non-finite similarity"
                );
                continue;
            }
            entries.push(
                RankingEntry::new(object.id.clone(), similarity)
                    .with_payload(object.properties.clone()),
            );
        }

        let mut ranking = SourceRanking::new(entries)?;
        ranking.truncate(query.limit);
        debug!(collection = %self.name, hits = ranking.len(), "vector search");
        Ok(VectorSearchOutcome::Ranking(ranking))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn articles() -> MemoryCollection {
        let mut collection = MemoryCollection::new("Articles");
        collection
            .add_object(
                StoredObject::new("a")
                    .with_property("text", "Rust search engine, fast search")
                    .with_property("title", "Search")
                    .with_vector(vec![1.0, 0.0]),
            )
            .unwrap();
        collection
            .add_object(
                StoredObject::new("b")
                    .with_property("text", "vector databases")
                    .with_property("title", "Rust")
                    .with_vector(vec![0.0, 1.0]),
            )
            .unwrap();
        collection
            .add_object(StoredObject::new("c").with_property("text", "cooking recipes"))
            .unwrap();
        collection
    }

    fn keyword_query(text: &str, properties: Option<Vec<String>>) -> KeywordQuery {
        KeywordQuery {
            collection: "Articles".to_string(),
            text: text.to_string(),
            properties,
            filter: None,
            limit: 10,
        }
    }

    #[test]
    fn test_keyword_search_counts_terms() {
        let collection = articles();
        let ranking = collection
            .keyword_search(&keyword_query("search rust", None))
            .unwrap();

        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking.items()[0].id, "a");
        assert_eq!(ranking.items()[0].raw_score, 4.0);
        assert_eq!(ranking.items()[1].id, "b");
        assert_eq!(ranking.items()[1].raw_score, 1.0);
        assert_eq!(ranking.items()[0].payload["title"], "Search");
    }

    #[test]
    fn test_keyword_search_target_properties() {
        let collection = articles();
        let ranking = collection
            .keyword_search(&keyword_query("rust", Some(vec!["text".to_string()])))
            .unwrap();

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking.items()[0].id, "a");
    }

    #[test]
    fn test_keyword_search_empty_query() {
        let collection = articles();
        assert!(
            collection
                .keyword_search(&keyword_query("  !! ", None))
                .unwrap()
                .is_empty()
        );
    }

    #[test]
    fn test_vector_search_with_explicit_vector() {
        let collection = articles();
        let outcome = collection
            .vector_search(&VectorQuery {
                collection: "Articles".to_string(),
                input: VectorInput::Vector(vec![0.2, 0.9]),
                filter: None,
                limit: 10,
            })
            .unwrap();

        let ranking = outcome.into_ranking();
        // "c" has no vector and is skipped.
        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking.items()[0].id, "b");
    }

    #[test]
    fn test_vector_search_without_vectorizer_is_unavailable() {
        let collection = articles();
        let outcome = collection
            .vector_search(&VectorQuery {
                collection: "Articles".to_string(),
                input: VectorInput::Text("rust".to_string()),
                filter: None,
                limit: 10,
            })
            .unwrap();

        assert_eq!(outcome, VectorSearchOutcome::Unavailable);
        assert!(!collection.has_vectorizer());
        assert_eq!(collection.vectorizer_name(), "none");
    }

    #[test]
    fn test_vector_dimension_mismatch() {
        let collection = articles();
        let err = collection
            .vector_search(&VectorQuery {
                collection: "Articles".to_string(),
                input: VectorInput::Vector(vec![1.0, 0.0, 0.0]),
                filter: None,
                limit: 10,
            })
            .unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    #[test]
    fn test_unknown_collection() {
        let collection = articles();
        let mut query = keyword_query("rust", None);
        query.collection = "Other".to_string();

        let err = collection.keyword_search(&query).unwrap_err();
        assert!(matches!(err, VectoryError::NotFound(_)));
    }

    #[test]
    fn test_duplicate_object_rejected() {
        let mut collection = articles();
        let err = collection.add_object(StoredObject::new("a")).unwrap_err();
        assert!(err.is_invalid_parameter());
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_from_json_with_hashing_vectorizer() {
        let json = r#"{
            "name": "Notes",
            "vectorizer": "hashing",
            "objects": [
                {"id": "n1", "properties": {"text": "rust ownership and borrowing"}},
                {"id": "n2", "properties": {"text": "baking sourdough bread"}}
            ]
        }"#;
        let collection = MemoryCollection::from_json_str(json).unwrap();

        assert!(collection.has_vectorizer());
        assert!(collection.get("n1").unwrap().vector.is_some());

        let ranking = collection
            .vector_search(&VectorQuery {
                collection: "Notes".to_string(),
                input: VectorInput::Text("rust borrowing".to_string()),
                filter: None,
                limit: 1,
            })
            .unwrap()
            .into_ranking();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking.items()[0].id, "n1");
    }

    #[test]
    fn test_from_json_with_remote_vectorizer() {
        let json = r#"{
            "name": "Remote",
            "vectorizer": "text2vec-openai",
            "distance": "dot_product",
            "objects": [{"id": "r1", "properties": {"text": "x"}, "vector": [1.0, 2.0]}]
        }"#;
        let collection = MemoryCollection::from_json_str(json).unwrap();
        assert_eq!(collection.vectorizer_name(), "text2vec-openai");
        assert_eq!(collection.distance(), DistanceMetric::DotProduct);

        let err = collection
            .vector_search(&VectorQuery {
                collection: "Remote".to_string(),
                input: VectorInput::Text("x".to_string()),
                filter: None,
                limit: 5,
            })
            .unwrap_err();
        assert!(matches!(err, VectoryError::SearchUnavailable(_)));
    }

    #[test]
    fn test_large_dot_product_scores_stay_finite() {
        let json = r#"{
            "name": "Big",
            "distance": "dot_product",
            "objects": [
                {"id": "big", "properties": {}, "vector": [1e20, 1e20]},
                {"id": "small", "properties": {}, "vector": [1.0, 1.0]}
            ]
        }"#;
        let collection = MemoryCollection::from_json_str(json).unwrap();

        let ranking = collection
            .vector_search(&VectorQuery {
                collection: "Big".to_string(),
                input: VectorInput::Vector(vec![1e20, 1e20]),
                filter: None,
                limit: 10,
            })
            .unwrap()
            .into_ranking();

        assert_eq!(ranking.len(), 2);
        assert_eq!(ranking.items()[0].id, "big");
        assert!(ranking.items()[0].raw_score.is_finite());
        assert!((ranking.items()[0].raw_score / 2e40 - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_mixed_dimensions_rejected_at_load() {
        let json = r#"{
            "name": "Mixed",
            "objects": [
                {"id": "flat", "vector": [1.0, 0.0]},
                {"id": "deep", "vector": [1.0, 0.0, 0.0]}
            ]
        }"#;
        let err = MemoryCollection::from_json_str(json).err().unwrap();
        assert!(err.is_invalid_parameter());
        assert!(err.to_string().contains("'deep'"));
    }

    #[test]
    fn test_non_finite_vector_rejected_at_load() {
        // 1e39 overflows f32 and parses as infinity.
        let json = r#"{
            "name": "Huge",
            "objects": [{"id": "inf", "vector": [1e39, 0.0]}]
        }"#;
        let err = MemoryCollection::from_json_str(json).err().unwrap();
        assert!(err.is_invalid_parameter());
        assert!(err.to_string().contains("'inf'"));

        let mut collection = MemoryCollection::new("Empty");
        let err = collection
            .add_object(StoredObject::new("none").with_vector(Vec::new()))
            .unwrap_err();
        assert!(err.is_invalid_parameter());
        assert!(collection.is_empty());
    }

    #[test]
    fn test_vector_must_match_vectorizer_dimension() {
        let mut collection = MemoryCollection::new("Notes")
            .with_vectorizer(Arc::new(HashingVectorizer::new(8).unwrap()));
        assert_eq!(collection.dimension(), Some(8));

        let err = collection
            .add_object(StoredObject::new("n1").with_vector(vec![1.0, 0.0]))
            .unwrap_err();
        assert!(err.is_invalid_parameter());

        collection
            .add_object(StoredObject::new("n2").with_property("text", "rust"))
            .unwrap();
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get("n2").unwrap().vector.as_ref().unwrap().len(), 8);
    }

    #[test]
    fn test_non_finite_query_vector_rejected() {
        let collection = articles();
        assert_eq!(collection.dimension(), Some(2));

        let err = collection
            .vector_search(&VectorQuery {
                collection: "Articles".to_string(),
                input: VectorInput::Vector(vec![f32::NAN, 0.0]),
                filter: None,
                limit: 10,
            })
            .unwrap_err();
        assert!(err.is_invalid_parameter());
    }

    fn filter(name: &str, value: impl Into<serde_json::Value>) -> Payload {
        let mut filter = Payload::new();
        filter.insert(name.to_string(), value.into());
        filter
    }

    #[test]
    fn test_keyword_search_with_filter() {
        let collection = articles();
        let mut query = keyword_query("search rust", None);
        query.filter = Some(filter("title", "Rust"));

        let ranking = collection.keyword_search(&query).unwrap();
        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking.items()[0].id, "b");
        assert_eq!(ranking.items()[0].rank, 1);
    }

    #[test]
    fn test_vector_search_with_filter() {
        let collection = articles();
        let ranking = collection
            .vector_search(&VectorQuery {
                collection: "Articles".to_string(),
                input: VectorInput::Vector(vec![0.2, 0.9]),
                filter: Some(filter("title", "Search")),
                limit: 10,
            })
            .unwrap()
            .into_ranking();

        assert_eq!(ranking.len(), 1);
        assert_eq!(ranking.items()[0].id, "a");
    }

    #[test]
    fn test_filter_objects() {
        let collection = articles();

        let ids: Vec<&str> = collection
            .filter_objects(&Payload::new(), 10)
            .iter()
            .map(|object| object.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a", "b", "c"]);

        let ids: Vec<&str> = collection
            .filter_objects(&filter("text", "cooking recipes"), 10)
            .iter()
            .map(|object| object.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c"]);

        assert_eq!(collection.filter_objects(&Payload::new(), 2).len(), 2);
        assert!(collection.filter_objects(&filter("title", "Go"), 10).is_empty());
    }
}
