//! Hybrid search execution.
//!
//! [`HybridSearcher`] fetches a keyword ranking and a vector ranking from its
//! providers and fuses them with the configured algorithm.

use std::time::Instant;

use tracing::{debug, info};

use crate::error::{Result, VectoryError};
use crate::hybrid::config::HybridSearchConfig;
use crate::hybrid::engine::FusionEngine;
use crate::hybrid::provider::{
    KeywordQuery, KeywordSearchProvider, VectorInput, VectorQuery, VectorSearchProvider,
};
use crate::hybrid::types::HybridSearchResults;

/// A hybrid search request: query text, an optional explicit vector and the
/// fusion settings.
///
/// # Examples
///
/// ```
/// use vectory::hybrid::config::HybridSearchConfig;
/// use vectory::hybrid::searcher::HybridSearchRequest;
///
/// let request = HybridSearchRequest::new("Articles", "education research")
///     .with_vector(vec![0.1, 0.2, 0.3])
///     .with_config(HybridSearchConfig::default().with_alpha(0.7));
/// assert_eq!(request.config.alpha, 0.7);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct HybridSearchRequest {
    /// Collection to search.
    pub collection: String,
    /// Query text for the keyword search, and for the vectorizer when no
    /// vector is given.
    pub text: String,
    /// Explicit query vector.
    pub vector: Option<Vec<f32>>,
    /// Fusion settings.
    pub config: HybridSearchConfig,
}

impl HybridSearchRequest {
    pub fn new(collection: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            text: text.into(),
            vector: None,
            config: HybridSearchConfig::default(),
        }
    }

    /// Use an explicit query vector instead of vectorizing the text.
    pub fn with_vector(mut self, vector: Vec<f32>) -> Self {
        self.vector = Some(vector);
        self
    }

    pub fn with_config(mut self, config: HybridSearchConfig) -> Self {
        self.config = config;
        self
    }

    fn keyword_query(&self) -> KeywordQuery {
        KeywordQuery {
            collection: self.collection.clone(),
            text: self.text.clone(),
            properties: self.config.properties.clone(),
            filter: self.config.filter.clone(),
            limit: self.config.limit,
        }
    }

    fn vector_query(&self) -> VectorQuery {
        let input = match &self.vector {
            Some(vector) => VectorInput::Vector(vector.clone()),
            None => VectorInput::Text(self.text.clone()),
        };
        VectorQuery {
            collection: self.collection.clone(),
            input,
            filter: self.config.filter.clone(),
            limit: self.config.limit,
        }
    }
}

/// Runs hybrid searches against a pair of providers.
pub struct HybridSearcher<K, V> {
    keyword: K,
    vector: V,
}

impl<K, V> HybridSearcher<K, V>
where
    K: KeywordSearchProvider,
    V: VectorSearchProvider,
{
    pub fn new(keyword: K, vector: V) -> Self {
        Self { keyword, vector }
    }

    /// Execute a hybrid search.
    ///
    /// Parameters are validated before either provider is called. Provider
    /// errors are returned unchanged. A vector source that reports
    /// `Unavailable` contributes an empty ranking, unless the request
    /// disables `vectorizer_fallback`.
    pub fn search(&self, request: &HybridSearchRequest) -> Result<HybridSearchResults> {
        let engine = FusionEngine::from_config(&request.config)?;
        request.config.validate()?;

        let start = Instant::now();

        let keyword_ranking = self.keyword.keyword_search(&request.keyword_query())?;
        let outcome = self.vector.vector_search(&request.vector_query())?;

        let vector_available = outcome.is_available();
        if !vector_available {
            if !request.config.vectorizer_fallback {
                return Err(VectoryError::search_unavailable(format!(
                    "collection '{}' has no vectorizer and no query vector was supplied",
                    request.collection
                )));
            }
            debug!(
                collection = %request.collection,
                "vector search unavailable, using keyword results only"
            );
        }
        let vector_ranking = outcome.into_ranking();

        let results = engine.fuse(&keyword_ranking, &vector_ranking);
        let took_ms = start.elapsed().as_millis() as u64;

        info!(
            collection = %request.collection,
            keyword_matches = keyword_ranking.len(),
            vector_matches = vector_ranking.len(),
            results = results.len(),
            took_ms,
            "hybrid search complete"
        );

        Ok(HybridSearchResults {
            results,
            keyword_matches: keyword_ranking.len(),
            vector_matches: vector_ranking.len(),
            vector_available,
            fusion_type: engine.fusion_type(),
            alpha: engine.alpha(),
            took_ms,
            query_text: request.text.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::hybrid::fusion::FusionType;
    use crate::hybrid::provider::VectorSearchOutcome;
    use crate::hybrid::types::{Payload, SourceRanking};

    struct FixedKeyword(SourceRanking);

    impl KeywordSearchProvider for FixedKeyword {
        fn keyword_search(&self, _query: &KeywordQuery) -> Result<SourceRanking> {
            Ok(self.0.clone())
        }
    }

    struct FixedVector(Option<SourceRanking>);

    impl VectorSearchProvider for FixedVector {
        fn vector_search(&self, _query: &VectorQuery) -> Result<VectorSearchOutcome> {
            Ok(match &self.0 {
                Some(ranking) => VectorSearchOutcome::Ranking(ranking.clone()),
                None => VectorSearchOutcome::Unavailable,
            })
        }
    }

    struct Failing;

    impl KeywordSearchProvider for Failing {
        fn keyword_search(&self, _query: &KeywordQuery) -> Result<SourceRanking> {
            Err(VectoryError::search_unavailable("connection refused"))
        }
    }

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl VectorSearchProvider for Counting {
        fn vector_search(&self, query: &VectorQuery) -> Result<VectorSearchOutcome> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert!(matches!(query.input, VectorInput::Vector(_)));
            Ok(VectorSearchOutcome::Ranking(SourceRanking::empty()))
        }
    }

    /// Answers both searches and records the filters it was given.
    #[derive(Default)]
    struct FilterRecorder {
        filters: std::sync::Mutex<Vec<Option<Payload>>>,
    }

    impl KeywordSearchProvider for FilterRecorder {
        fn keyword_search(&self, query: &KeywordQuery) -> Result<SourceRanking> {
            self.filters.lock().unwrap().push(query.filter.clone());
            Ok(SourceRanking::empty())
        }
    }

    impl VectorSearchProvider for FilterRecorder {
        fn vector_search(&self, query: &VectorQuery) -> Result<VectorSearchOutcome> {
            self.filters.lock().unwrap().push(query.filter.clone());
            Ok(VectorSearchOutcome::Ranking(SourceRanking::empty()))
        }
    }

    fn keyword() -> FixedKeyword {
        FixedKeyword(SourceRanking::from_scores([("A", 2.0), ("B", 1.0)]).unwrap())
    }

    #[test]
    fn test_search_fuses_both_sources() {
        let vector = FixedVector(Some(
            SourceRanking::from_scores([("B", 0.9), ("C", 0.8)]).unwrap(),
        ));
        let searcher = HybridSearcher::new(keyword(), vector);

        let results = searcher
            .search(&HybridSearchRequest::new("Docs", "query"))
            .unwrap();

        let ids: Vec<&str> = results.results.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["B", "A", "C"]);
        assert_eq!(results.keyword_matches, 2);
        assert_eq!(results.vector_matches, 2);
        assert!(results.vector_available);
        assert_eq!(results.fusion_type, FusionType::Ranked);
        assert_eq!(results.query_text, "query");
    }

    #[test]
    fn test_unavailable_vector_falls_back() {
        let searcher = HybridSearcher::new(keyword(), FixedVector(None));

        let results = searcher
            .search(&HybridSearchRequest::new("Docs", "query"))
            .unwrap();

        assert!(!results.vector_available);
        assert_eq!(results.vector_matches, 0);
        assert_eq!(results.best_result().unwrap().id, "A");
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_unavailable_vector_without_fallback() {
        let searcher = HybridSearcher::new(keyword(), FixedVector(None));
        let request = HybridSearchRequest::new("Docs", "query")
            .with_config(HybridSearchConfig::default().with_vectorizer_fallback(false));

        let err = searcher.search(&request).unwrap_err();
        assert!(matches!(err, VectoryError::SearchUnavailable(_)));
    }

    #[test]
    fn test_provider_error_propagates() {
        let searcher = HybridSearcher::new(Failing, FixedVector(None));

        let err = searcher
            .search(&HybridSearchRequest::new("Docs", "query"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Search unavailable: connection refused");
    }

    #[test]
    fn test_invalid_parameters_checked_before_fetch() {
        let counting = Counting::default();
        let searcher = HybridSearcher::new(keyword(), &counting);
        let request = HybridSearchRequest::new("Docs", "query")
            .with_vector(vec![1.0])
            .with_config(HybridSearchConfig::default().with_alpha(1.5));

        assert!(searcher.search(&request).unwrap_err().is_invalid_parameter());
        assert_eq!(counting.calls.load(Ordering::SeqCst), 0);

        let request = request.with_config(HybridSearchConfig::default());
        assert!(searcher.search(&request).is_ok());
        assert_eq!(counting.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_filter_reaches_both_providers() {
        let recorder = FilterRecorder::default();
        let searcher = HybridSearcher::new(&recorder, &recorder);

        let mut filter = Payload::new();
        filter.insert("lang".to_string(), serde_json::json!("rust"));
        let request = HybridSearchRequest::new("Docs", "query")
            .with_config(HybridSearchConfig::default().with_filter(filter.clone()));
        searcher.search(&request).unwrap();

        let filters = recorder.filters.lock().unwrap();
        assert_eq!(*filters, vec![Some(filter.clone()), Some(filter)]);
    }
}
