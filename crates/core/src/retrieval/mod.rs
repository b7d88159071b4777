//! Context retrieval for the RAG pipeline.
//!
//! [`ContextRetriever`] asks an injected [`ContextIndex`] for candidate chunks and returns them
//! ranked by relevance. It never generates text; the downstream generation step is out of scope.

pub mod chunker;
pub mod embedding;
pub mod memory;
pub mod remote;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{CoreConfig, IndexSource};
use crate::{IndexError, ServiceError, ServiceResult};

pub use memory::MemoryIndex;
pub use remote::RemoteIndex;

/// A chunk as returned by a [`ContextIndex`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub text: String,
    pub score: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// A ranked chunk in a [`RetrievalResult`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ContextChunk {
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl From<ScoredChunk> for ContextChunk {
    fn from(chunk: ScoredChunk) -> Self {
        Self {
            text: chunk.text,
            score: Some(chunk.score),
            source: chunk.source,
        }
    }
}

/// Output of [`ContextRetriever::retrieve`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    /// The query, echoed verbatim.
    pub query: String,
    /// Chunks in non-increasing relevance order.
    pub chunks: Vec<ContextChunk>,
}

impl RetrievalResult {
    pub fn empty(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            chunks: Vec::new(),
        }
    }
}

/// Backing store searched by [`ContextRetriever`].
///
/// Implementations must be read-only with respect to `search`.
#[async_trait]
pub trait ContextIndex: Send + Sync {
    /// Returns up to `k` chunks relevant to `query`, each with a relevance score.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>, IndexError>;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Index with no content.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyIndex;

#[async_trait]
impl ContextIndex for EmptyIndex {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
        Ok(Vec::new())
    }

    fn name(&self) -> &'static str {
        "empty"
    }
}

/// Retrieval service.
#[derive(Clone)]
pub struct ContextRetriever {
    index: Arc<dyn ContextIndex>,
    top_k: usize,
    min_score: Option<f32>,
    timeout: Duration,
}

impl ContextRetriever {
    pub fn new(index: Arc<dyn ContextIndex>, top_k: usize, timeout: Duration) -> Self {
        Self {
            index,
            top_k,
            min_score: None,
            timeout,
        }
    }

    pub fn with_min_score(mut self, min_score: Option<f32>) -> Self {
        self.min_score = min_score;
        self
    }

    /// Builds a retriever over the index described by `cfg`.
    ///
    /// A knowledge directory is read eagerly, so this is meant to run once at startup.
    ///
    /// # Errors
    ///
    /// Returns an error if the knowledge directory cannot be read or the remote index URL is
    /// invalid.
    pub fn from_config(cfg: &CoreConfig) -> ServiceResult<Self> {
        let index: Arc<dyn ContextIndex> = match cfg.index_source() {
            IndexSource::Empty => Arc::new(EmptyIndex),
            IndexSource::KnowledgeDir(dir) => Arc::new(MemoryIndex::from_dir(dir)?),
            IndexSource::Remote(url) => Arc::new(RemoteIndex::new(url)?),
        };
        tracing::info!("context retriever using '{}' index", index.name());
        Ok(Self::new(index, cfg.top_k(), cfg.retrieval_timeout()).with_min_score(cfg.min_score()))
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieves context chunks for `query`.
    ///
    /// The result always echoes `query` unchanged. An empty or whitespace-only query returns no
    /// chunks without consulting the index.
    ///
    /// # Errors
    ///
    /// - [`ServiceError::RetrievalUnavailable`] if the index cannot serve the request.
    /// - [`ServiceError::RetrievalTimeout`] if the index does not answer in time.
    pub async fn retrieve(&self, query: &str) -> ServiceResult<RetrievalResult> {
        if query.trim().is_empty() {
            return Ok(RetrievalResult::empty(query));
        }

        let scored = match tokio::time::timeout(self.timeout, self.index.search(query, self.top_k))
            .await
        {
            Err(_) => {
                tracing::error!("index '{}' exceeded {:?}", self.index.name(), self.timeout);
                return Err(ServiceError::RetrievalTimeout(self.timeout));
            }
            Ok(Err(e)) => {
                tracing::error!("index '{}' failed: {}", self.index.name(), e);
                return Err(ServiceError::RetrievalUnavailable(e));
            }
            Ok(Ok(scored)) => scored,
        };

        let chunks = rank(scored, self.top_k, self.min_score);
        tracing::debug!(index = self.index.name(), chunks = chunks.len(), "retrieved context");

        Ok(RetrievalResult {
            query: query.to_string(),
            chunks,
        })
    }
}

/// Orders chunks by non-increasing score, keeping index order for ties.
///
/// Non-finite scores and scores under `min_score` are dropped before truncating to `top_k`.
/// Collaborators are not trusted to return sorted results.
fn rank(mut scored: Vec<ScoredChunk>, top_k: usize, min_score: Option<f32>) -> Vec<ContextChunk> {
    scored.retain(|c| c.score.is_finite() && min_score.map_or(true, |min| c.score >= min));
    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);
    scored.into_iter().map(ContextChunk::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn texts(result: &RetrievalResult) -> Vec<&str> {
        result.chunks.iter().map(|c| c.text.as_str()).collect()
    }

    /// Returns a fixed list regardless of the query and counts calls.
    struct FixedIndex {
        chunks: Vec<ScoredChunk>,
        calls: AtomicUsize,
    }

    impl FixedIndex {
        fn new(scores: &[(&str, f32)]) -> Self {
            Self {
                chunks: scores
                    .iter()
                    .map(|(text, score)| ScoredChunk {
                        text: text.to_string(),
                        score: *score,
                        source: None,
                    })
                    .collect(),
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ContextIndex for FixedIndex {
        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.chunks.clone())
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    struct DownIndex;

    #[async_trait]
    impl ContextIndex for DownIndex {
        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
            Err(IndexError::Unavailable("connection refused".into()))
        }

        fn name(&self) -> &'static str {
            "down"
        }
    }

    struct StalledIndex;

    #[async_trait]
    impl ContextIndex for StalledIndex {
        async fn search(&self, _query: &str, _k: usize) -> Result<Vec<ScoredChunk>, IndexError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            Ok(Vec::new())
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    fn retriever(index: Arc<dyn ContextIndex>, top_k: usize) -> ContextRetriever {
        ContextRetriever::new(index, top_k, Duration::from_secs(1))
    }

    #[tokio::test]
    async fn empty_query_returns_no_chunks_without_searching() {
        let index = Arc::new(FixedIndex::new(&[("a", 1.0)]));
        let r = retriever(index.clone(), 5);
        for query in ["", "   ", "\n\t"] {
            let result = r.retrieve(query).await.unwrap();
            assert_eq!(result.query, query);
            assert!(result.chunks.is_empty());
        }
        assert_eq!(index.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn query_is_echoed_verbatim() {
        let r = retriever(Arc::new(EmptyIndex), 5);
        for query in ["dose de toxina", "  padded  ", "Ácido hialurônico?"] {
            assert_eq!(r.retrieve(query).await.unwrap().query, query);
        }
    }

    #[tokio::test]
    async fn chunks_are_in_non_increasing_score_order() {
        let index = Arc::new(FixedIndex::new(&[
            ("low", 0.1),
            ("high", 0.9),
            ("tie-first", 0.5),
            ("tie-second", 0.5),
        ]));
        let result = retriever(index, 10).retrieve("q").await.unwrap();
        assert_eq!(texts(&result), vec!["high", "tie-first", "tie-second", "low"]);
        let scores: Vec<f32> = result.chunks.iter().filter_map(|c| c.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn ranking_truncates_and_filters() {
        let index = Arc::new(FixedIndex::new(&[
            ("nan", f32::NAN),
            ("a", 0.8),
            ("b", 0.6),
            ("c", 0.2),
        ]));
        let r = retriever(index, 2).with_min_score(Some(0.3));
        let result = r.retrieve("q").await.unwrap();
        assert_eq!(texts(&result), vec!["a", "b"]);
    }

    #[tokio::test]
    async fn unreachable_index_is_reported() {
        let err = retriever(Arc::new(DownIndex), 5).retrieve("q").await.unwrap_err();
        assert!(matches!(
            err,
            ServiceError::RetrievalUnavailable(IndexError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn slow_index_times_out() {
        let r = ContextRetriever::new(Arc::new(StalledIndex), 5, Duration::from_millis(20));
        let err = r.retrieve("q").await.unwrap_err();
        assert!(matches!(err, ServiceError::RetrievalTimeout(_)));
    }

    fn knowledge_index() -> Arc<MemoryIndex> {
        let mut index = MemoryIndex::new();
        index.add_document("toxina.md", "Toxina botulínica: diluir em 2,5 ml de soro.");
        index.add_document("peeling.md", "Após peeling químico evitar exposição solar.");
        index.add_document("fios.md", "Fios de PDO promovem sustentação e colágeno.");
        Arc::new(index)
    }

    proptest! {
        #[test]
        fn ranked_scores_never_increase(
            scores in prop::collection::vec(any::<f32>(), 0..40),
            top_k in 1usize..20,
            min_score in prop::option::of(-1.0f32..1.0),
        ) {
            let scored = scores
                .iter()
                .enumerate()
                .map(|(i, score)| ScoredChunk {
                    text: i.to_string(),
                    score: *score,
                    source: None,
                })
                .collect();
            let ranked: Vec<f32> = rank(scored, top_k, min_score)
                .iter()
                .map(|c| c.score.unwrap_or(f32::NAN))
                .collect();

            prop_assert!(ranked.len() <= top_k);
            prop_assert!(ranked
                .iter()
                .all(|s| s.is_finite() && min_score.map_or(true, |min| *s >= min)));
            prop_assert!(ranked.windows(2).all(|w| w[0] >= w[1]));
        }

        #[test]
        fn query_is_echoed_and_chunks_ordered_for_any_input(query in any::<String>()) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()
                .unwrap();
            let result = rt
                .block_on(retriever(knowledge_index(), 5).retrieve(&query))
                .unwrap();

            let scores: Vec<f32> = result.chunks.iter().filter_map(|c| c.score).collect();
            prop_assert!(scores.windows(2).all(|w| w[0] >= w[1]));
            prop_assert!(result.chunks.len() <= 5);
            prop_assert_eq!(result.query, query);
        }
    }

    #[tokio::test]
    async fn retrieval_is_stable_for_identical_state() {
        let index = Arc::new(FixedIndex::new(&[("x", 0.5), ("y", 0.5), ("z", 0.7)]));
        let r = retriever(index, 5);
        let first = r.retrieve("q").await.unwrap();
        let second = r.retrieve("q").await.unwrap();
        assert_eq!(first, second);
    }
}
