//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into the services. Request
//! handling never reads process-wide environment variables. The `*_from_env_value` helpers take
//! the raw `Option<String>` so binaries own the environment access and tests can call them
//! directly.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_EXTRACTION_TIMEOUT_MS, DEFAULT_RETRIEVAL_TIMEOUT_MS, DEFAULT_TOP_K, MAX_TOP_K,
};
use crate::{ServiceError, ServiceResult};

/// Which [`crate::notes::FieldExtractor`] the structurer uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExtractorKind {
    #[default]
    RuleBased,
    Null,
}

impl FromStr for ExtractorKind {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rules" | "rule-based" => Ok(Self::RuleBased),
            "null" | "none" => Ok(Self::Null),
            other => Err(ServiceError::InvalidInput(format!(
                "unknown extractor '{other}' (expected 'rules' or 'null')"
            ))),
        }
    }
}

/// Where the retriever's [`crate::retrieval::ContextIndex`] comes from.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum IndexSource {
    #[default]
    Empty,
    KnowledgeDir(PathBuf),
    Remote(String),
}

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    extractor: ExtractorKind,
    index_source: IndexSource,
    top_k: usize,
    min_score: Option<f32>,
    extraction_timeout: Duration,
    retrieval_timeout: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            extractor: ExtractorKind::default(),
            index_source: IndexSource::default(),
            top_k: DEFAULT_TOP_K,
            min_score: None,
            extraction_timeout: Duration::from_millis(DEFAULT_EXTRACTION_TIMEOUT_MS),
            retrieval_timeout: Duration::from_millis(DEFAULT_RETRIEVAL_TIMEOUT_MS),
        }
    }
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::InvalidInput`] if `top_k` is outside `1..=MAX_TOP_K`, a timeout is
    /// zero, or `min_score` is not finite.
    pub fn new(
        extractor: ExtractorKind,
        index_source: IndexSource,
        top_k: usize,
        min_score: Option<f32>,
        extraction_timeout: Duration,
        retrieval_timeout: Duration,
    ) -> ServiceResult<Self> {
        validate_top_k(top_k)?;
        if extraction_timeout.is_zero() || retrieval_timeout.is_zero() {
            return Err(ServiceError::InvalidInput(
                "timeouts must be greater than zero".into(),
            ));
        }
        if min_score.is_some_and(|s| !s.is_finite()) {
            return Err(ServiceError::InvalidInput(
                "min_score must be a finite number".into(),
            ));
        }

        Ok(Self {
            extractor,
            index_source,
            top_k,
            min_score,
            extraction_timeout,
            retrieval_timeout,
        })
    }

    pub fn with_extractor(mut self, extractor: ExtractorKind) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn extractor(&self) -> ExtractorKind {
        self.extractor
    }

    pub fn index_source(&self) -> &IndexSource {
        &self.index_source
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }

    pub fn min_score(&self) -> Option<f32> {
        self.min_score
    }

    pub fn extraction_timeout(&self) -> Duration {
        self.extraction_timeout
    }

    pub fn retrieval_timeout(&self) -> Duration {
        self.retrieval_timeout
    }
}

fn validate_top_k(top_k: usize) -> ServiceResult<()> {
    if top_k == 0 || top_k > MAX_TOP_K {
        return Err(ServiceError::InvalidInput(format!(
            "top_k must be between 1 and {MAX_TOP_K}, got {top_k}"
        )));
    }
    Ok(())
}

/// Treats unset and blank values alike.
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Parse the extractor kind; unset or blank selects the rule-based extractor.
pub fn extractor_kind_from_env_value(value: Option<String>) -> ServiceResult<ExtractorKind> {
    non_blank(value)
        .map(|v| v.parse::<ExtractorKind>())
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Resolve the index source. A remote URL takes precedence over a knowledge directory.
pub fn index_source_from_env_values(
    index_url: Option<String>,
    knowledge_dir: Option<String>,
) -> IndexSource {
    match (non_blank(index_url), non_blank(knowledge_dir)) {
        (Some(url), _) => IndexSource::Remote(url),
        (None, Some(dir)) => IndexSource::KnowledgeDir(PathBuf::from(dir)),
        (None, None) => IndexSource::Empty,
    }
}

pub fn top_k_from_env_value(value: Option<String>) -> ServiceResult<usize> {
    let Some(raw) = non_blank(value) else {
        return Ok(DEFAULT_TOP_K);
    };
    let top_k = raw
        .parse::<usize>()
        .map_err(|_| ServiceError::InvalidInput(format!("top_k is not a number: '{raw}'")))?;
    validate_top_k(top_k)?;
    Ok(top_k)
}

pub fn min_score_from_env_value(value: Option<String>) -> ServiceResult<Option<f32>> {
    non_blank(value)
        .map(|raw| {
            raw.parse::<f32>()
                .ok()
                .filter(|s| s.is_finite())
                .ok_or_else(|| ServiceError::InvalidInput(format!("invalid min_score: '{raw}'")))
        })
        .transpose()
}

/// Parse a timeout in milliseconds, falling back to `default_ms` when unset.
pub fn timeout_from_env_value(value: Option<String>, default_ms: u64) -> ServiceResult<Duration> {
    let ms = match non_blank(value) {
        None => default_ms,
        Some(raw) => raw
            .parse::<u64>()
            .ok()
            .filter(|ms| *ms > 0)
            .ok_or_else(|| ServiceError::InvalidInput(format!("invalid timeout: '{raw}'")))?,
    };
    Ok(Duration::from_millis(ms))
}
