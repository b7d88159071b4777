//! Note structuring.
//!
//! Turns a free-text clinical note into a [`NoteRecord`]. The structurer itself only enforces the
//! record invariants (the raw text is carried through untouched, empty input yields an empty
//! record) and bounds the call to the injected [`FieldExtractor`]; the extraction strategy is
//! swappable.

pub mod catalog;
pub mod rules;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{CoreConfig, ExtractorKind};
use crate::{ServiceError, ServiceResult};

pub use rules::RuleBasedExtractor;

/// The derived fields of a clinical note, as produced by a [`FieldExtractor`].
///
/// Every field may be absent: a field that could not be found is left empty rather than guessed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedFields {
    pub patient: Option<String>,
    pub age: Option<u32>,
    pub procedures_performed: Vec<String>,
    pub follow_up: Option<String>,
    pub procedures_suggested: Vec<String>,
}

impl ExtractedFields {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Structured view of a clinical note.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub patient: Option<String>,
    pub age: Option<u32>,
    pub procedures_performed: Vec<String>,
    pub follow_up: Option<String>,
    pub procedures_suggested: Vec<String>,
    /// Exact copy of the input text.
    pub raw_text: String,
}

impl NoteRecord {
    /// Builds a record from extracted fields, carrying `raw_text` through verbatim.
    pub fn from_fields(raw_text: impl Into<String>, fields: ExtractedFields) -> Self {
        Self {
            patient: fields.patient,
            age: fields.age,
            procedures_performed: fields.procedures_performed,
            follow_up: fields.follow_up,
            procedures_suggested: fields.procedures_suggested,
            raw_text: raw_text.into(),
        }
    }

    /// A record with every derived field absent.
    pub fn unextracted(raw_text: impl Into<String>) -> Self {
        Self::from_fields(raw_text, ExtractedFields::default())
    }
}

/// Strategy that derives [`ExtractedFields`] from note text.
///
/// Implementations may be rule-based, model-based or a call to an external service. Failing to
/// find something is not an error, so the method is infallible; slow collaborators are bounded
/// by the caller's timeout instead.
#[async_trait]
pub trait FieldExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> ExtractedFields;

    /// Short identifier used in logs.
    fn name(&self) -> &'static str;
}

/// Extractor that never finds anything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullExtractor;

#[async_trait]
impl FieldExtractor for NullExtractor {
    async fn extract(&self, _text: &str) -> ExtractedFields {
        ExtractedFields::default()
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

/// Note structuring service.
///
/// Cheap to clone; the extractor is shared behind an `Arc` and never mutated, so concurrent
/// requests need no coordination.
#[derive(Clone)]
pub struct NoteStructurer {
    extractor: Arc<dyn FieldExtractor>,
    timeout: Duration,
}

impl NoteStructurer {
    pub fn new(extractor: Arc<dyn FieldExtractor>, timeout: Duration) -> Self {
        Self { extractor, timeout }
    }

    /// Builds a structurer using the extractor selected in `cfg`.
    pub fn from_config(cfg: &CoreConfig) -> Self {
        let extractor: Arc<dyn FieldExtractor> = match cfg.extractor() {
            ExtractorKind::RuleBased => Arc::new(RuleBasedExtractor::new()),
            ExtractorKind::Null => Arc::new(NullExtractor),
        };
        Self::new(extractor, cfg.extraction_timeout())
    }

    pub fn extractor_name(&self) -> &'static str {
        self.extractor.name()
    }

    /// Structures a clinical note.
    ///
    /// The returned record's `raw_text` is always exactly `text`. Empty input short-circuits to
    /// a record with every derived field absent.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::ExtractionTimeout`] if the extractor does not answer within the
    /// configured budget.
    pub async fn structure(&self, text: &str) -> ServiceResult<NoteRecord> {
        if text.is_empty() {
            return Ok(NoteRecord::unextracted(text));
        }

        let fields = tokio::time::timeout(self.timeout, self.extractor.extract(text))
            .await
            .map_err(|_| {
                tracing::error!(
                    "extractor '{}' exceeded {:?}",
                    self.extractor.name(),
                    self.timeout
                );
                ServiceError::ExtractionTimeout(self.timeout)
            })?;

        tracing::debug!(
            extractor = self.extractor.name(),
            procedures = fields.procedures_performed.len(),
            suggested = fields.procedures_suggested.len(),
            "structured note"
        );

        Ok(NoteRecord::from_fields(text, fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    struct StalledExtractor;

    #[async_trait]
    impl FieldExtractor for StalledExtractor {
        async fn extract(&self, _text: &str) -> ExtractedFields {
            tokio::time::sleep(Duration::from_secs(30)).await;
            ExtractedFields::default()
        }

        fn name(&self) -> &'static str {
            "stalled"
        }
    }

    /// Returns a fixed patient so tests can tell whether the extractor ran.
    struct FixedExtractor;

    #[async_trait]
    impl FieldExtractor for FixedExtractor {
        async fn extract(&self, _text: &str) -> ExtractedFields {
            ExtractedFields {
                patient: Some("Fixed".into()),
                ..Default::default()
            }
        }

        fn name(&self) -> &'static str {
            "fixed"
        }
    }

    fn structurer(extractor: impl FieldExtractor + 'static) -> NoteStructurer {
        NoteStructurer::new(Arc::new(extractor), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn raw_text_is_carried_verbatim() {
        let s = structurer(RuleBasedExtractor::new());
        for input in [
            "Jane Doe, 45, rhinoplasty",
            "  leading and trailing  ",
            "linha 1\nlinha 2\r\n\ttab",
            "Aplicação de toxina — glabela 🙂",
        ] {
            let record = s.structure(input).await.unwrap();
            assert_eq!(record.raw_text, input);
        }
    }

    #[tokio::test]
    async fn empty_input_skips_the_extractor() {
        let record = structurer(FixedExtractor).structure("").await.unwrap();
        assert_eq!(record, NoteRecord::unextracted(""));
        assert!(record.patient.is_none());
        assert!(record.age.is_none());
        assert!(record.procedures_performed.is_empty());
        assert!(record.follow_up.is_none());
        assert!(record.procedures_suggested.is_empty());
    }

    #[tokio::test]
    async fn structuring_is_deterministic() {
        let s = structurer(RuleBasedExtractor::new());
        let note = "Paciente: Maria Silva, 38 anos. Aplicado botox na glabela. Retorno em 15 dias.";
        let first = s.structure(note).await.unwrap();
        let second = s.structure(note).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn null_extractor_leaves_fields_absent() {
        let record = structurer(NullExtractor)
            .structure("Jane Doe, 45, rhinoplasty")
            .await
            .unwrap();
        assert_eq!(record, NoteRecord::unextracted("Jane Doe, 45, rhinoplasty"));
    }

    #[tokio::test]
    async fn slow_extractor_times_out() {
        let s = NoteStructurer::new(Arc::new(StalledExtractor), Duration::from_millis(20));
        let err = s.structure("anything").await.unwrap_err();
        assert!(matches!(err, ServiceError::ExtractionTimeout(d) if d == Duration::from_millis(20)));
    }

    fn runtime() -> tokio::runtime::Runtime {
        tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .unwrap()
    }

    proptest! {
        #[test]
        fn raw_text_is_carried_verbatim_for_any_input(text in any::<String>()) {
            let record = runtime()
                .block_on(structurer(RuleBasedExtractor::new()).structure(&text))
                .unwrap();
            prop_assert_eq!(record.raw_text, text);
        }

        #[test]
        fn structuring_is_deterministic_for_note_like_input(
            text in "[A-Za-zÀ-ú0-9 ,.;:\n-]{0,120}"
        ) {
            let rt = runtime();
            let s = structurer(RuleBasedExtractor::new());
            let first = rt.block_on(s.structure(&text)).unwrap();
            let second = rt.block_on(s.structure(&text)).unwrap();
            prop_assert_eq!(first, second);
        }
    }

    #[test]
    fn from_config_picks_extractor() {
        let cfg = CoreConfig::default().with_extractor(ExtractorKind::Null);
        assert_eq!(NoteStructurer::from_config(&cfg).extractor_name(), "null");
        let cfg = CoreConfig::default();
        assert_eq!(NoteStructurer::from_config(&cfg).extractor_name(), "rules");
    }
}
