use std::time::Duration;

/// Failures reported by a [`crate::retrieval::ContextIndex`] collaborator.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("context index unavailable: {0}")]
    Unavailable(String),
    #[error("context index returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Errors surfaced by the note-structuring and retrieval services.
///
/// Not finding a field in a note is deliberately absent from this enum: it is represented as an
/// empty field on the resulting record.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(#[from] IndexError),
    #[error("retrieval timed out after {}ms", .0.as_millis())]
    RetrievalTimeout(Duration),
    #[error("field extraction timed out after {}ms", .0.as_millis())]
    ExtractionTimeout(Duration),
    #[error("failed to read knowledge documents: {0}")]
    KnowledgeRead(std::io::Error),
}

pub type ServiceResult<T> = std::result::Result<T, ServiceError>;
