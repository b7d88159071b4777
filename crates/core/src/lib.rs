//! # HarmoniFace Core
//!
//! Core logic for the HarmoniFace clinical AI service.
//!
//! This crate contains the two independent components of the service:
//! - [`notes`]: structuring free-text clinical notes into [`NoteRecord`]s through a pluggable
//!   [`FieldExtractor`]
//! - [`retrieval`]: ranked context retrieval for a RAG pipeline through a pluggable
//!   [`ContextIndex`]
//!
//! **No API concerns**: HTTP servers, request validation and wire formats belong in `api-rest`
//! and `api-shared`.

pub mod config;
pub mod constants;
pub mod error;
pub mod notes;
pub mod retrieval;
pub mod text;

pub use config::{CoreConfig, ExtractorKind, IndexSource};
pub use error::{IndexError, ServiceError, ServiceResult};
pub use notes::{
    ExtractedFields, FieldExtractor, NoteRecord, NoteStructurer, NullExtractor, RuleBasedExtractor,
};
pub use retrieval::{
    ContextChunk, ContextIndex, ContextRetriever, EmptyIndex, MemoryIndex, RemoteIndex,
    RetrievalResult, ScoredChunk,
};
