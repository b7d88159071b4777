//! # API REST
//!
//! REST API implementation for HarmoniFace.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - Request-body validation with 422 payloads
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialisation, CORS, request tracing)
//!
//! Uses `api-shared` for wire types and `harmoniface-core` for the services.

#![warn(rust_2018_idioms)]

pub mod error;
pub mod extract;
pub mod routes;

pub use error::ApiError;
pub use routes::{router, ApiDoc, AppState};
