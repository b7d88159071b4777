//! # API Shared
//!
//! Shared definitions for the HarmoniFace APIs.
//!
//! Contains:
//! - Wire request/response types with OpenAPI schemas (`dto` module)
//! - Shared services like `HealthService`
//!
//! Used by `api-rest` and the CLI so both emit the same JSON shapes.

pub mod dto;
pub mod health;

pub use dto::*;
pub use health::HealthService;
