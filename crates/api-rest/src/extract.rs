use axum::extract::FromRequest;

use crate::error::ApiError;

/// JSON body extractor that rejects malformed bodies with a 422 validation payload.
///
/// Covers invalid JSON, missing or wrong-typed fields and a missing JSON content type.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ValidatedJson<T>(pub T);
