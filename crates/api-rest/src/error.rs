//! Mapping from extractor rejections and core errors to HTTP responses.

use api_shared::{ErrorRes, ValidationDetail, ValidationErrorRes};
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use harmoniface_core::ServiceError;

#[derive(Debug)]
pub enum ApiError {
    /// The request body did not match the expected shape.
    Validation(ValidationDetail),
    Service(ServiceError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let msg = rejection.body_text();
        let detail = match &rejection {
            JsonRejection::JsonDataError(_) => match missing_field(&msg) {
                Some(field) => ValidationDetail {
                    loc: vec!["body".into(), field],
                    msg: "Field required".into(),
                    kind: "missing".into(),
                },
                None => body_detail(msg, "value_error"),
            },
            JsonRejection::JsonSyntaxError(_) => body_detail(msg, "json_invalid"),
            JsonRejection::MissingJsonContentType(_) => body_detail(msg, "missing_content_type"),
            _ => body_detail(msg, "body_error"),
        };
        ApiError::Validation(detail)
    }
}

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        ApiError::Service(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(detail) => {
                tracing::debug!("rejected request body: {}", detail.msg);
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    Json(ValidationErrorRes {
                        detail: vec![detail],
                    }),
                )
                    .into_response()
            }
            ApiError::Service(e) => {
                let status = status_for(&e);
                if status.is_server_error() {
                    tracing::error!("request failed: {:?}", e);
                }
                (status, Json(ErrorRes { error: e.to_string() })).into_response()
            }
        }
    }
}

/// HTTP status for a core error.
pub fn status_for(e: &ServiceError) -> StatusCode {
    match e {
        ServiceError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ServiceError::RetrievalUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        ServiceError::RetrievalTimeout(_) | ServiceError::ExtractionTimeout(_) => {
            StatusCode::GATEWAY_TIMEOUT
        }
        ServiceError::KnowledgeRead(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn body_detail(msg: String, kind: &str) -> ValidationDetail {
    ValidationDetail {
        loc: vec!["body".into()],
        msg,
        kind: kind.into(),
    }
}

/// Pulls `name` out of serde's "missing field `name`" message.
fn missing_field(msg: &str) -> Option<String> {
    let rest = &msg[msg.find("missing field `")? + "missing field `".len()..];
    let end = rest.find('`')?;
    Some(rest[..end].to_string())
}
