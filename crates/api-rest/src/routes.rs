use std::sync::Arc;

use api_shared::{
    ErrorRes, HealthRes, HealthService, ParseNoteReq, ParseNoteRes, ValidationDetail,
    ValidationErrorRes,
};
use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use harmoniface_core::NoteStructurer;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::error::ApiError;
use crate::extract::ValidatedJson;

/// Application state shared across REST API handlers.
///
/// Holds the note structurer. Retrieval is an in-process interface for the RAG pipeline and is
/// not served over HTTP.
#[derive(Clone)]
pub struct AppState {
    pub structurer: Arc<NoteStructurer>,
}

impl AppState {
    pub fn new(structurer: NoteStructurer) -> Self {
        Self {
            structurer: Arc::new(structurer),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health, parse_note),
    components(schemas(
        HealthRes,
        ParseNoteReq,
        ParseNoteRes,
        ValidationErrorRes,
        ValidationDetail,
        ErrorRes
    ))
)]
pub struct ApiDoc;

/// Builds the REST router with Swagger UI, CORS and request tracing.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/parse", post(parse_note))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/parse",
    request_body = ParseNoteReq,
    responses(
        (status = 200, description = "Structured note", body = ParseNoteRes),
        (status = 422, description = "Malformed request body", body = ValidationErrorRes),
        (status = 504, description = "Field extraction timed out", body = ErrorRes)
    )
)]
/// Structure a free-text clinical note
///
/// Extracts patient, age, performed and suggested procedures and the follow-up from the note.
/// Fields that cannot be found are returned as `null` or `[]`; `raw` always echoes the input.
///
/// # Errors
/// - `422 Unprocessable Entity` if `text` is missing, not a string, or the body is not JSON.
/// - `504 Gateway Timeout` if the extractor exceeds its budget.
#[axum::debug_handler]
async fn parse_note(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<ParseNoteReq>,
) -> Result<Json<ParseNoteRes>, ApiError> {
    let record = state.structurer.structure(&req.text).await?;
    Ok(Json(record.into()))
}
