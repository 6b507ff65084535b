use axum::{
    body::{Body, Bytes},
    extract::{DefaultBodyLimit, State},
    http::{header::HeaderName, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Router,
};

use crate::services::envelope::{ApiRequest, ApiResponse};
use crate::services::{ingest_service, recent_service};
use crate::state::log_table::SharedTable;

/// Build the log routes. Both accept any method; the handlers answer
/// 405 themselves so the body names the expected method.
///
/// Ingest bodies are not size-capped, so every outcome goes through the
/// JSON envelope instead of axum's plain-text 413.
pub fn routes(table: SharedTable) -> Router {
    Router::new()
        .route("/logs", any(ingest).layer(DefaultBodyLimit::disable()))
        .route("/logs/recent", any(recent))
        .with_state(table)
}

//
// ─────────────────────────────────────────────────────────────
// POST /logs
// Validate and store one log entry
// ─────────────────────────────────────────────────────────────
//
async fn ingest(
    State(table): State<SharedTable>,
    method: Method,
    body: Bytes,
) -> ApiResponse
{
    let request = ApiRequest::from_http(method.as_str(), body.to_vec());
    ingest_service::handle(table.as_ref(), &request)
}

//
// ─────────────────────────────────────────────────────────────
// GET /logs/recent
// Return the newest entries, newest first
// ─────────────────────────────────────────────────────────────
//
async fn recent(
    State(table): State<SharedTable>,
    method: Method,
) -> ApiResponse
{
    let request = ApiRequest::new(method.as_str());
    recent_service::handle(table.as_ref(), &request)
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() = status;

        for (name, value) in &self.headers {
            match (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                (Ok(name), Ok(value)) => {
                    response.headers_mut().insert(name, value);
                }
                _ => tracing::warn!("Dropping invalid response header {name}"),
            }
        }

        response
    }
}
