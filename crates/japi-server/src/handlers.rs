use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use japi_openapi::{JSONAPI_MEDIA_TYPE, SynthesisError};
use serde::Serialize;
use serde_json::{Value, json};

use crate::server::AppState;

#[derive(Serialize)]
pub struct HealthResponse<'a> {
    status: &'a str,
}

pub async fn root(State(state): State<AppState>) -> impl IntoResponse {
    let documents: Vec<&str> = state
        .service
        .config()
        .documents
        .iter()
        .map(|d| d.name.as_str())
        .collect();
    let body = json!({
        "service": "japi",
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "resourceTypes": state.service.graph().len(),
        "documents": documents,
    });
    (StatusCode::OK, Json(body))
}

pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthResponse { status: "ok" }))
}

/// `GET /openapi/{document}/openapi.json`
pub async fn openapi_document(
    State(state): State<AppState>,
    Path(document): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !state.service.config().enabled {
        return synthesis_error_response(&SynthesisError::DocumentNotFound(document));
    }

    let host = state.resolve_host(headers.get(header::HOST).and_then(|h| h.to_str().ok()));
    let service = state.service.clone();
    let scheme = state.public_scheme.clone();
    let base_path = state.base_path.clone();

    // The build keeps running if the request is dropped, so the cache still fills.
    let result = tokio::task::spawn_blocking(move || service.document(&document, &scheme, &host, &base_path)).await;

    match result {
        Ok(Ok(doc)) => match serde_json::to_vec(doc.as_ref()) {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, HeaderValue::from_static("application/json"))],
                body,
            )
                .into_response(),
            Err(e) => internal_error(format!("failed to serialize OpenAPI document: {e}")),
        },
        Ok(Err(e)) => {
            tracing::warn!(error = %e, code = e.error_code(), "OpenAPI document request failed");
            synthesis_error_response(&e)
        }
        Err(e) => internal_error(format!("OpenAPI document build task failed: {e}")),
    }
}

fn synthesis_error_response(error: &SynthesisError) -> Response {
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    error_document(status, error.to_error_document())
}

fn internal_error(detail: String) -> Response {
    tracing::error!(%detail, "internal error");
    let body = json!({
        "errors": [{
            "status": "500",
            "code": "INTERNAL_ERROR",
            "title": "Internal Server Error",
            "detail": detail,
        }]
    });
    error_document(StatusCode::INTERNAL_SERVER_ERROR, body)
}

fn error_document(status: StatusCode, body: Value) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, HeaderValue::from_static(JSONAPI_MEDIA_TYPE))],
        Json(body),
    )
        .into_response()
}
