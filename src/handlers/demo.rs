use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

use super::AppError;

#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub interceptor: String,
    pub bucket: String,
    pub measurement: String,
}

// ─── GET / ───────────────────────────────────────────────────────

pub async fn root() -> &'static str {
    "ok"
}

// ─── GET /health ─────────────────────────────────────────────────

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Health> {
    let cfg = state.interceptor.config();
    Json(Health {
        status: "ok",
        interceptor: state.interceptor.name().to_owned(),
        bucket: cfg.bucket.clone(),
        measurement: cfg.measurement.clone(),
    })
}

// ─── GET /api/status/:code ───────────────────────────────────────
/// Answers with an empty body and whatever status was asked for.

pub async fn status(Path(code): Path<u16>) -> Result<StatusCode, AppError> {
    StatusCode::from_u16(code)
        .map_err(|_| AppError::BadRequest(format!("{code} is not a valid HTTP status")))
}

// ─── POST /api/echo ──────────────────────────────────────────────

pub async fn echo(headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| header::HeaderValue::from_static("application/octet-stream"));

    (
        [(header::CONTENT_TYPE, content_type)],
        [("x-echo", "1")],
        body,
    )
        .into_response()
}
