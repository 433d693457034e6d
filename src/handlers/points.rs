use axum::{extract::State, Json};
use std::sync::Arc;

use crate::metrics::RecordedPoint;
use crate::AppState;

use super::AppError;

// ─── GET /metrics/points ─────────────────────────────────────────
/// Dumps what the in-memory sink has received. Only available when the
/// server runs with `clientIP = "memory://"`.

pub async fn list_points(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RecordedPoint>>, AppError> {
    let sink = state
        .memory_sink
        .as_ref()
        .ok_or_else(|| AppError::NotFound("in-memory sink is not enabled".into()))?;
    Ok(Json(sink.points()))
}
