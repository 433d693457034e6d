use axum::{
    middleware as axum_mw,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::middleware::record_response;
use crate::AppState;

/// Builds the demo `Router`: every route above the interceptor layer is
/// recorded, the points dump below it is not.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // ── Demo endpoints ──────────────────────────────────────
        .route("/", get(handlers::demo::root))
        .route("/health", get(handlers::demo::health))
        .route("/api/status/:code", get(handlers::demo::status))
        .route("/api/echo", post(handlers::demo::echo))
        // ── Record one point per response ───────────────────────
        .layer(axum_mw::from_fn_with_state(
            state.interceptor.clone(),
            record_response,
        ))
        // ── Introspection (not recorded) ────────────────────────
        .route("/metrics/points", get(handlers::points::list_points))
        .with_state(state)
        // ── Global middleware (applied bottom-up) ───────────────
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetricsConfig;
    use crate::metrics::{FieldValue, MemorySink};
    use crate::middleware::MetricsInterceptor;
    use axum::{
        body::{to_bytes, Body},
        http::{self, header, StatusCode},
    };
    use tower::ServiceExt;

    fn state(sink: &MemorySink) -> Arc<AppState> {
        let cfg = MetricsConfig {
            sink_address: "memory://".into(),
            bucket: "demo".into(),
            measurement: "responses".into(),
            ..Default::default()
        };
        Arc::new(AppState {
            interceptor: Arc::new(MetricsInterceptor::new(cfg, Arc::new(sink.clone()), "demo")),
            memory_sink: Some(sink.clone()),
        })
    }

    #[tokio::test]
    async fn status_route_is_recorded_with_its_code() {
        let sink = MemorySink::new();
        let resp = create_router(state(&sink))
            .oneshot(
                http::Request::builder()
                    .uri("/api/status/503")
                    .header(header::HOST, "svc.local")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let points = sink.points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].point.fields["STATUS"], FieldValue::Int(503));
        assert_eq!(points[0].point.fields["HOST"], FieldValue::Str("svc.local".into()));
    }

    #[tokio::test]
    async fn echo_body_and_headers_survive_replay() {
        let sink = MemorySink::new();
        let resp = create_router(state(&sink))
            .oneshot(
                http::Request::builder()
                    .method("POST")
                    .uri("/api/echo")
                    .header(header::HOST, "svc.local")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(r#"{"hello":"world"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers()[header::CONTENT_TYPE], "application/json");
        assert_eq!(resp.headers()["x-echo"], "1");
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], br#"{"hello":"world"}"#);
    }

    #[tokio::test]
    async fn invalid_status_is_a_recorded_bad_request() {
        let sink = MemorySink::new();
        let resp = create_router(state(&sink))
            .oneshot(http::Request::builder().uri("/api/status/42").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(sink.points()[0].point.fields["STATUS"], FieldValue::Int(400));
    }

    #[tokio::test]
    async fn points_dump_is_not_itself_recorded() {
        let sink = MemorySink::new();
        let app = create_router(state(&sink));

        app.clone()
            .oneshot(http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let resp = app
            .oneshot(http::Request::builder().uri("/metrics/points").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let dumped: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(dumped.as_array().map(Vec::len), Some(1));
        assert_eq!(dumped[0]["point"]["tags"]["class"], "response");
        assert_eq!(sink.points().len(), 1);
    }

    #[tokio::test]
    async fn points_dump_without_memory_sink_is_404() {
        let sink = MemorySink::new();
        let mut st = state(&sink);
        Arc::get_mut(&mut st).unwrap().memory_sink = None;

        let resp = create_router(st)
            .oneshot(http::Request::builder().uri("/metrics/points").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
