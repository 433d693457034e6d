use axum::{
    extract::{Request, State},
    http::{header::HOST, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use std::future::Future;
use std::sync::Arc;

use super::recorder::{ResponseRecorder, ResponseSink};
use crate::config::MetricsConfig;
use crate::metrics::{Point, Sink};

/// Records one `class=response` point per request, then forwards the
/// downstream response untouched.
///
/// Holds no per-request state; share it behind an `Arc` and attach it with
/// `axum::middleware::from_fn_with_state(interceptor, record_response)`.
pub struct MetricsInterceptor {
    name: String,
    config: MetricsConfig,
    sink: Arc<dyn Sink>,
}

impl MetricsInterceptor {
    /// Never fails; the config is not validated here.
    pub fn new(config: MetricsConfig, sink: Arc<dyn Sink>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config,
            sink,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &MetricsConfig {
        &self.config
    }

    pub async fn serve(&self, req: Request, next: Next) -> Response {
        self.intercept(req, |req| next.run(req)).await
    }

    /// The whole per-request pipeline, with the downstream handler supplied
    /// as a plain async function.
    ///
    /// The sink write completes (or fails) before the response is returned.
    /// Sink failures are logged and never change what the caller receives.
    pub async fn intercept<F, Fut>(&self, req: Request, downstream: F) -> Response
    where
        F: FnOnce(Request) -> Fut,
        Fut: Future<Output = Response>,
    {
        let cfg = &self.config;

        // ── Open the sink ───────────────────────────────────────
        let conn = match self.sink.connect(&cfg.sink_address, &cfg.token).await {
            Ok(conn) => Some(conn),
            Err(e) => {
                tracing::error!(
                    interceptor = %self.name,
                    address = %cfg.sink_address,
                    "sink connect failed, response not recorded: {e}"
                );
                None
            }
        };

        let host = request_host(&req);

        // ── Run downstream against the recorder ─────────────────
        let captured = match ResponseRecorder::new().record(downstream(req).await).await {
            Ok(captured) => captured,
            Err(e) => {
                tracing::error!(interceptor = %self.name, "reading downstream body failed: {e}");
                let mut rec = ResponseRecorder::new();
                rec.write_status(StatusCode::INTERNAL_SERVER_ERROR);
                rec.finish()
            }
        };

        // ── Write the point, then close ─────────────────────────
        if let Some(mut conn) = conn {
            let scope = conn.writer(&cfg.org, &cfg.bucket);
            let point = Point::response(
                &cfg.measurement,
                captured.status.as_u16(),
                &host,
                Utc::now(),
            );

            match conn.write(&scope, &point).await {
                Ok(()) => tracing::debug!(
                    interceptor = %self.name,
                    bucket = %scope.bucket,
                    line = %point.to_line_protocol(),
                    "point written"
                ),
                Err(e) => tracing::error!(interceptor = %self.name, "Write error: {e}"),
            }
            conn.close().await;
        }

        // ── Replay onto the real response ───────────────────────
        captured.into_response()
    }
}

/// `Host` header, falling back to the URI authority (HTTP/2), else empty.
/// Non-UTF-8 bytes in a present header are replaced, never dropped.
fn request_host(req: &Request) -> String {
    req.headers()
        .get(HOST)
        .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
        .or_else(|| req.uri().authority().map(|a| a.as_str().to_owned()))
        .unwrap_or_default()
}

/// `from_fn_with_state` entry point.
pub async fn record_response(
    State(interceptor): State<Arc<MetricsInterceptor>>,
    req: Request,
    next: Next,
) -> Response {
    interceptor.serve(req, next).await
}
