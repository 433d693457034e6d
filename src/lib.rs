//! HTTP middleware that writes one InfluxDB point (status code + host) per
//! response, then forwards the response exactly as the downstream handler
//! produced it.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod server;

/// Shared application state available to every handler via `State<Arc<AppState>>`.
pub struct AppState {
    /// Wraps the demo routes; also read by `/health`.
    pub interceptor: Arc<middleware::MetricsInterceptor>,

    /// Set when the interceptor writes into memory instead of InfluxDB.
    pub memory_sink: Option<metrics::MemorySink>,
}
