use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use influx_response_metrics::config::{self, MetricsConfig};
use influx_response_metrics::metrics::{InfluxSink, MemorySink, Sink, MEMORY_SINK_ADDRESS};
use influx_response_metrics::middleware::MetricsInterceptor;
use influx_response_metrics::{server, AppState};

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:3000";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "influx_response_metrics=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // ── 1. Load configuration ────────────────────────────────────
    dotenvy::dotenv().ok();
    let cfg: MetricsConfig = match std::env::var("METRICS_CONFIG") {
        Ok(path) => {
            tracing::info!("Loading interceptor config from {path}");
            config::load_from_file(&path)?
        }
        Err(_) => MetricsConfig::from_env()?,
    };

    // ── 2. Pick the sink ─────────────────────────────────────────
    let (sink, memory_sink): (Arc<dyn Sink>, Option<MemorySink>) =
        if cfg.sink_address == MEMORY_SINK_ADDRESS {
            let mem = MemorySink::new();
            tracing::warn!("Writing points to memory; inspect them at /metrics/points");
            (Arc::new(mem.clone()) as Arc<dyn Sink>, Some(mem))
        } else {
            tracing::info!(
                address = %cfg.sink_address,
                bucket = %cfg.bucket,
                measurement = %cfg.measurement,
                "Writing points to InfluxDB"
            );
            (Arc::new(InfluxSink::new(cfg.write_timeout())?) as Arc<dyn Sink>, None)
        };

    // ── 3. Build shared state ────────────────────────────────────
    let state = Arc::new(AppState {
        interceptor: Arc::new(MetricsInterceptor::new(cfg, sink, "influx-response-metrics")),
        memory_sink,
    });

    let app = server::create_router(state);

    // ── 4. Bind & serve ──────────────────────────────────────────
    let addr = std::env::var("LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
