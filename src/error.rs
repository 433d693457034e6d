use thiserror::Error;

/// Failures talking to the time-series sink.
///
/// None of these ever reach the HTTP caller: the interceptor logs them and
/// forwards the captured response unchanged.
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("invalid sink address \"{address}\": {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("sink connection refused: {0}")]
    Connect(String),

    #[error("sink rejected write ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("sink write timed out")]
    Timeout,

    #[error("sink transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Failures loading the interceptor configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("read config \"{path}\" failed: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config json: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid value for {key}: {value}")]
    Env { key: &'static str, value: String },
}
