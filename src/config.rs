use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::error::ConfigError;

// ─── Defaults ────────────────────────────────────────────────────

/// Upper bound on a single sink write before it counts as failed.
const DEFAULT_WRITE_TIMEOUT_MS: u64 = 10_000;

fn default_write_timeout_ms() -> u64 {
    DEFAULT_WRITE_TIMEOUT_MS
}

// ─── Interceptor configuration ───────────────────────────────────

/// Where and under what name each response point is written.
///
/// Every string is passed through to the sink as-is. An empty bucket or
/// address is not rejected here; the sink reports it when the write fails.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MetricsConfig {
    /// Base URL of the InfluxDB server, e.g. `http://localhost:8086`
    #[serde(rename = "clientIP", default)]
    pub sink_address: String,

    #[serde(rename = "clientbucket", default)]
    pub bucket: String,

    #[serde(rename = "clientmeasurement", default)]
    pub measurement: String,

    /// API token; empty means the write is sent without credentials
    #[serde(rename = "clienttoken", default)]
    pub token: String,

    #[serde(rename = "clientorg", default)]
    pub org: String,

    /// 0 disables the timeout
    #[serde(rename = "clienttimeoutms", default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            sink_address: String::new(),
            bucket: String::new(),
            measurement: String::new(),
            token: String::new(),
            org: String::new(),
            write_timeout_ms: DEFAULT_WRITE_TIMEOUT_MS,
        }
    }
}

impl MetricsConfig {
    pub fn write_timeout(&self) -> Option<Duration> {
        match self.write_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }

    /// Build from `INFLUX_*` environment variables (after `.env` is loaded).
    /// Unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same mapping as [`from_env`](Self::from_env) over any key lookup.
    pub fn from_lookup<F>(var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = var("INFLUX_URL") {
            cfg.sink_address = v;
        }
        if let Some(v) = var("INFLUX_BUCKET") {
            cfg.bucket = v;
        }
        if let Some(v) = var("INFLUX_MEASUREMENT") {
            cfg.measurement = v;
        }
        if let Some(v) = var("INFLUX_TOKEN") {
            cfg.token = v;
        }
        if let Some(v) = var("INFLUX_ORG") {
            cfg.org = v;
        }
        if let Some(v) = var("INFLUX_TIMEOUT_MS") {
            cfg.write_timeout_ms = v.trim().parse().map_err(|_| ConfigError::Env {
                key: "INFLUX_TIMEOUT_MS",
                value: v.clone(),
            })?;
        }

        Ok(cfg)
    }
}

// ─── Loaders ─────────────────────────────────────────────────────

pub fn load_from_file(path: &str) -> Result<MetricsConfig, ConfigError> {
    let s = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_owned(),
        source,
    })?;
    load_from_str(&s)
}

pub fn load_from_str(s: &str) -> Result<MetricsConfig, ConfigError> {
    Ok(serde_json::from_str(s)?)
}
