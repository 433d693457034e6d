use async_trait::async_trait;
use reqwest::{header, Client, Url};
use std::time::Duration;

use super::sink::{Sink, SinkConnection, WriteScope};
use super::Point;
use crate::error::SinkError;

/// InfluxDB v2 sink speaking the HTTP write API with line protocol.
///
/// The underlying `reqwest::Client` is shared so TCP connections are pooled;
/// the per-request connect/close only hands out and drops a lightweight
/// handle bound to one address and token.
#[derive(Clone)]
pub struct InfluxSink {
    http: Client,
}

impl InfluxSink {
    pub fn new(write_timeout: Option<Duration>) -> Result<Self, SinkError> {
        let mut builder = Client::builder();
        if let Some(t) = write_timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            http: builder.build()?,
        })
    }
}

#[async_trait]
impl Sink for InfluxSink {
    async fn connect(
        &self,
        address: &str,
        token: &str,
    ) -> Result<Box<dyn SinkConnection>, SinkError> {
        let base = parse_base(address)?;
        Ok(Box::new(InfluxConnection {
            http: self.http.clone(),
            base,
            token: token.to_owned(),
        }))
    }
}

fn parse_base(address: &str) -> Result<Url, SinkError> {
    let invalid = |reason: String| SinkError::InvalidAddress {
        address: address.to_owned(),
        reason,
    };

    let mut url = Url::parse(address).map_err(|e| invalid(e.to_string()))?;
    match url.scheme() {
        "http" | "https" => {}
        other => return Err(invalid(format!("unsupported scheme \"{other}\""))),
    }

    // `join` replaces the last segment unless the path ends in '/'.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

// ─── Connection ──────────────────────────────────────────────────

pub struct InfluxConnection {
    http: Client,
    base: Url,
    token: String,
}

impl InfluxConnection {
    fn write_url(&self, scope: &WriteScope) -> Result<Url, SinkError> {
        let mut url = self
            .base
            .join("api/v2/write")
            .map_err(|e| SinkError::InvalidAddress {
                address: self.base.to_string(),
                reason: e.to_string(),
            })?;
        url.query_pairs_mut()
            .append_pair("org", &scope.org)
            .append_pair("bucket", &scope.bucket)
            .append_pair("precision", "ns");
        Ok(url)
    }
}

#[async_trait]
impl SinkConnection for InfluxConnection {
    async fn write(&mut self, scope: &WriteScope, point: &Point) -> Result<(), SinkError> {
        let url = self.write_url(scope)?;

        let mut req = self
            .http
            .post(url)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .body(point.to_line_protocol());
        if !self.token.is_empty() {
            req = req.header(header::AUTHORIZATION, format!("Token {}", self.token));
        }

        let resp = req.send().await.map_err(classify)?;
        let status = resp.status();
        if status.is_success() {
            return Ok(());
        }

        let message = resp.text().await.unwrap_or_default();
        Err(SinkError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn close(self: Box<Self>) {
        tracing::trace!(base = %self.base, "influx connection closed");
    }
}

fn classify(e: reqwest::Error) -> SinkError {
    if e.is_timeout() {
        SinkError::Timeout
    } else if e.is_connect() {
        SinkError::Connect(e.to_string())
    } else {
        SinkError::Transport(e)
    }
}
