use async_trait::async_trait;

use super::Point;
use crate::error::SinkError;

/// Organization + bucket a connection writes into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteScope {
    pub org: String,
    pub bucket: String,
}

/// Something that can open connections to a time-series database.
///
/// Shared across requests behind an `Arc`; each request opens its own
/// connection, writes at most one point and closes it again.
#[async_trait]
pub trait Sink: Send + Sync {
    async fn connect(
        &self,
        address: &str,
        token: &str,
    ) -> Result<Box<dyn SinkConnection>, SinkError>;
}

/// A single open connection, owned by exactly one request.
#[async_trait]
pub trait SinkConnection: Send {
    fn writer(&self, org: &str, bucket: &str) -> WriteScope {
        WriteScope {
            org: org.to_owned(),
            bucket: bucket.to_owned(),
        }
    }

    /// Blocking write: returns once the sink has accepted or refused the point.
    async fn write(&mut self, scope: &WriteScope, point: &Point) -> Result<(), SinkError>;

    async fn close(self: Box<Self>);
}
