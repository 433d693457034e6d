use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use super::sink::{Sink, SinkConnection, WriteScope};
use super::Point;
use crate::error::SinkError;

/// A point as seen by the in-memory sink, with where it was aimed.
#[derive(Debug, Clone, Serialize)]
pub struct RecordedPoint {
    pub address: String,
    pub org: String,
    pub bucket: String,
    pub point: Point,
}

/// Sink that keeps every written point in memory.
///
/// Cheaply cloneable; clones share the same store and counters. Failure
/// switches let callers simulate an unreachable or refusing database.
#[derive(Clone, Default)]
pub struct MemorySink {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    points: Mutex<Vec<RecordedPoint>>,
    connects: AtomicU64,
    closes: AtomicU64,
    fail_connect: AtomicBool,
    fail_writes: AtomicBool,
    reject_empty_bucket: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse writes with an empty bucket name, as InfluxDB does.
    pub fn strict() -> Self {
        let sink = Self::default();
        sink.inner.reject_empty_bucket.store(true, Ordering::SeqCst);
        sink
    }

    pub fn fail_connect(&self, on: bool) {
        self.inner.fail_connect.store(on, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, on: bool) {
        self.inner.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn points(&self) -> Vec<RecordedPoint> {
        self.inner.points.lock().clone()
    }

    pub fn connects(&self) -> u64 {
        self.inner.connects.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u64 {
        self.inner.closes.load(Ordering::SeqCst)
    }

    /// Connections opened but not yet closed.
    pub fn open_connections(&self) -> u64 {
        self.connects().saturating_sub(self.closes())
    }
}

#[async_trait]
impl Sink for MemorySink {
    async fn connect(
        &self,
        address: &str,
        _token: &str,
    ) -> Result<Box<dyn SinkConnection>, SinkError> {
        if self.inner.fail_connect.load(Ordering::SeqCst) {
            return Err(SinkError::Connect(format!("{address}: connection refused")));
        }
        self.inner.connects.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection {
            inner: self.inner.clone(),
            address: address.to_owned(),
        }))
    }
}

struct MemoryConnection {
    inner: Arc<Inner>,
    address: String,
}

#[async_trait]
impl SinkConnection for MemoryConnection {
    async fn write(&mut self, scope: &WriteScope, point: &Point) -> Result<(), SinkError> {
        if self.inner.fail_writes.load(Ordering::SeqCst) {
            return Err(SinkError::Connect(format!(
                "{}: connection reset by peer",
                self.address
            )));
        }
        if scope.bucket.is_empty() && self.inner.reject_empty_bucket.load(Ordering::SeqCst) {
            return Err(SinkError::Rejected {
                status: 404,
                message: "bucket \"\" not found".into(),
            });
        }

        self.inner.points.lock().push(RecordedPoint {
            address: self.address.clone(),
            org: scope.org.clone(),
            bucket: scope.bucket.clone(),
            point: point.clone(),
        });
        Ok(())
    }

    async fn close(self: Box<Self>) {
        self.inner.closes.fetch_add(1, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[tokio::test]
    async fn records_points_and_lifecycle() {
        let sink = MemorySink::new();
        let mut conn = sink.connect("memory://", "").await.unwrap();
        assert_eq!(sink.open_connections(), 1);

        let scope = conn.writer("org", "bucket");
        conn.write(&scope, &Point::response("m", 200, "h", Utc::now()))
            .await
            .unwrap();
        conn.close().await;

        assert_eq!(sink.connects(), 1);
        assert_eq!(sink.closes(), 1);
        let points = sink.points();
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].bucket, "bucket");
        assert_eq!(points[0].org, "org");
    }

    #[tokio::test]
    async fn strict_sink_rejects_empty_bucket() {
        let sink = MemorySink::strict();
        let mut conn = sink.connect("memory://", "").await.unwrap();
        let scope = conn.writer("", "");
        let err = conn
            .write(&scope, &Point::response("m", 200, "h", Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(err, SinkError::Rejected { status: 404, .. }));
        assert!(sink.points().is_empty());
    }

    #[tokio::test]
    async fn failed_connect_is_not_counted() {
        let sink = MemorySink::new();
        sink.fail_connect(true);
        assert!(sink.connect("memory://", "").await.is_err());
        assert_eq!(sink.connects(), 0);
    }
}
