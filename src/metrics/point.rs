use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;

// ─── Field values ────────────────────────────────────────────────

/// Value of a point field: the status code is an integer, the host a string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i64),
    Str(String),
}

impl From<u16> for FieldValue {
    fn from(v: u16) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<&str> for FieldValue {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

// ─── Point ───────────────────────────────────────────────────────

/// One timestamped record destined for the time-series sink.
///
/// Tags and fields live in `BTreeMap`s so the rendered line is stable
/// regardless of insertion order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub measurement: String,
    pub tags: BTreeMap<String, String>,
    pub fields: BTreeMap<String, FieldValue>,
    pub timestamp: DateTime<Utc>,
}

impl Point {
    pub fn new(measurement: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            measurement: measurement.into(),
            tags: BTreeMap::new(),
            fields: BTreeMap::new(),
            timestamp,
        }
    }

    pub fn tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    pub fn field(mut self, key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// The point written for every intercepted request:
    /// `class=response` tag, `STATUS` and `HOST` fields.
    pub fn response(
        measurement: &str,
        status: u16,
        host: &str,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self::new(measurement, timestamp)
            .tag("class", "response")
            .field("STATUS", status)
            .field("HOST", host)
    }

    /// Render as one InfluxDB line-protocol line (nanosecond precision,
    /// no trailing newline).
    pub fn to_line_protocol(&self) -> String {
        let mut line = String::with_capacity(64);
        escape_into(&mut line, &self.measurement, &[',', ' ']);

        for (k, v) in &self.tags {
            line.push(',');
            escape_into(&mut line, k, &[',', '=', ' ']);
            line.push('=');
            escape_into(&mut line, v, &[',', '=', ' ']);
        }

        let mut sep = ' ';
        for (k, v) in &self.fields {
            line.push(sep);
            sep = ',';
            escape_into(&mut line, k, &[',', '=', ' ']);
            line.push('=');
            match v {
                FieldValue::Int(i) => {
                    let _ = write!(line, "{i}i");
                }
                FieldValue::Str(s) => {
                    line.push('"');
                    escape_into(&mut line, s, &['"', '\\']);
                    line.push('"');
                }
            }
        }

        if let Some(ns) = self.timestamp.timestamp_nanos_opt() {
            let _ = write!(line, " {ns}");
        }
        line
    }
}

fn escape_into(out: &mut String, s: &str, special: &[char]) {
    for c in s.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
}
