use axum::{
    body::{to_bytes, Body, Bytes},
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::Response,
};

// ─── Capability set ──────────────────────────────────────────────

/// Anything a handler's output can be written onto: headers, one status
/// code, body bytes.
///
/// Implemented by the in-memory [`ResponseRecorder`] and by the
/// [`ReplayWriter`] that builds the real outgoing response.
pub trait ResponseSink {
    fn add_header(&mut self, name: HeaderName, value: HeaderValue);
    fn write_status(&mut self, status: StatusCode);
    fn write_body(&mut self, body: Bytes);
}

// ─── Recorder ────────────────────────────────────────────────────

/// In-memory stand-in for the real response writer.
/// Starts out as `200 OK` with no headers and an empty body.
#[derive(Debug)]
pub struct ResponseRecorder {
    status: StatusCode,
    headers: HeaderMap,
    body: Vec<u8>,
}

impl Default for ResponseRecorder {
    fn default() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: Vec::new(),
        }
    }
}

impl ResponseRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drain a downstream response into the recorder, reading the whole body.
    pub async fn record(mut self, response: Response) -> Result<CapturedResponse, axum::Error> {
        let (parts, body) = response.into_parts();

        for (name, value) in parts.headers.iter() {
            self.add_header(name.clone(), value.clone());
        }
        self.write_status(parts.status);

        let bytes = to_bytes(body, usize::MAX).await?;
        self.write_body(bytes);

        Ok(self.finish())
    }

    pub fn finish(self) -> CapturedResponse {
        CapturedResponse {
            status: self.status,
            headers: self.headers,
            body: Bytes::from(self.body),
        }
    }
}

impl ResponseSink for ResponseRecorder {
    fn add_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.append(name, value);
    }

    fn write_status(&mut self, status: StatusCode) {
        self.status = status;
    }

    fn write_body(&mut self, body: Bytes) {
        self.body.extend_from_slice(&body);
    }
}

// ─── Captured response ───────────────────────────────────────────

/// What the downstream handler produced, held until the point is written.
#[derive(Debug, Clone)]
pub struct CapturedResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl CapturedResponse {
    /// Copy headers (every value of every key, in order), then the status,
    /// then the body onto `out`.
    pub fn replay<W: ResponseSink>(&self, out: &mut W) {
        for (name, value) in self.headers.iter() {
            out.add_header(name.clone(), value.clone());
        }
        out.write_status(self.status);
        out.write_body(self.body.clone());
    }

    pub fn into_response(self) -> Response {
        let mut writer = ReplayWriter::new();
        self.replay(&mut writer);
        writer.into_response()
    }
}

// ─── Real writer ─────────────────────────────────────────────────

/// Builds the response that actually goes back to the caller.
pub struct ReplayWriter {
    response: Response,
}

impl Default for ReplayWriter {
    fn default() -> Self {
        Self {
            response: Response::new(Body::empty()),
        }
    }
}

impl ReplayWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn into_response(self) -> Response {
        self.response
    }
}

impl ResponseSink for ReplayWriter {
    fn add_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.response.headers_mut().append(name, value);
    }

    fn write_status(&mut self, status: StatusCode) {
        *self.response.status_mut() = status;
    }

    fn write_body(&mut self, body: Bytes) {
        *self.response.body_mut() = Body::from(body);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::{AppendHeaders, IntoResponse};

    #[test]
    fn recorder_defaults_to_200_and_empty() {
        let captured = ResponseRecorder::new().finish();
        assert_eq!(captured.status, StatusCode::OK);
        assert!(captured.headers.is_empty());
        assert!(captured.body.is_empty());
    }

    #[test]
    fn recorder_appends_body_chunks() {
        let mut rec = ResponseRecorder::new();
        rec.write_body(Bytes::from_static(b"hel"));
        rec.write_body(Bytes::from_static(b"lo"));
        assert_eq!(rec.finish().body, Bytes::from_static(b"hello"));
    }

    #[tokio::test]
    async fn records_multi_value_headers_in_order() {
        let response = (
            StatusCode::CREATED,
            AppendHeaders([("set-cookie", "a=1"), ("set-cookie", "b=2"), ("x-test", "1")]),
            "made",
        )
            .into_response();

        let captured = ResponseRecorder::new().record(response).await.unwrap();

        assert_eq!(captured.status, StatusCode::CREATED);
        let cookies: Vec<_> = captured.headers.get_all("set-cookie").iter().collect();
        assert_eq!(cookies, ["a=1", "b=2"]);
        assert_eq!(captured.headers["x-test"], "1");
        assert_eq!(captured.body, Bytes::from_static(b"made"));
    }

    #[tokio::test]
    async fn replay_reproduces_the_capture() {
        let mut rec = ResponseRecorder::new();
        rec.add_header(HeaderName::from_static("x-a"), HeaderValue::from_static("1"));
        rec.add_header(HeaderName::from_static("x-a"), HeaderValue::from_static("2"));
        rec.write_status(StatusCode::IM_A_TEAPOT);
        rec.write_body(Bytes::from_static(b"short and stout"));
        let captured = rec.finish();

        let response = captured.clone().into_response();
        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
        let values: Vec<_> = response.headers().get_all("x-a").iter().collect();
        assert_eq!(values, ["1", "2"]);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(body, captured.body);
    }

    /// Order in which the capabilities are invoked during replay.
    #[derive(Default)]
    struct CallLog(Vec<&'static str>);

    impl ResponseSink for CallLog {
        fn add_header(&mut self, _: HeaderName, _: HeaderValue) {
            self.0.push("header");
        }
        fn write_status(&mut self, _: StatusCode) {
            self.0.push("status");
        }
        fn write_body(&mut self, _: Bytes) {
            self.0.push("body");
        }
    }

    #[test]
    fn replay_writes_headers_then_status_then_body() {
        let mut rec = ResponseRecorder::new();
        rec.add_header(HeaderName::from_static("x-a"), HeaderValue::from_static("1"));
        rec.add_header(HeaderName::from_static("x-b"), HeaderValue::from_static("2"));

        let mut log = CallLog::default();
        rec.finish().replay(&mut log);
        assert_eq!(log.0, ["header", "header", "status", "body"]);
    }
}
