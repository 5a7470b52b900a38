//! An in-memory response sink.

use bytes::BytesMut;
use http::header::HeaderMap;
use http::StatusCode;
use portico_core::Response;
use portico_middleware::ResponseWriter;

/// A [`ResponseWriter`] that records everything written to it.
///
/// Defaults to `200 OK` with no headers and an empty body, matching a
/// transport writer nothing has touched yet.
#[derive(Debug)]
pub struct RecordingWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl RecordingWriter {
    /// Creates an untouched writer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// Consumes the writer into the response it recorded.
    #[must_use]
    pub fn into_response(self) -> Response {
        Response::with_headers(self.status, self.body.freeze(), self.headers)
    }
}

impl Default for RecordingWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter for RecordingWriter {
    fn status(&self) -> StatusCode {
        self.status
    }

    fn set_status(&mut self, status: StatusCode) {
        if !self.body_started() {
            self.status = status;
        }
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    fn write_body(&mut self, chunk: &[u8]) {
        self.body.extend_from_slice(chunk);
    }

    fn body_started(&self) -> bool {
        !self.body.is_empty()
    }
}
