//! Response sinks and capture.

use bytes::BytesMut;
use http::header::HeaderMap;
use http::StatusCode;
use portico_core::Response;

/// Write access to an in-flight HTTP response.
///
/// The transport binding implements this over its native response object.
/// The contract mirrors HTTP itself: status and headers are mutable only
/// until the first body byte is written, after which
/// [`body_started`](ResponseWriter::body_started) reports `true` and
/// further status changes are ignored by implementations.
pub trait ResponseWriter: Send {
    /// Returns the current status.
    fn status(&self) -> StatusCode;

    /// Sets the status. Ignored once the body has started.
    fn set_status(&mut self, status: StatusCode);

    /// Returns the response headers.
    fn headers(&self) -> &HeaderMap;

    /// Returns mutable access to the response headers.
    fn headers_mut(&mut self) -> &mut HeaderMap;

    /// Appends a chunk to the response body.
    fn write_body(&mut self, chunk: &[u8]);

    /// Returns `true` once any body byte has been written.
    fn body_started(&self) -> bool;
}

/// A [`ResponseWriter`] that mirrors everything into an in-memory buffer
/// while forwarding to the real sink.
///
/// The chain driver wraps the transport's writer in a `CaptureWriter` so
/// that after downstream links have finished, the complete response they
/// produced can be reconstructed with [`response`](CaptureWriter::response)
/// and handed back up the chain as a value.
pub struct CaptureWriter<'w> {
    sink: &'w mut dyn ResponseWriter,
    captured: BytesMut,
}

impl<'w> CaptureWriter<'w> {
    /// Wraps a sink.
    pub fn new(sink: &'w mut dyn ResponseWriter) -> Self {
        Self {
            sink,
            captured: BytesMut::new(),
        }
    }

    /// Snapshots the response as written so far: the sink's status and
    /// headers plus the captured body bytes.
    #[must_use]
    pub fn response(&self) -> Response {
        Response::with_headers(
            self.sink.status(),
            self.captured.clone().freeze(),
            self.sink.headers().clone(),
        )
    }
}

impl ResponseWriter for CaptureWriter<'_> {
    fn status(&self) -> StatusCode {
        self.sink.status()
    }

    fn set_status(&mut self, status: StatusCode) {
        if !self.body_started() {
            self.sink.set_status(status);
        }
    }

    fn headers(&self) -> &HeaderMap {
        self.sink.headers()
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        self.sink.headers_mut()
    }

    fn write_body(&mut self, chunk: &[u8]) {
        self.captured.extend_from_slice(chunk);
        self.sink.write_body(chunk);
    }

    fn body_started(&self) -> bool {
        self.sink.body_started() || !self.captured.is_empty()
    }
}
