//! Framework-agnostic HTTP response value.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use http::StatusCode;

/// An HTTP response in a framework-agnostic shape.
///
/// A `Response` is a plain value: status code, header multi-map, and an
/// optional body. Handlers and interceptors construct one; the transport
/// adapter consumes it and writes it out. It is immutable once handed over.
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use portico_core::Response;
///
/// let resp = Response::new(StatusCode::OK, "pong")
///     .header("X-Served-By", "portico");
/// assert_eq!(resp.status(), StatusCode::OK);
/// ```
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code.
    status: StatusCode,

    /// Response headers.
    headers: HeaderMap,

    /// Response body, if any.
    body: Option<Bytes>,
}

impl Response {
    /// Creates a response with the given status and body and empty headers.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::with_headers(status, body, HeaderMap::new())
    }

    /// Creates a response with the given status and no body.
    #[must_use]
    pub fn empty(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// Creates a response with the given status, body, and headers.
    #[must_use]
    pub fn with_headers(status: StatusCode, body: impl Into<Bytes>, headers: HeaderMap) -> Self {
        Self {
            status,
            headers,
            body: Some(body.into()),
        }
    }

    /// Appends a header value, keeping any existing values for the name.
    ///
    /// Invalid names or values are silently dropped; response construction
    /// has no failure mode.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<HeaderName>(),
            HeaderValue::from_str(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }

    /// Returns the status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Returns the body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// Returns the body bytes, treating a missing body as empty.
    #[must_use]
    pub fn body_bytes(&self) -> &[u8] {
        self.body.as_deref().unwrap_or(&[])
    }

    /// Returns `true` if the response carries no headers and no body.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty() && self.body_bytes().is_empty()
    }
}

impl PartialEq for Response {
    /// Structural equality: same status, same body bytes (a missing body
    /// equals an empty one), and the same header multi-map where the values
    /// for each key are compared as multisets, insensitive to insertion
    /// order but sensitive to occurrence counts.
    fn eq(&self, other: &Self) -> bool {
        if self.status != other.status {
            return false;
        }
        if self.body_bytes() != other.body_bytes() {
            return false;
        }
        headers_equal(&self.headers, &other.headers)
    }
}

impl Eq for Response {}

/// Compares two header maps with order-insensitive multiset semantics
/// per key.
pub(crate) fn headers_equal(a: &HeaderMap, b: &HeaderMap) -> bool {
    if a.keys_len() != b.keys_len() {
        return false;
    }
    a.keys().all(|name| {
        let va: Vec<&HeaderValue> = a.get_all(name).iter().collect();
        let vb: Vec<&HeaderValue> = b.get_all(name).iter().collect();
        values_equal(&va, &vb)
    })
}

/// Compares two header value lists as multisets: the same values with the
/// same number of occurrences, insensitive to order.
pub(crate) fn values_equal(a: &[&HeaderValue], b: &[&HeaderValue]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a_sorted: Vec<&[u8]> = a.iter().map(|v| v.as_bytes()).collect();
    let mut b_sorted: Vec<&[u8]> = b.iter().map(|v| v.as_bytes()).collect();
    a_sorted.sort_unstable();
    b_sorted.sort_unstable();
    a_sorted == b_sorted
}
