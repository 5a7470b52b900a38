//! Hyper bindings for the request and response contracts.

use bytes::{Bytes, BytesMut};
use http::header::HeaderMap;
use http::StatusCode;
use http_body_util::Full;
use portico_core::{Context, Param, Request};
use portico_middleware::ResponseWriter;

/// A received HTTP request bound to the [`Request`] contract.
///
/// Built by the server after routing: the body has already been collected,
/// path parameters extracted against the matched template, and the query
/// string percent-decoded.
#[derive(Debug)]
pub struct HttpRequest {
    context: Context,
    declared_path: String,
    params: Vec<Param>,
    queries: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl HttpRequest {
    /// Binds a received request.
    ///
    /// `declared_path` is the route template the request matched and
    /// `params` the values extracted from the concrete path.
    #[must_use]
    pub fn new(
        parts: &http::request::Parts,
        body: Bytes,
        declared_path: impl Into<String>,
        params: Vec<Param>,
    ) -> Self {
        Self {
            context: Context::new(),
            declared_path: declared_path.into(),
            params,
            queries: parse_query(parts.uri.query().unwrap_or("")),
            headers: parts.headers.clone(),
            body: Some(body),
        }
    }
}

impl Request for HttpRequest {
    fn context(&self) -> &Context {
        &self.context
    }

    fn apply(&mut self, context: Context) {
        self.context = context;
    }

    fn declared_path(&self) -> &str {
        &self.declared_path
    }

    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.key() == name)
            .map(Param::value)
    }

    fn params(&self) -> &[Param] {
        &self.params
    }

    fn query(&self, name: &str) -> Option<&str> {
        self.queries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    fn queries(&self) -> &[(String, String)] {
        &self.queries
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }
}

/// Decodes a raw query string into ordered key/value pairs.
///
/// Pairs that fail percent-decoding are kept verbatim rather than dropped.
fn parse_query(raw: &str) -> Vec<(String, String)> {
    raw.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode_component(key), decode_component(value))
        })
        .collect()
}

fn decode_component(raw: &str) -> String {
    urlencoding::decode(raw).map_or_else(|_| raw.to_string(), |s| s.into_owned())
}

/// A [`ResponseWriter`] backed by an in-memory buffer, converted into a
/// hyper response once the chain has run.
#[derive(Debug)]
pub struct BufferedWriter {
    status: StatusCode,
    headers: HeaderMap,
    body: BytesMut,
}

impl BufferedWriter {
    /// Creates an untouched writer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            body: BytesMut::new(),
        }
    }

    /// Consumes the writer into the hyper response to send.
    #[must_use]
    pub fn into_http(self) -> http::Response<Full<Bytes>> {
        let mut response = http::Response::new(Full::new(self.body.freeze()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

impl Default for BufferedWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseWriter for BufferedWriter {
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
