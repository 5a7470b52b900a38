//! An in-memory request.

use bytes::Bytes;
use http::header::{HeaderMap, HeaderName, HeaderValue};
use portico_core::{Context, Param, Request};

/// A [`Request`] built by hand for tests.
///
/// # Example
///
/// ```
/// use portico_core::Request;
/// use portico_test::TestRequest;
///
/// let req = TestRequest::get("/api/tasks/{id}")
///     .param("id", "42")
///     .header("x-api-client-application", "suite");
///
/// assert_eq!(Request::param(&req, "id"), Some("42"));
/// ```
#[derive(Debug, Default)]
pub struct TestRequest {
    context: Context,
    declared_path: String,
    params: Vec<Param>,
    queries: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl TestRequest {
    /// Starts a request for a route template.
    #[must_use]
    pub fn get(declared_path: impl Into<String>) -> Self {
        Self {
            declared_path: declared_path.into(),
            ..Self::default()
        }
    }

    /// Adds a path parameter.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push(Param::new(key, value));
        self
    }

    /// Adds a query pair.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.queries.push((key.into(), value.into()));
        self
    }

    /// Appends a header value. Invalid names or values panic, since test
    /// input is author-controlled.
    #[must_use]
    pub fn header(mut self, name: &str, value: &str) -> Self {
        let name: HeaderName = name.parse().expect("valid test header name");
        let value = HeaderValue::from_str(value).expect("valid test header value");
        self.headers.append(name, value);
        self
    }

    /// Sets the request body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the starting context.
    #[must_use]
    pub fn context(mut self, context: Context) -> Self {
        self.context = context;
        self
    }
}

impl Request for TestRequest {
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
