//! The request capability contract.
//!
//! [`Request`] is the trait a transport binding implements so handler and
//! interceptor code can read the incoming request without knowing which
//! server is carrying it.

use crate::context::Context;
use bytes::Bytes;
use http::header::HeaderMap;

/// A single decoded path parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    key: String,
    value: String,
}

impl Param {
    /// Creates a parameter.
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// Returns the parameter name as declared in the route template.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns the decoded parameter value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Read access to an in-flight HTTP request.
///
/// Implementations bind a concrete transport's request to this contract:
/// the server crate provides one for hyper, test doubles provide another.
/// Handlers take `&mut dyn Request` so the body can be moved out exactly
/// once via [`take_body`](Request::take_body).
pub trait Request: Send {
    /// Returns the context traveling with this exchange.
    fn context(&self) -> &Context;

    /// Replaces the context for the remainder of the exchange.
    fn apply(&mut self, context: Context);

    /// Returns the route template the request matched, e.g.
    /// `/api/tasks/{id}`, not the concrete path.
    fn declared_path(&self) -> &str;

    /// Returns a path parameter by name.
    fn param(&self, name: &str) -> Option<&str>;

    /// Returns all path parameters in declaration order.
    fn params(&self) -> &[Param];

    /// Returns the first query value for a name.
    fn query(&self, name: &str) -> Option<&str>;

    /// Returns all decoded query pairs in wire order.
    fn queries(&self) -> &[(String, String)];

    /// Returns all values for a header name, or `None` if the header is
    /// absent. Values that are not valid UTF-8 are skipped.
    fn header(&self, name: &str) -> Option<Vec<&str>> {
        let values: Vec<&str> = self
            .headers()
            .get_all(name)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            None
        } else {
            Some(values)
        }
    }

    /// Returns the request headers.
    fn headers(&self) -> &HeaderMap;

    /// Moves the body out of the request. Subsequent calls return `None`.
    fn take_body(&mut self) -> Option<Bytes>;
}

/// Header naming the calling application, for audit trails.
pub const CALLER_APP_HEADER: &str = "X-Api-Client-Application";

/// Header naming the calling scope, for audit trails.
pub const CALLER_SCOPE_HEADER: &str = "X-Api-Client-Scope";

/// Value reported when a caller identification header is absent.
const UNKNOWN_CALLER: &str = "n/a";

/// Returns the calling application declared by the request, or `"n/a"`.
#[must_use]
pub fn caller_app(request: &dyn Request) -> &str {
    first_header(request, CALLER_APP_HEADER)
}

/// Returns the calling scope declared by the request, or `"n/a"`.
#[must_use]
pub fn caller_scope(request: &dyn Request) -> &str {
    first_header(request, CALLER_SCOPE_HEADER)
}

fn first_header<'r>(request: &'r dyn Request, name: &str) -> &'r str {
    request
        .headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or(UNKNOWN_CALLER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::header::{HeaderName, HeaderValue};

    struct FakeRequest {
        context: Context,
        headers: HeaderMap,
        body: Option<Bytes>,
    }

    impl FakeRequest {
        fn new(pairs: &[(&str, &str)]) -> Self {
            let mut headers = HeaderMap::new();
            for (name, value) in pairs {
                headers.append(
                    name.parse::<HeaderName>().unwrap(),
                    HeaderValue::from_str(value).unwrap(),
                );
            }
            Self {
                context: Context::new(),
                headers,
                body: Some(Bytes::from_static(b"body")),
            }
        }
    }

    impl Request for FakeRequest {
        fn context(&self) -> &Context {
            &self.context
        }

        fn apply(&mut self, context: Context) {
            self.context = context;
        }

        fn declared_path(&self) -> &str {
            "/fake"
        }

        fn param(&self, _name: &str) -> Option<&str> {
            None
        }

        fn params(&self) -> &[Param] {
            &[]
        }

        fn query(&self, _name: &str) -> Option<&str> {
            None
        }

        fn queries(&self) -> &[(String, String)] {
            &[]
        }

        fn headers(&self) -> &HeaderMap {
            &self.headers
        }

        fn take_body(&mut self) -> Option<Bytes> {
            self.body.take()
        }
    }

    #[test]
    fn test_header_returns_all_values() {
        let req = FakeRequest::new(&[("x-tag", "a"), ("x-tag", "b")]);
        assert_eq!(req.header("x-tag"), Some(vec!["a", "b"]));
    }

    #[test]
    fn test_header_absent_is_none() {
        let req = FakeRequest::new(&[]);
        assert_eq!(req.header("x-tag"), None);
    }

    #[test]
    fn test_take_body_moves_once() {
        let mut req = FakeRequest::new(&[]);
        assert_eq!(req.take_body(), Some(Bytes::from_static(b"body")));
        assert_eq!(req.take_body(), None);
    }

    #[test]
    fn test_caller_identification() {
        let req = FakeRequest::new(&[
            ("x-api-client-application", "billing"),
            ("x-api-client-scope", "invoices"),
        ]);
        assert_eq!(caller_app(&req), "billing");
        assert_eq!(caller_scope(&req), "invoices");
    }

    #[test]
    fn test_caller_identification_defaults() {
        let req = FakeRequest::new(&[]);
        assert_eq!(caller_app(&req), "n/a");
        assert_eq!(caller_scope(&req), "n/a");
    }

    #[test]
    fn test_apply_replaces_context() {
        let mut req = FakeRequest::new(&[]);
        let mut ctx = Context::new();
        ctx.set_extension(7_u32);
        req.apply(ctx);
        assert_eq!(req.context().get_extension::<u32>(), Some(&7));
    }
}
