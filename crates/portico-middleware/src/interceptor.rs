//! Interceptors and the request view they receive.

use crate::chain::Chain;
use crate::writer::{CaptureWriter, ResponseWriter};
use bytes::Bytes;
use http::header::HeaderMap;
use portico_core::{BoxFuture, Context, Param, Request, Response};

/// A single link in a request chain.
///
/// An interceptor sees the request before the terminal handler does. It can
/// pass the request on with [`InterceptedRequest::next`] and observe the
/// finished response, or answer directly without calling `next` and
/// short-circuit everything downstream.
///
/// Interceptors are fail-open: a panicking link is logged and skipped, and
/// the rest of the chain runs as if it were not installed.
pub trait Interceptor: Send + Sync + 'static {
    /// A stable name for log lines.
    fn name(&self) -> &'static str;

    /// Handles one request. The returned response is this link's verdict;
    /// see [`Chain`] for how it is reconciled with what downstream wrote.
    fn handle<'a, 'w>(&'a self, request: InterceptedRequest<'a, 'w>) -> BoxFuture<'a, Response>
    where
        'w: 'a;
}

/// The request as seen by one interceptor: read access to the request,
/// write access to the response, and the ability to invoke the rest of
/// the chain.
pub struct InterceptedRequest<'a, 'w> {
    request: &'a mut dyn Request,
    out: &'a mut CaptureWriter<'w>,
    chain: &'a Chain,
    index: usize,
    next_called: &'a mut bool,
}

impl<'a, 'w> InterceptedRequest<'a, 'w> {
    pub(crate) fn new(
        request: &'a mut dyn Request,
        out: &'a mut CaptureWriter<'w>,
        chain: &'a Chain,
        index: usize,
        next_called: &'a mut bool,
    ) -> Self {
        Self {
            request,
            out,
            chain,
            index,
            next_called,
        }
    }

    /// Invokes the rest of the chain and returns the response it produced.
    ///
    /// Calling `next` more than once re-runs the downstream links; an
    /// interceptor normally calls it exactly once or not at all.
    pub async fn next(&mut self) -> Response {
        *self.next_called = true;
        self.chain
            .run_from(self.index + 1, &mut *self.request, &mut *self.out)
            .await
    }

    /// Returns the response writer shared with downstream links.
    pub fn writer(&mut self) -> &mut dyn ResponseWriter {
        self.out
    }

    /// Replaces the request context for the remainder of the chain.
    pub fn apply(&mut self, context: Context) {
        self.request.apply(context);
    }

    /// Returns the context traveling with this exchange.
    #[must_use]
    pub fn context(&self) -> &Context {
        self.request.context()
    }

    /// Returns the route template the request matched.
    #[must_use]
    pub fn declared_path(&self) -> &str {
        self.request.declared_path()
    }

    /// Returns a path parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.param(name)
    }

    /// Returns all path parameters.
    #[must_use]
    pub fn params(&self) -> &[Param] {
        self.request.params()
    }

    /// Returns the first query value for a name.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.request.query(name)
    }

    /// Returns all decoded query pairs.
    #[must_use]
    pub fn queries(&self) -> &[(String, String)] {
        self.request.queries()
    }

    /// Returns all values for a header name.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<Vec<&str>> {
        self.request.header(name)
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        self.request.headers()
    }

    /// Moves the body out of the request.
    pub fn take_body(&mut self) -> Option<Bytes> {
        self.request.take_body()
    }
}
