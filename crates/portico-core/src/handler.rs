//! Terminal request handlers.

use crate::request::Request;
use crate::response::Response;
use http::StatusCode;
use std::future::Future;
use std::pin::Pin;

/// A boxed future, the output type of dynamic async traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The terminal stage of a request chain.
///
/// A handler turns a request into a [`Response`]. It has no failure mode:
/// errors are expressed as error responses (see
/// [`error_response`](crate::error_response)), and panics are caught by the
/// chain driver and reported as `500 Internal Server Error`.
pub trait Handler: Send + Sync + 'static {
    /// Handles one request.
    fn handle<'a>(&'a self, request: &'a mut dyn Request) -> BoxFuture<'a, Response>;
}

/// Adapts a closure into a [`Handler`].
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use portico_core::{FnHandler, Response};
///
/// let handler = FnHandler::new(|_req| {
///     Box::pin(async { Response::new(StatusCode::OK, "hello") })
/// });
/// ```
pub struct FnHandler<F> {
    f: F,
}

impl<F> FnHandler<F>
where
    F: for<'a> Fn(&'a mut dyn Request) -> BoxFuture<'a, Response> + Send + Sync + 'static,
{
    /// Wraps a closure as a handler.
    #[must_use]
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> Handler for FnHandler<F>
where
    F: for<'a> Fn(&'a mut dyn Request) -> BoxFuture<'a, Response> + Send + Sync + 'static,
{
    fn handle<'a>(&'a self, request: &'a mut dyn Request) -> BoxFuture<'a, Response> {
        (self.f)(request)
    }
}

/// A liveness handler that always answers `200 OK` with `pong`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ping;

impl Handler for Ping {
    fn handle<'a>(&'a self, _request: &'a mut dyn Request) -> BoxFuture<'a, Response> {
        Box::pin(async { Response::new(StatusCode::OK, "pong") })
    }
}
