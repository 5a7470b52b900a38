//! The chain driver.

use crate::interceptor::{InterceptedRequest, Interceptor};
use crate::writer::{CaptureWriter, ResponseWriter};
use futures_util::FutureExt;
use http::header::{HeaderName, HeaderValue};
use http::StatusCode;
use portico_core::{error_response, BoxFuture, Handler, Request, Response, ResponseError};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

/// An ordered list of [`Interceptor`]s terminated by a
/// [`Handler`].
///
/// The chain owns its links, so one `Chain` serves every request for a
/// route. [`run`](Chain::run) drives one exchange through the links in
/// installation order and writes the winning response to the transport's
/// sink.
///
/// # Example
///
/// ```
/// use portico_core::Ping;
/// use portico_middleware::Chain;
///
/// let chain = Chain::new(Ping);
/// assert_eq!(chain.len(), 0);
/// ```
pub struct Chain {
    interceptors: Vec<Arc<dyn Interceptor>>,
    handler: Arc<dyn Handler>,
}

impl Chain {
    /// Creates a chain with no interceptors around a terminal handler.
    #[must_use]
    pub fn new(handler: impl Handler) -> Self {
        Self::from_handler(Arc::new(handler))
    }

    /// Creates a chain around an already-shared handler.
    #[must_use]
    pub fn from_handler(handler: Arc<dyn Handler>) -> Self {
        Self {
            interceptors: Vec::new(),
            handler,
        }
    }

    /// Appends an interceptor. Links run in the order they are added.
    #[must_use]
    pub fn intercept(mut self, interceptor: impl Interceptor) -> Self {
        self.interceptors.push(Arc::new(interceptor));
        self
    }

    /// Appends an already-shared interceptor.
    #[must_use]
    pub fn intercept_arc(mut self, interceptor: Arc<dyn Interceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    /// Returns the number of installed interceptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interceptors.len()
    }

    /// Returns `true` if no interceptors are installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interceptors.is_empty()
    }

    /// Drives one request through the chain, writing the response to
    /// `sink`, and returns the response that was written.
    pub async fn run(&self, request: &mut dyn Request, sink: &mut dyn ResponseWriter) -> Response {
        let mut out = CaptureWriter::new(sink);
        self.run_from(0, request, &mut out).await
    }

    /// Runs the suffix of the chain starting at `index`.
    ///
    /// Each frame owns the `next_called` flag for its link so that after
    /// the link's future resolves (or panics) the driver knows whether
    /// downstream already produced the response.
    pub(crate) fn run_from<'a, 'w>(
        &'a self,
        index: usize,
        request: &'a mut dyn Request,
        out: &'a mut CaptureWriter<'w>,
    ) -> BoxFuture<'a, Response>
    where
        'w: 'a,
    {
        Box::pin(async move {
            let Some(interceptor) = self.interceptors.get(index) else {
                return self.run_handler(request, out).await;
            };

            let mut next_called = false;
            let outcome = {
                let intercepted = InterceptedRequest::new(
                    &mut *request,
                    &mut *out,
                    self,
                    index,
                    &mut next_called,
                );
                AssertUnwindSafe(interceptor.handle(intercepted))
                    .catch_unwind()
                    .await
            };

            match outcome {
                Ok(declared) => {
                    if next_called {
                        // Downstream already produced the response; only
                        // header changes declared by this link survive.
                        reconcile_headers(out, &declared);
                        out.response()
                    } else {
                        write_response(out, &declared);
                        declared
                    }
                }
                Err(panic) => {
                    tracing::error!(
                        interceptor = interceptor.name(),
                        panic = %panic_message(&panic),
                        "interceptor panicked, skipping link"
                    );
                    if next_called {
                        out.response()
                    } else {
                        self.run_from(index + 1, request, out).await
                    }
                }
            }
        })
    }

    async fn run_handler<'w>(
        &self,
        request: &mut dyn Request,
        out: &mut CaptureWriter<'w>,
    ) -> Response {
        let outcome = AssertUnwindSafe(self.handler.handle(request))
            .catch_unwind()
            .await;
        match outcome {
            Ok(response) => {
                write_response(out, &response);
                response
            }
            Err(panic) => {
                let message = panic_message(&panic);
                tracing::error!(panic = %message, "handler panicked");
                let err = ResponseError::with_cause(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    anyhow::anyhow!("handler panicked: {message}"),
                );
                let response = error_response(&err);
                write_response(out, &response);
                response
            }
        }
    }
}

impl std::fmt::Debug for Chain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Chain")
            .field("interceptors", &self.interceptors.len())
            .finish_non_exhaustive()
    }
}

/// Writes a declared response to the sink: status, headers (replacing any
/// existing values for the declared names), then the body.
fn write_response(out: &mut dyn ResponseWriter, response: &Response) {
    out.set_status(response.status());
    for name in response.headers().keys() {
        replace_header(out, name, response);
    }
    let body = response.body_bytes();
    if !body.is_empty() {
        out.write_body(body);
    }
}

/// Applies the header changes a pass-through interceptor declared on top
/// of what downstream wrote. Status and body are already on the wire and
/// stay untouched; for each header name the declared response carries, the
/// sink's values are replaced when they differ as a multiset.
fn reconcile_headers(out: &mut dyn ResponseWriter, declared: &Response) {
    for name in declared.headers().keys() {
        let current: Vec<&HeaderValue> = out.headers().get_all(name).iter().collect();
        let wanted: Vec<&HeaderValue> = declared.headers().get_all(name).iter().collect();
        if !value_sets_equal(&current, &wanted) {
            replace_header(out, name, declared);
        }
    }
}

fn replace_header(out: &mut dyn ResponseWriter, name: &HeaderName, from: &Response) {
    let values: Vec<HeaderValue> = from.headers().get_all(name).iter().cloned().collect();
    out.headers_mut().remove(name);
    for value in values {
        out.headers_mut().append(name.clone(), value);
    }
}

/// Multiset comparison: same values with the same occurrence counts.
fn value_sets_equal(a: &[&HeaderValue], b: &[&HeaderValue]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut a_sorted: Vec<&[u8]> = a.iter().map(|v| v.as_bytes()).collect();
    let mut b_sorted: Vec<&[u8]> = b.iter().map(|v| v.as_bytes()).collect();
    a_sorted.sort_unstable();
    b_sorted.sort_unstable();
    a_sorted == b_sorted
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
