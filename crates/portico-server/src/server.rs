//! The HTTP server.
//!
//! Binds a TCP listener, serves HTTP/1.1 connections with hyper, and
//! dispatches each request through the matched route's interceptor chain.

use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;

use portico_core::{error_response, Handler, Response, ResponseError};
use portico_middleware::{Chain, Interceptor};

use crate::config::ServerConfig;
use crate::request::{BufferedWriter, HttpRequest};
use crate::router::Router;
use crate::shutdown::{Drain, ShutdownSignal};

/// Errors starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured bind address could not be parsed.
    #[error("invalid bind address '{addr}': {source}")]
    InvalidAddr {
        /// The configured address string.
        addr: String,
        /// The parse failure.
        source: std::net::AddrParseError,
    },

    /// Binding the listener failed.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// The configured address string.
        addr: String,
        /// The I/O failure.
        source: std::io::Error,
    },
}

/// The Portico HTTP server.
///
/// Routes and interceptors are registered up front; [`run`](Server::run)
/// then serves until a shutdown signal arrives. Interceptors are shared:
/// every registered route runs the full interceptor list in registration
/// order before its handler.
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use portico_core::Ping;
/// use portico_server::{Server, ServerConfig};
///
/// let mut server = Server::new(ServerConfig::default());
/// server.route(Method::GET, "/ping", Ping);
/// ```
pub struct Server {
    config: ServerConfig,
    interceptors: Vec<Arc<dyn Interceptor>>,
    routes: Vec<(Method, String, Arc<dyn Handler>)>,
}

impl Server {
    /// Creates a server with no routes or interceptors.
    #[must_use]
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            interceptors: Vec::new(),
            routes: Vec::new(),
        }
    }

    /// Returns the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Installs an interceptor for every route.
    pub fn intercept(&mut self, interceptor: impl Interceptor) {
        self.interceptors.push(Arc::new(interceptor));
    }

    /// Installs an already-shared interceptor for every route.
    pub fn intercept_arc(&mut self, interceptor: Arc<dyn Interceptor>) {
        self.interceptors.push(interceptor);
    }

    /// Registers a handler under a method and path template.
    pub fn route(&mut self, method: Method, pattern: &str, handler: impl Handler) {
        self.route_arc(method, pattern, Arc::new(handler));
    }

    /// Registers an already-shared handler under a method and path template.
    pub fn route_arc(&mut self, method: Method, pattern: &str, handler: Arc<dyn Handler>) {
        self.routes.push((method, pattern.to_string(), handler));
    }

    /// Runs the server until SIGTERM or SIGINT.
    pub async fn run(self) -> Result<(), ServerError> {
        let shutdown = ShutdownSignal::with_os_signals();
        self.run_with_shutdown(shutdown).await
    }

    /// Runs the server until the given signal triggers.
    pub async fn run_with_shutdown(self, shutdown: ShutdownSignal) -> Result<(), ServerError> {
        let addr = self
            .config
            .socket_addr()
            .map_err(|source| ServerError::InvalidAddr {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: self.config.http_addr().to_string(),
                source,
            })?;

        tracing::info!(%addr, routes = self.routes.len(), "server listening");

        let shared = Arc::new(self.into_shared());
        let drain = Drain::new();

        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, remote_addr)) => {
                            let shared = Arc::clone(&shared);
                            let guard = drain.guard();
                            let shutdown = shutdown.clone();

                            tokio::spawn(async move {
                                if let Err(err) =
                                    serve_connection(&shared, stream, shutdown).await
                                {
                                    tracing::error!(%remote_addr, error = %err, "connection error");
                                }
                                drop(guard);
                            });
                        }
                        Err(err) => {
                            tracing::error!(error = %err, "failed to accept connection");
                        }
                    }
                }

                () = shutdown.recv() => {
                    tracing::info!("shutdown signal received");
                    break;
                }
            }
        }

        let timeout = shared.shutdown_timeout;
        tracing::info!(active = drain.active(), ?timeout, "draining connections");
        tokio::select! {
            () = drain.idle() => tracing::info!("all connections closed"),
            () = tokio::time::sleep(timeout) => {
                tracing::warn!(active = drain.active(), "shutdown timeout reached");
            }
        }

        tracing::info!("server stopped");
        Ok(())
    }

    fn into_shared(self) -> SharedState {
        let mut router = Router::new();
        for (method, pattern, handler) in self.routes {
            let mut chain = Chain::from_handler(handler);
            for interceptor in &self.interceptors {
                chain = chain.intercept_arc(Arc::clone(interceptor));
            }
            router.add(method, &pattern, Arc::new(chain));
        }
        SharedState {
            router,
            request_timeout: self.config.request_timeout(),
            shutdown_timeout: self.config.shutdown_timeout(),
        }
    }
}

/// Immutable per-server state shared by all connections.
struct SharedState {
    router: Router,
    request_timeout: Duration,
    shutdown_timeout: Duration,
}

async fn serve_connection(
    shared: &Arc<SharedState>,
    stream: tokio::net::TcpStream,
    shutdown: ShutdownSignal,
) -> Result<(), hyper::Error> {
    let io = TokioIo::new(stream);
    let shared = Arc::clone(shared);

    let service = service_fn(move |req: http::Request<Incoming>| {
        let shared = Arc::clone(&shared);
        async move { handle_request(&shared, req).await }
    });

    let conn = http1::Builder::new().serve_connection(io, service);

    tokio::select! {
        result = conn => result,
        () = shutdown.recv() => Ok(()),
    }
}

async fn handle_request(
    shared: &SharedState,
    req: http::Request<Incoming>,
) -> Result<http::Response<Full<Bytes>>, Infallible> {
    let (parts, incoming) = req.into_parts();
    tracing::debug!(method = %parts.method, path = parts.uri.path(), "request received");

    let body = match tokio::time::timeout(shared.request_timeout, collect_body(incoming)).await {
        Ok(Ok(body)) => body,
        Ok(Err(err)) => {
            tracing::error!(error = %err, "failed to read request body");
            return Ok(error_to_http(&ResponseError::with_cause(
                StatusCode::BAD_REQUEST,
                anyhow::anyhow!("failed to read request body: {err}"),
            )));
        }
        Err(_) => {
            tracing::warn!("request body read timed out");
            return Ok(error_to_http(&ResponseError::with_cause(
                StatusCode::REQUEST_TIMEOUT,
                anyhow::anyhow!("request body read timed out"),
            )));
        }
    };

    Ok(dispatch(shared, &parts, body).await)
}

/// Routes a collected request and runs the matched chain.
async fn dispatch(
    shared: &SharedState,
    parts: &http::request::Parts,
    body: Bytes,
) -> http::Response<Full<Bytes>> {
    let path = parts.uri.path();
    let Some(matched) = shared.router.match_route(&parts.method, path) else {
        return error_to_http(&ResponseError::with_cause(
            StatusCode::NOT_FOUND,
            anyhow::anyhow!("no route for {} {}", parts.method, path),
        ));
    };

    let chain = Arc::clone(matched.chain());
    let pattern = matched.pattern().to_string();
    let mut request = HttpRequest::new(parts, body, pattern, matched.into_params());
    let mut writer = BufferedWriter::new();

    let outcome = tokio::time::timeout(
        shared.request_timeout,
        chain.run(&mut request, &mut writer),
    )
    .await;

    match outcome {
        Ok(_) => writer.into_http(),
        Err(_) => {
            tracing::warn!(method = %parts.method, path, "request handling timed out");
            error_to_http(&ResponseError::with_cause(
                StatusCode::GATEWAY_TIMEOUT,
                anyhow::anyhow!("request handling timed out"),
            ))
        }
    }
}

async fn collect_body(incoming: Incoming) -> Result<Bytes, hyper::Error> {
    Ok(incoming.collect().await?.to_bytes())
}

/// Converts a response value into a hyper response outside of any chain.
fn response_to_http(response: &Response) -> http::Response<Full<Bytes>> {
    let mut http_response =
        http::Response::new(Full::new(Bytes::copy_from_slice(response.body_bytes())));
    *http_response.status_mut() = response.status();
    *http_response.headers_mut() = response.headers().clone();
    http_response
}

fn error_to_http(err: &ResponseError) -> http::Response<Full<Bytes>> {
    response_to_http(&error_response(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use portico_core::Ping;

    fn shared_with_ping() -> SharedState {
        let mut server = Server::new(ServerConfig::default());
        server.route(Method::GET, "/ping", Ping);
        server.route(Method::GET, "/api/tasks/{id}", Ping);
        server.into_shared()
    }

    fn parts_for(method: Method, uri: &str) -> http::request::Parts {
        let (parts, ()) = http::Request::builder()
            .method(method)
            .uri(uri)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[tokio::test]
    async fn test_dispatch_matched_route() {
        let shared = shared_with_ping();
        let parts = parts_for(Method::GET, "/ping");

        let response = dispatch(&shared, &parts, Bytes::new()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"pong");
    }

    #[tokio::test]
    async fn test_dispatch_unknown_route_is_404_json() {
        let shared = shared_with_ping();
        let parts = parts_for(Method::GET, "/nope");

        let response = dispatch(&shared, &parts, Bytes::new()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/json"
        );

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], 404);
        assert_eq!(json["error"], "Not Found");
        assert_eq!(json["causes"][0], "no route for GET /nope");
    }

    #[tokio::test]
    async fn test_dispatch_method_mismatch_is_404() {
        let shared = shared_with_ping();
        let parts = parts_for(Method::DELETE, "/ping");

        let response = dispatch(&shared, &parts, Bytes::new()).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_run_with_invalid_address() {
        let config = ServerConfig::builder().http_addr("not-an-address").build();
        let server = Server::new(config);

        let result = server.run_with_shutdown(ShutdownSignal::new()).await;
        assert!(matches!(result, Err(ServerError::InvalidAddr { .. })));
    }

    #[tokio::test]
    async fn test_run_and_shutdown() {
        let config = ServerConfig::builder()
            .http_addr("127.0.0.1:0")
            .shutdown_timeout(Duration::from_millis(100))
            .build();
        let mut server = Server::new(config);
        server.route(Method::GET, "/ping", Ping);

        let shutdown = ShutdownSignal::new();
        shutdown.trigger();

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            server.run_with_shutdown(shutdown),
        )
        .await;

        assert!(result.is_ok());
        assert!(result.unwrap().is_ok());
    }
}
