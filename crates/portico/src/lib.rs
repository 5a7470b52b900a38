//! # Portico
//!
//! Write handlers and middleware once, run them on any HTTP transport.
//!
//! Portico splits a web service into a framework-agnostic layer and a
//! transport binding:
//!
//! - [`core`] - responses, errors, the request contract, JSON helpers
//! - [`middleware`] - the interceptor chain with capture and fault isolation
//! - [`server`] - the hyper binding: router, config, graceful shutdown
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use http::Method;
//! use portico::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), portico::server::ServerError> {
//!     let mut server = Server::new(ServerConfig::default());
//!     server.route(Method::GET, "/ping", Ping);
//!     server.run().await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/portico/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use portico_core as core;

pub use portico_middleware as middleware;

pub use portico_server as server;

/// The types most services need, in one import.
pub mod prelude {
    pub use portico_core::{
        caller_app, caller_scope, decode_json, error_response, json_response, json_response_bytes,
        json_response_empty, BoxFuture, Context, ErrorHandler, ErrorMapper, FnHandler, Handler,
        Param, Ping, Request, Response, ResponseError,
    };
    pub use portico_middleware::{
        CaptureWriter, Chain, InterceptedRequest, Interceptor, ResponseWriter,
    };
    pub use portico_server::{Server, ServerConfig, ShutdownSignal};
}
