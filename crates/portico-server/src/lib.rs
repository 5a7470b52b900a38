//! # Portico Server
//!
//! The hyper transport binding for the Portico web toolkit.
//!
//! This crate turns the framework-agnostic pieces from `portico-core` and
//! `portico-middleware` into a running HTTP service: a [`Router`] that maps
//! method + path template to a chain, an [`HttpRequest`] binding hyper's
//! request to the [`Request`](portico_core::Request) contract, and a
//! [`Server`] with graceful shutdown.
//!
//! # Example
//!
//! ```rust,ignore
//! use http::Method;
//! use portico_core::Ping;
//! use portico_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), portico_server::ServerError> {
//!     let config = ServerConfig::builder()
//!         .http_addr("127.0.0.1:8080")
//!         .build();
//!
//!     let mut server = Server::new(config);
//!     server.route(Method::GET, "/ping", Ping);
//!     server.run().await
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/portico-server/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod request;
mod router;
mod server;
mod shutdown;

pub use config::{ServerConfig, ServerConfigBuilder};
pub use request::{BufferedWriter, HttpRequest};
pub use router::{RouteMatch, Router};
pub use server::{Server, ServerError};
pub use shutdown::ShutdownSignal;
