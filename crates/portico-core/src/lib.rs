//! # Portico Core
//!
//! Core types and traits for the Portico web toolkit.
//!
//! Portico lets handler and middleware code be written once, independent of
//! the HTTP server that ultimately carries the request. This crate provides
//! the foundational pieces:
//!
//! - [`Response`] - Framework-agnostic HTTP response value
//! - [`ResponseError`] - A failed operation ready to become an HTTP response
//! - [`ErrorHandler`] - Composable error-to-status mapping
//! - [`Request`] - The capability contract a transport binding must satisfy
//! - [`Handler`] - Terminal request handler trait
//! - JSON helpers for response and error bodies

#![doc(html_root_url = "https://docs.rs/portico-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod context;
mod error;
mod handler;
mod json;
mod request;
mod response;

pub use context::Context;
pub use error::{ErrorHandler, ErrorMapper, ResponseError};
pub use handler::{BoxFuture, FnHandler, Handler, Ping};
pub use json::{decode_json, error_response, json_response, json_response_bytes, json_response_empty};
pub use request::{
    caller_app, caller_scope, Param, Request, CALLER_APP_HEADER, CALLER_SCOPE_HEADER,
};
pub use response::Response;
