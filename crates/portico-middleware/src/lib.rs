//! # Portico Middleware
//!
//! The interceptor chain for the Portico web toolkit.
//!
//! A [`Chain`] threads a request through an ordered list of
//! [`Interceptor`]s and finally a terminal
//! [`Handler`](portico_core::Handler). Each interceptor decides whether to
//! call [`InterceptedRequest::next`] (pass-through) or answer on its own
//! (short-circuit). Whatever downstream writes is captured by a
//! [`CaptureWriter`] so upstream interceptors can observe the finished
//! response, and a panicking link is skipped rather than taking the
//! exchange down.

#![doc(html_root_url = "https://docs.rs/portico-middleware/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod chain;
mod interceptor;
mod writer;

pub use chain::Chain;
pub use interceptor::{InterceptedRequest, Interceptor};
pub use writer::{CaptureWriter, ResponseWriter};
