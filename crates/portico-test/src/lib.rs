//! # Portico Test
//!
//! In-memory test doubles for exercising handlers and interceptors without
//! a transport: [`TestRequest`] stands in for an incoming request,
//! [`RecordingWriter`] for the response sink.

#![doc(html_root_url = "https://docs.rs/portico-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod request;
mod writer;

pub use request::TestRequest;
pub use writer::RecordingWriter;
