//! JSON response and body helpers.

use crate::error::ResponseError;
use crate::response::Response;
use bytes::Bytes;
use http::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

const APPLICATION_JSON: &str = "application/json";

fn json_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON));
    headers
}

/// Builds a JSON response by serializing `value`.
///
/// Serialization failure does not propagate: the caller gets a
/// `500 Internal Server Error` JSON body naming the offending type and the
/// serializer's message instead.
#[must_use]
pub fn json_response<T: Serialize + ?Sized>(status: StatusCode, value: &T) -> Response {
    match serde_json::to_vec(value) {
        Ok(body) => Response::with_headers(status, body, json_headers()),
        Err(err) => {
            let status = StatusCode::INTERNAL_SERVER_ERROR;
            let body = serde_json::json!({
                "status": status.as_u16(),
                "error": status.canonical_reason().unwrap_or(""),
                "message": format!(
                    "Internal Server Error: failed to encode {}",
                    std::any::type_name::<T>()
                ),
                "causes": [err.to_string()],
            });
            // json! output of plain strings and numbers cannot fail to encode.
            let bytes = serde_json::to_vec(&body).unwrap_or_default();
            Response::with_headers(status, bytes, json_headers())
        }
    }
}

/// Builds a JSON response from pre-encoded bytes.
///
/// The bytes are trusted to be valid JSON; only the `Content-Type` header
/// is added.
#[must_use]
pub fn json_response_bytes(status: StatusCode, body: impl Into<Bytes>) -> Response {
    Response::with_headers(status, body, json_headers())
}

/// Builds a bodyless response that still advertises a JSON content type.
#[must_use]
pub fn json_response_empty(status: StatusCode) -> Response {
    Response::with_headers(status, Bytes::new(), json_headers())
}

/// Builds the JSON error response for a [`ResponseError`].
#[must_use]
pub fn error_response(err: &ResponseError) -> Response {
    json_response(err.status(), err)
}

/// Decodes a JSON request body into a concrete type.
pub fn decode_json<T: DeserializeOwned>(body: &[u8]) -> Result<T, serde_json::Error> {
    serde_json::from_slice(body)
}
