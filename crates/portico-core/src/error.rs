//! Error-to-response mapping.
//!
//! [`ResponseError`] is a failed operation in HTTP clothing: a status code
//! plus the underlying causes. [`ErrorHandler`] decides which status an
//! arbitrary error deserves, driven by an ordered list of [`ErrorMapper`]
//! closures.

use http::StatusCode;
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::fmt;

/// An error carrying the HTTP status it should be reported with.
///
/// The status is chosen up front (usually by an [`ErrorHandler`]); the
/// causes preserve the original failures for logging and for the JSON
/// error body.
#[derive(Debug)]
pub struct ResponseError {
    /// HTTP status to report.
    status: StatusCode,

    /// Underlying failures, in the order they were attached.
    causes: Vec<anyhow::Error>,
}

impl ResponseError {
    /// Creates a response error with no causes.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            causes: Vec::new(),
        }
    }

    /// Creates a response error wrapping a single cause.
    #[must_use]
    pub fn with_cause(status: StatusCode, cause: impl Into<anyhow::Error>) -> Self {
        Self {
            status,
            causes: vec![cause.into()],
        }
    }

    /// Creates a response error from a list of causes.
    #[must_use]
    pub fn from_causes(status: StatusCode, causes: Vec<anyhow::Error>) -> Self {
        Self { status, causes }
    }

    /// Returns the HTTP status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Returns the underlying causes.
    #[must_use]
    pub fn causes(&self) -> &[anyhow::Error] {
        &self.causes
    }

    /// Returns the canonical reason phrase for the status, or `""` for
    /// unassigned codes.
    fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }
}

impl fmt::Display for ResponseError {
    /// Formats as `"<status text>"` with no causes, `"<status text>: <cause>"`
    /// with one, and `"<status text>: A, B and C"` with several.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.status_text())?;
        match self.causes.len() {
            0 => Ok(()),
            1 => write!(f, ": {}", self.causes[0]),
            n => {
                write!(f, ": ")?;
                for (i, cause) in self.causes.iter().enumerate() {
                    if i == n - 1 {
                        write!(f, " and {cause}")?;
                    } else if i > 0 {
                        write!(f, ", {cause}")?;
                    } else {
                        write!(f, "{cause}")?;
                    }
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ResponseError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.causes
            .first()
            .map(|c| c.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl Serialize for ResponseError {
    /// Serializes to the wire error shape:
    ///
    /// ```json
    /// {"status": 404, "error": "Not Found", "message": "Not Found: ...", "causes": ["..."]}
    /// ```
    ///
    /// The `causes` field is omitted when empty.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = if self.causes.is_empty() { 3 } else { 4 };
        let mut state = serializer.serialize_struct("ResponseError", fields)?;
        state.serialize_field("status", &self.status.as_u16())?;
        state.serialize_field("error", self.status_text())?;
        state.serialize_field("message", &self.to_string())?;
        if !self.causes.is_empty() {
            let causes: Vec<String> = self.causes.iter().map(ToString::to_string).collect();
            state.serialize_field("causes", &causes)?;
        }
        state.end()
    }
}

/// A single error-classification rule.
///
/// Given an error, a mapper either claims it by returning the status it
/// should be reported with, or declines with `None`.
pub type ErrorMapper = Box<dyn Fn(&anyhow::Error) -> Option<StatusCode> + Send + Sync>;

/// Maps arbitrary errors to [`ResponseError`] values through an ordered
/// list of [`ErrorMapper`] rules.
///
/// Every mapper in the list is consulted; when several claim the same
/// error, the last match wins. An unclaimed error falls back to the
/// default status (`500 Internal Server Error` unless overridden).
///
/// # Example
///
/// ```
/// use http::StatusCode;
/// use portico_core::ErrorHandler;
///
/// #[derive(Debug, PartialEq, thiserror::Error)]
/// #[error("record not found")]
/// struct NotFound;
///
/// let handler = ErrorHandler::new(vec![
///     ErrorHandler::value_mapper(NotFound, StatusCode::NOT_FOUND),
/// ]);
///
/// let err = handler.handle(anyhow::Error::new(NotFound));
/// assert_eq!(err.status(), StatusCode::NOT_FOUND);
/// ```
pub struct ErrorHandler {
    mappers: Vec<ErrorMapper>,
}

impl ErrorHandler {
    /// Creates a handler from an ordered list of mappers.
    #[must_use]
    pub fn new(mappers: Vec<ErrorMapper>) -> Self {
        Self { mappers }
    }

    /// Builds a mapper matching a specific sentinel value.
    ///
    /// The error's chain is walked; any link that downcasts to `E` and
    /// compares equal to the sentinel claims the error.
    #[must_use]
    pub fn value_mapper<E>(sentinel: E, status: StatusCode) -> ErrorMapper
    where
        E: std::error::Error + PartialEq + Send + Sync + 'static,
    {
        Box::new(move |err| {
            err.chain()
                .any(|e| e.downcast_ref::<E>().is_some_and(|c| *c == sentinel))
                .then_some(status)
        })
    }

    /// Builds a mapper matching any error of a concrete type.
    ///
    /// The error's chain is walked; any link that downcasts to `E` claims
    /// the error regardless of its value.
    #[must_use]
    pub fn type_mapper<E>(status: StatusCode) -> ErrorMapper
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Box::new(move |err| {
            err.chain()
                .any(|e| e.downcast_ref::<E>().is_some())
                .then_some(status)
        })
    }

    /// Classifies an error and wraps it as a [`ResponseError`], defaulting
    /// to `500 Internal Server Error` when no mapper claims it.
    #[must_use]
    pub fn handle(&self, err: anyhow::Error) -> ResponseError {
        self.handle_with_default(err, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Classifies an error and wraps it as a [`ResponseError`] with an
    /// explicit fallback status.
    #[must_use]
    pub fn handle_with_default(&self, err: anyhow::Error, default: StatusCode) -> ResponseError {
        let status = self.status_with_default(&err, default);
        ResponseError::from_causes(status, vec![err])
    }

    /// Returns the status the mappers assign to an error, defaulting to
    /// `500 Internal Server Error`.
    #[must_use]
    pub fn status(&self, err: &anyhow::Error) -> StatusCode {
        self.status_with_default(err, StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Returns the status the mappers assign to an error with an explicit
    /// fallback. Mappers are consulted in order and each match overwrites
    /// the running status, so the last matching mapper wins.
    #[must_use]
    pub fn status_with_default(&self, err: &anyhow::Error, default: StatusCode) -> StatusCode {
        let mut status = default;
        for mapper in &self.mappers {
            if let Some(mapped) = mapper(err) {
                status = mapped;
            }
        }
        status
    }
}

impl fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorHandler")
            .field("mappers", &self.mappers.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context as _;
    use proptest::prelude::*;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("record not found")]
    struct NotFound;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("conflicting write")]
    struct Conflict;

    #[derive(Debug, thiserror::Error)]
    #[error("invalid field {field}")]
    struct Invalid {
        field: &'static str,
    }

    #[test]
    fn test_display_no_causes() {
        let err = ResponseError::new(StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Not Found");
    }

    #[test]
    fn test_display_single_cause() {
        let err = ResponseError::with_cause(StatusCode::NOT_FOUND, NotFound);
        assert_eq!(err.to_string(), "Not Found: record not found");
    }

    #[test]
    fn test_display_multiple_causes() {
        let err = ResponseError::from_causes(
            StatusCode::BAD_REQUEST,
            vec![
                anyhow::anyhow!("A"),
                anyhow::anyhow!("B"),
                anyhow::anyhow!("C"),
            ],
        );
        assert_eq!(err.to_string(), "Bad Request: A, B and C");
    }

    #[test]
    fn test_display_two_causes() {
        let err = ResponseError::from_causes(
            StatusCode::BAD_REQUEST,
            vec![anyhow::anyhow!("A"), anyhow::anyhow!("B")],
        );
        assert_eq!(err.to_string(), "Bad Request: A and B");
    }

    #[test]
    fn test_serialize_with_causes() {
        let err = ResponseError::with_cause(StatusCode::NOT_FOUND, NotFound);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status": 404,
                "error": "Not Found",
                "message": "Not Found: record not found",
                "causes": ["record not found"],
            })
        );
    }

    #[test]
    fn test_serialize_omits_empty_causes() {
        let err = ResponseError::new(StatusCode::INTERNAL_SERVER_ERROR);
        let json = serde_json::to_value(&err).unwrap();
        assert!(json.get("causes").is_none());
        assert_eq!(json["status"], 500);
        assert_eq!(json["error"], "Internal Server Error");
    }

    #[test]
    fn test_source_is_first_cause() {
        use std::error::Error as _;
        let err = ResponseError::with_cause(StatusCode::NOT_FOUND, NotFound);
        assert_eq!(err.source().unwrap().to_string(), "record not found");
        assert!(ResponseError::new(StatusCode::NOT_FOUND).source().is_none());
    }

    #[test]
    fn test_value_mapper_matches_sentinel() {
        let handler = ErrorHandler::new(vec![ErrorHandler::value_mapper(
            NotFound,
            StatusCode::NOT_FOUND,
        )]);
        assert_eq!(
            handler.status(&anyhow::Error::new(NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            handler.status(&anyhow::Error::new(Conflict)),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_value_mapper_matches_through_wrapping() {
        let handler = ErrorHandler::new(vec![ErrorHandler::value_mapper(
            NotFound,
            StatusCode::NOT_FOUND,
        )]);
        let wrapped = anyhow::Error::new(NotFound).context("loading task");
        assert_eq!(handler.status(&wrapped), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_type_mapper_matches_any_value() {
        let handler = ErrorHandler::new(vec![ErrorHandler::type_mapper::<Invalid>(
            StatusCode::BAD_REQUEST,
        )]);
        assert_eq!(
            handler.status(&anyhow::Error::new(Invalid { field: "title" })),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            handler.status(&anyhow::Error::new(Invalid { field: "status" })),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_last_matching_mapper_wins() {
        let handler = ErrorHandler::new(vec![
            ErrorHandler::value_mapper(NotFound, StatusCode::NOT_FOUND),
            ErrorHandler::value_mapper(NotFound, StatusCode::GONE),
        ]);
        assert_eq!(
            handler.status(&anyhow::Error::new(NotFound)),
            StatusCode::GONE
        );
    }

    #[test]
    fn test_non_matching_mapper_does_not_reset() {
        let handler = ErrorHandler::new(vec![
            ErrorHandler::value_mapper(NotFound, StatusCode::NOT_FOUND),
            ErrorHandler::value_mapper(Conflict, StatusCode::CONFLICT),
        ]);
        assert_eq!(
            handler.status(&anyhow::Error::new(NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_handle_wraps_original_error() {
        let handler = ErrorHandler::new(vec![ErrorHandler::value_mapper(
            NotFound,
            StatusCode::NOT_FOUND,
        )]);
        let err = handler.handle(anyhow::Error::new(NotFound));
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
        assert_eq!(err.causes().len(), 1);
        assert_eq!(err.causes()[0].to_string(), "record not found");
    }

    #[test]
    fn test_handle_with_default() {
        let handler = ErrorHandler::new(vec![]);
        let err =
            handler.handle_with_default(anyhow::anyhow!("boom"), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(err.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    proptest! {
        #[test]
        fn test_empty_handler_always_returns_default(code in 400_u16..600) {
            let default = StatusCode::from_u16(code).unwrap();
            let handler = ErrorHandler::new(vec![]);
            let status = handler.status_with_default(&anyhow::anyhow!("anything"), default);
            prop_assert_eq!(status, default);
        }
    }
}
