//! Per-exchange context.
//!
//! A [`Context`] travels with a request for exactly one HTTP exchange. It is
//! the deadline carrier and holds typed extension data that interceptors can
//! attach for downstream consumers. Interceptors replace it for the rest of
//! the chain through `InterceptedRequest::apply`.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::time::Instant;

/// Request-scoped context: deadline plus type-keyed extension data.
///
/// The context is the cancellation/deadline carrier for one exchange.
/// Deadline enforcement itself belongs to the transport adapter; this type
/// only transports the value.
///
/// # Example
///
/// ```
/// use portico_core::Context;
///
/// #[derive(Debug, PartialEq)]
/// struct TenantId(String);
///
/// let mut ctx = Context::new();
/// ctx.set_extension(TenantId("acme".to_string()));
///
/// assert_eq!(ctx.get_extension::<TenantId>(), Some(&TenantId("acme".to_string())));
/// ```
#[derive(Debug, Default)]
pub struct Context {
    /// Absolute deadline for the exchange, if any.
    deadline: Option<Instant>,

    /// Type-erased extension data keyed by type.
    extensions: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Context {
    /// Creates an empty context with no deadline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a context with an absolute deadline.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
            extensions: HashMap::new(),
        }
    }

    /// Returns the deadline, if one was set.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Sets the deadline.
    pub fn set_deadline(&mut self, deadline: Instant) {
        self.deadline = Some(deadline);
    }

    /// Returns `true` if a deadline was set and has passed.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Stores a typed extension value, replacing any previous value of the
    /// same type.
    pub fn set_extension<T: Send + Sync + 'static>(&mut self, value: T) {
        self.extensions.insert(TypeId::of::<T>(), Box::new(value));
    }

    /// Retrieves a typed extension value.
    #[must_use]
    pub fn get_extension<T: Send + Sync + 'static>(&self) -> Option<&T> {
        self.extensions
            .get(&TypeId::of::<T>())
            .and_then(|v| v.downcast_ref())
    }

    /// Removes and returns a typed extension value.
    pub fn remove_extension<T: Send + Sync + 'static>(&mut self) -> Option<T> {
        self.extensions
            .remove(&TypeId::of::<T>())
            .and_then(|v| v.downcast().ok())
            .map(|b| *b)
    }

    /// Checks if an extension of the given type exists.
    #[must_use]
    pub fn has_extension<T: Send + Sync + 'static>(&self) -> bool {
        self.extensions.contains_key(&TypeId::of::<T>())
    }
}
