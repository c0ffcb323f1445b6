//! Options that are either a plain value or a zero-argument producer.

use std::{fmt, sync::Arc};

/// A configuration value given either literally or as a producer.
///
/// Producers are evaluated on every [`Resolvable::resolve`] call, so callers
/// resolve once per need and keep the result.
pub enum Resolvable<T> {
    /// A plain value.
    Literal(T),
    /// A producer evaluated on demand.
    Producer(Arc<dyn Fn() -> T + Send + Sync>),
}

impl<T> Resolvable<T> {
    /// Wrap a producer closure.
    pub fn producer<F>(f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self::Producer(Arc::new(f))
    }

    /// Whether this value is computed on demand.
    pub fn is_producer(&self) -> bool {
        matches!(self, Self::Producer(_))
    }
}

impl<T: Clone> Resolvable<T> {
    /// Resolve to a concrete value.
    pub fn resolve(&self) -> T {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Producer(f) => f(),
        }
    }
}

impl<T> From<T> for Resolvable<T> {
    fn from(value: T) -> Self {
        Self::Literal(value)
    }
}

impl<T: Clone> Clone for Resolvable<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Literal(value) => Self::Literal(value.clone()),
            Self::Producer(f) => Self::Producer(Arc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolvable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Producer(_) => f.write_str("Producer(..)"),
        }
    }
}
