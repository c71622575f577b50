//! Engine error and outcome types
//!
//! Two severities flow through the engine. Hard errors abort the raising
//! `TriplesMap`/`LogicalSource` and propagate through [`RmlResult`]. Soft
//! signals are expected control flow and deliberately live outside the error
//! channel: a recoverable missing field is [`Resolved::NotFound`], and source
//! exhaustion is `Option::None` from `next_record()`/`advance()`.

use thiserror::Error;

/// Hard, run-aborting errors
#[derive(Debug, Error)]
pub enum RmlError {
    /// Malformed reference expression, or a reference to a column absent
    /// from a tabular source's declared column set
    #[error("Invalid reference: {0}")]
    InvalidReference(String),

    /// Template with no `{...}` placeholder
    #[error("Empty template: {0}")]
    EmptyTemplate(String),

    /// Term map kind not allowed in this position
    #[error("Unsupported term map kind: {0}")]
    UnsupportedTermKind(String),

    /// Invalid source dialect or mapping configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// External resource could not be opened, fetched, or failed mid-stream
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// Malformed source payload or rejected declared query
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Result type for engine operations
pub type RmlResult<T> = Result<T, RmlError>;

/// Outcome of a soft-failing resolution step.
///
/// Callers branch differently on the two arms (continue vs skip), so this is
/// a dedicated two-branch type rather than a variant of [`RmlError`]: hard
/// errors abort a run, `NotFound` never does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved<T> {
    /// The reference produced a value
    Found(T),
    /// The reference matched nothing in this record (field-level, recoverable)
    NotFound,
}

impl<T> Resolved<T> {
    /// Convert into `Option`, discarding the `NotFound` marker
    pub fn found(self) -> Option<T> {
        match self {
            Resolved::Found(v) => Some(v),
            Resolved::NotFound => None,
        }
    }

    /// Check for the soft-miss arm
    pub fn is_not_found(&self) -> bool {
        matches!(self, Resolved::NotFound)
    }

    /// Map the found value, preserving `NotFound`
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resolved<U> {
        match self {
            Resolved::Found(v) => Resolved::Found(f(v)),
            Resolved::NotFound => Resolved::NotFound,
        }
    }

    /// Map the found value through a fallible step, preserving `NotFound`
    pub fn try_map<U>(self, f: impl FnOnce(T) -> RmlResult<U>) -> RmlResult<Resolved<U>> {
        match self {
            Resolved::Found(v) => Ok(Resolved::Found(f(v)?)),
            Resolved::NotFound => Ok(Resolved::NotFound),
        }
    }
}
