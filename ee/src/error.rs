//! Emitter error types

use thiserror::Error;

/// Errors returned by registration and emission
///
/// Listener panics are not represented here: they are recovered at the
/// listener boundary and reported through diagnostics instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmitterError {
    #[error("event \"{event}\" takes {expected} argument(s), got {found}")]
    ArityMismatch {
        event: String,
        expected: usize,
        found: usize,
    },

    #[error("event \"{event}\" takes {expected}, got {found}")]
    TypeMismatch {
        event: String,
        expected: String,
        found: String,
    },
}

impl EmitterError {
    /// Name of the event the error was raised for
    pub fn event(&self) -> &str {
        match self {
            EmitterError::ArityMismatch { event, .. } => event,
            EmitterError::TypeMismatch { event, .. } => event,
        }
    }

    /// Check if this is an arity mismatch (as opposed to a positional type mismatch)
    pub fn is_arity_mismatch(&self) -> bool {
        matches!(self, EmitterError::ArityMismatch { .. })
    }
}
