//! Error types for the sequencer

use serde::{Deserialize, Serialize};

/// Error taxonomy for sequencing operations.
///
/// Configuration errors are fatal and returned to the caller of `add`/load.
/// State errors (`UnsupportedOperation`, `NoOp`) are swallowed by the plain
/// playback methods and only surfaced by their `try_*` counterparts.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum SequencerError {
    /// Unusable step or sequence configuration (easing, timing, target)
    #[error("Invalid configuration: {reason}")]
    InvalidConfiguration { reason: String },

    /// Transport mode cannot control animations mid-flight
    #[error("Unsupported operation: {operation} (transport: {transport})")]
    UnsupportedOperation { operation: String, transport: String },

    /// Operation is meaningless in the current state
    #[error("No-op: {operation} while {state}")]
    NoOp { operation: String, state: String },

    /// Step id does not belong to this sequence
    #[error("Step not found: {id}")]
    StepNotFound { id: String },

    /// Serialization error
    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },
}

impl SequencerError {
    /// Shorthand for an invalid configuration error
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidConfiguration {
            reason: reason.into(),
        }
    }

    /// Check if this is a recoverable error
    #[inline]
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::UnsupportedOperation { .. } | Self::NoOp { .. })
    }

    /// Get error category for logging
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::InvalidConfiguration { .. } => "configuration",
            Self::UnsupportedOperation { .. } | Self::NoOp { .. } => "playback",
            Self::StepNotFound { .. } => "data",
            Self::SerializationError { .. } => "serialization",
        }
    }
}

impl From<serde_json::Error> for SequencerError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError {
            reason: err.to_string(),
        }
    }
}
