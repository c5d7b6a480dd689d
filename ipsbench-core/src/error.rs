//! Error types for registration and measurement

use std::fmt;
use thiserror::Error;

/// Error raised by a user action
pub type UserError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Stage of a run in which an item was executing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Half-length pre-warmup over all items
    Prewarm,
    /// Warmup and batch size calibration
    Warmup,
    /// Timed batches
    Measurement,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Prewarm => write!(f, "pre-warmup"),
            Phase::Warmup => write!(f, "warmup"),
            Phase::Measurement => write!(f, "measurement"),
        }
    }
}

/// Errors from registering or measuring work items
#[derive(Debug, Error)]
pub enum IpsError {
    /// The registered action is neither a callable nor usable source text
    #[error("invalid action for '{label}': {reason}")]
    InvalidAction {
        /// Item label
        label: String,
        /// What was wrong with it
        reason: String,
    },

    /// Both source text and a callable were given for one item
    #[error("'{label}': specify source text or a callable, but not both")]
    AmbiguousSpecification {
        /// Item label
        label: String,
    },

    /// The measured workload failed
    #[error("'{label}' failed during {phase}")]
    UserAction {
        /// Item label
        label: String,
        /// Phase the item was running in
        phase: Phase,
        /// Error returned by the workload
        #[source]
        source: UserError,
    },
}

impl IpsError {
    /// Label of the item the error refers to
    pub fn label(&self) -> &str {
        match self {
            IpsError::InvalidAction { label, .. }
            | IpsError::AmbiguousSpecification { label }
            | IpsError::UserAction { label, .. } => label,
        }
    }
}
