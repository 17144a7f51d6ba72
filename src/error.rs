//! Error taxonomy for the POR core.
//!
//! Precondition and invariant violations are programming errors in the host
//! driving the configuration/node/unfolding: they are surfaced as `Err`
//! rather than panicking so an embedding host can decide how to fail (abort,
//! log-and-skip the permutation, …), but they are never recovered from
//! silently by this crate.

use thiserror::Error;

/// Everything that can go wrong while driving the POR core.
#[derive(Debug, Error)]
pub enum PorError {
    /// The caller asked for an operation whose precondition does not hold
    /// against the current configuration (e.g. releasing a lock the calling
    /// thread does not hold, joining a thread that has not exited).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// An internal consistency check failed: a dedup key collided with a
    /// structurally different event, a cone is missing an expected thread,
    /// catch-up replay diverged from the recorded schedule, or a fingerprint
    /// bag ref-count underflowed. These indicate a bug in this crate or in
    /// how the host is replaying a schedule, never a bug in the modeled
    /// program.
    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl PorError {
    pub(crate) fn invalid(msg: impl Into<String>) -> PorError {
        PorError::InvalidOperation(msg.into())
    }

    pub(crate) fn invariant(msg: impl Into<String>) -> PorError {
        PorError::InvariantViolation(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PorError>;
