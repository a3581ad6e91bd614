//! Error taxonomy for the satellite control plane.
//!
//! Categorized by recovery path:
//! - [`SatelliteError::InvalidRequest`] / [`SatelliteError::NotReady`]: caller mistakes, returned to the caller untouched.
//! - [`SatelliteError::ConfigError`]: fatal at startup.
//! - [`SatelliteError::AlreadyStarted`] / [`SatelliteError::MasterUnavailable`] / [`SatelliteError::Cancelled`]: expected runtime conditions.
//! - [`SatelliteError::Internal`]: a bug; logged and surfaced rather than swallowed.

use thiserror::Error;

pub type SatelliteResult<T> = Result<T, SatelliteError>;

#[derive(Debug, Error)]
pub enum SatelliteError {
    /// Caller violated a contract: unknown container, ownership mismatch, bad
    /// parameter, malformed address. No state change has occurred.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The container is not in a state that permits the requested operation.
    #[error("not ready: {0}")]
    NotReady(String),

    /// Process-wide configuration is invalid. Fatal at startup.
    #[error("config error: {0}")]
    ConfigError(String),

    /// A container directory already exists for the requested address.
    #[error("already started: {0}")]
    AlreadyStarted(String),

    /// The master link is down while an address request is outstanding.
    #[error("master unavailable: {0}")]
    MasterUnavailable(String),

    /// The satellite is shutting down; the operation was abandoned.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Any inconsistency indicating a bug rather than a caller or
    /// environment error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Filesystem or subprocess I/O failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
