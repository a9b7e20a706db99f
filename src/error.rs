//! Error types for cellwire
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using CellwireError
pub type Result<T> = std::result::Result<T, CellwireError>;

/// Unified error type for cellwire operations
#[derive(Debug, Error)]
pub enum CellwireError {
    // -------------------------------------------------------------------------
    // Network Errors
    // -------------------------------------------------------------------------
    /// Resolution, dial, socket option, write, read or timeout failure.
    #[error("Connection error: {0}")]
    Connection(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    /// Malformed or truncated bytes on the wire.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The caller broke the calling contract (too many arguments, bad value).
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl CellwireError {
    /// True for failures that leave the socket in an unknown state
    pub fn is_connection(&self) -> bool {
        matches!(self, CellwireError::Connection(_))
    }
}
