//! Error types for the AT command engine.

use atcmd_scan::{FormatError, ScanError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::transport::TransportError;

/// Coarse classification of [`AtError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// No byte arrived within the per-character timeout.
    Timeout,
    /// Writing to the transport, initialising it, or formatting a command failed.
    Io,
    /// An out-of-band handler asked for the receive to stop.
    Aborted,
    /// The response pattern is malformed or cannot fit the scratch buffer.
    InvalidPattern,
    /// The session configuration was rejected.
    Config,
}

/// Errors that can occur while talking to a device.
#[derive(Debug, Error)]
pub enum AtError {
    /// No byte arrived within the per-character timeout.
    #[error("timeout waiting for response")]
    Timeout,

    /// A byte could not be written to the transport.
    #[error("serial write failed: {0}")]
    Write(#[source] TransportError),

    /// The transport failed to initialise.
    #[error("transport init failed: {0}")]
    Init(#[source] TransportError),

    /// The command could not be formatted.
    #[error("failed to format command: {0}")]
    Format(#[from] FormatError),

    /// The formatted command does not fit the scratch buffer.
    #[error("command too long: max {max} bytes, got {actual}")]
    CommandTooLong { max: usize, actual: usize },

    /// An out-of-band handler aborted the receive.
    #[error("receive aborted by out-of-band handler")]
    Aborted,

    /// The response pattern is malformed.
    #[error("invalid response pattern: {0}")]
    InvalidPattern(#[from] ScanError),

    /// A rewritten pattern line does not fit the scratch buffer.
    #[error("pattern line too long: max {max} bytes, got {actual}")]
    PatternTooLong { max: usize, actual: usize },

    /// The session configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
}

impl AtError {
    /// Classify the error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AtError::Timeout => ErrorKind::Timeout,
            AtError::Write(_) | AtError::Init(_) | AtError::Format(_) | AtError::CommandTooLong { .. } => {
                ErrorKind::Io
            }
            AtError::Aborted => ErrorKind::Aborted,
            AtError::InvalidPattern(_) | AtError::PatternTooLong { .. } => ErrorKind::InvalidPattern,
            AtError::Config(_) => ErrorKind::Config,
        }
    }

    /// Whether this is a per-character timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, AtError::Timeout)
    }
}

/// Result type alias for engine operations.
pub type AtResult<T> = Result<T, AtError>;
