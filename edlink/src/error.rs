//! Error types for edlink.

use std::io;
use thiserror::Error;

/// Result type for edlink operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for edlink operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error (serial port, file operations).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Serial port error.
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    /// Short or failed transport read/write.
    #[error("{operation}: transferred {actual} of {expected} bytes")]
    Transport {
        /// The operation that came up short.
        operation: &'static str,
        /// Bytes actually transferred.
        actual: usize,
        /// Bytes requested.
        expected: usize,
    },

    /// Unexpected bytes on the wire (bad status tag, bad write ack).
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Nonzero status code reported by the device.
    #[error("Device reported status {code:#04x}")]
    Device {
        /// The raw status code, surfaced for diagnostics.
        code: u8,
    },

    /// No usable serial port could be selected.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Local source image unreadable or truncated.
    #[error("Failed to read source file: {0}")]
    SourceRead(String),

    /// The device did not come back in application mode within the retry
    /// budget. The transport is left closed.
    #[error("Device did not reconnect in application mode after {attempts} attempts")]
    ReconnectExhausted {
        /// Number of reopen attempts made.
        attempts: usize,
    },
}
