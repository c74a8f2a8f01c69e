//! Port abstraction for serial communication.
//!
//! The protocol engine consumes only the [`Port`] trait, which models the
//! capabilities the session needs: byte I/O with a bounded read timeout,
//! closing and reopening the underlying device across a firmware mode
//! switch, and saving/restoring serial parameters. This keeps the protocol
//! layer I/O-agnostic so it can be exercised against a scripted in-memory
//! port in tests.
//!
//! ```text
//! +------------------+
//! |  Session layer   |
//! |  (edio protocol) |
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! |    Port trait    |
//! +--------+---------+
//!          |
//!          v
//! +--------+---------+
//! | Native SerialPort|
//! |   (serialport)   |
//! +------------------+
//! ```

pub mod native;

#[cfg(test)]
pub(crate) mod mock;

use std::io::{Read, Write};
use std::time::Duration;

use crate::error::Result;

/// Serial port configuration.
///
/// The device speaks raw 8-N-1 with no flow control, so only the parameters
/// that vary per session are modeled. A snapshot of the configuration in
/// effect before the session touches the port is kept so it can be restored
/// on every exit path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Port name/path (e.g., "/dev/ttyACM0", "COM3").
    pub port_name: String,
    /// Baud rate.
    pub baud_rate: u32,
    /// Bounded read/write timeout.
    pub timeout: Duration,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port_name: String::new(),
            baud_rate: 9600,
            timeout: Duration::from_secs(1),
        }
    }
}

impl SerialConfig {
    /// Create a new configuration with port name and baud rate.
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Self {
        Self {
            port_name: port_name.into(),
            baud_rate,
            ..Default::default()
        }
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Serial port information.
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Port name/path.
    pub name: String,
    /// USB vendor ID (if available).
    pub vid: Option<u16>,
    /// USB product ID (if available).
    pub pid: Option<u16>,
    /// Manufacturer string (if available).
    pub manufacturer: Option<String>,
    /// Product string (if available).
    pub product: Option<String>,
    /// Serial number (if available).
    pub serial_number: Option<String>,
}

/// Capability trait for the byte transport the protocol engine drives.
///
/// Reads return whatever bytes are available within the configured timeout,
/// which may be fewer than requested, including zero. The session treats
/// short reads and writes as unrecoverable for the current operation.
pub trait Port: Read + Write + Send {
    /// Get the port name/path.
    fn name(&self) -> &str;

    /// Get the configuration currently in effect.
    fn config(&self) -> SerialConfig;

    /// Apply a configuration to the open port.
    fn apply_config(&mut self, config: &SerialConfig) -> Result<()>;

    /// Close the port and release the device.
    ///
    /// Closing an already-closed port is a no-op.
    fn close(&mut self) -> Result<()>;

    /// Reopen the port at the same address after a close.
    ///
    /// The device re-enumerates after a mode switch; reopening attaches to
    /// whatever is at the address now.
    fn reopen(&mut self) -> Result<()>;

    /// Whether the port currently holds an open device handle.
    fn is_open(&self) -> bool;
}

/// Trait for listing available serial ports.
///
/// Separated from `Port` because enumeration is a static operation that
/// doesn't require an open port instance.
pub trait PortEnumerator {
    /// List all available serial ports.
    fn list_ports() -> Result<Vec<PortInfo>>;
}

pub use native::{NativePort, NativePortEnumerator};
