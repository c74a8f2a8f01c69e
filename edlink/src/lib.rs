//! # edlink
//!
//! A library for uploading ROM images to EverDrive flash cartridges over a
//! serial connection.
//!
//! This crate implements the cartridge's EDIO command/response protocol:
//!
//! - Fixed 4-byte command framing with opcode complements
//! - Status and firmware-mode probing
//! - A bounded reconnect state machine that survives the device rebooting
//!   from service mode into application mode mid-session
//! - Directory-hierarchy provisioning on the cartridge filesystem
//! - Chunked, ack-gated file transfer
//!
//! The protocol engine is written against the [`port::Port`] capability
//! trait, so it can run over a real serial port or a scripted in-memory
//! transport in tests.
//!
//! ## Example
//!
//! ```rust,no_run
//! use edlink::{NativePort, SerialConfig, Session};
//! use std::path::Path;
//!
//! fn main() -> edlink::Result<()> {
//!     let config = SerialConfig::new("/dev/ttyACM0", 9600);
//!     let port = NativePort::open(&config)?;
//!     let mut session = Session::new(port, config)?;
//!     session.upload(Path::new("rom.nes"), "games/rom.nes")?;
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod host;
pub mod port;
pub mod protocol;
pub mod session;
pub mod transfer;

// Re-exports for convenience
pub use {
    error::{Error, Result},
    host::{BridgeKind, DetectedPort, auto_detect_port, discover_ports},
    port::{NativePort, NativePortEnumerator, Port, PortEnumerator, PortInfo, SerialConfig},
    protocol::edio::{CommandFrame, DeviceMode, Opcode, WRITE_BLOCK_SIZE},
    session::{RECONNECT_ATTEMPTS, RECONNECT_SETTLE, Session},
    transfer::TransferState,
};
