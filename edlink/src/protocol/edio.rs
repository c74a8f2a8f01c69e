//! EDIO command protocol for EverDrive flash cartridges.
//!
//! Every command starts with the same fixed 4-byte header, optionally
//! followed by a command-specific payload:
//!
//! ```text
//! +----------+-----------+--------+---------+-----------------+
//! | Sentinel | ~Sentinel | Opcode | ~Opcode |     Payload     |
//! +----------+-----------+--------+---------+-----------------+
//! |  1 byte  |  1 byte   | 1 byte | 1 byte  |    variable     |
//! +----------+-----------+--------+---------+-----------------+
//! |   '+'    |  '+'^0xFF |   op   |  ~op    | strings/binary  |
//! +----------+-----------+--------+---------+-----------------+
//! ```
//!
//! String payloads are prefixed with a little-endian `u16` length and are
//! not null-terminated. The device answers most commands with a 2-byte
//! status pair `[code, tag]` where the tag must be [`EXPECTED_STATUS`].

use byteorder::{LittleEndian, WriteBytesExt};

/// Frame sentinel byte. Its complement forms the second header byte.
pub const FRAME_SENTINEL: u8 = b'+';

/// Tag byte every status response must carry.
pub const EXPECTED_STATUS: u8 = 0xA5;

/// Mode byte reported while the device runs its service (bootloader) firmware.
pub const MODE_SERVICE: u8 = 0xA1;

/// Mode byte reported while the device runs its application firmware.
pub const MODE_APP: u8 = 0xA2;

/// Status code for success.
pub const STATUS_OK: u8 = 0x00;

/// Status code the device reports for an already-existing directory.
pub const STATUS_DIR_EXISTS: u8 = 0x08;

/// File-open flag: open for writing.
pub const FAT_WRITE: u8 = 0x02;

/// File-open flag: create the file, truncating any existing one.
pub const FAT_CREATE_ALWAYS: u8 = 0x08;

/// Maximum payload bytes per acked write chunk. Protocol constant, not
/// negotiated with the device.
pub const WRITE_BLOCK_SIZE: usize = 1024;

/// EDIO command opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Query the status of the most recent command (0x10).
    CheckStatus = 0x10,
    /// Query the current firmware mode (0x11).
    GetMode = 0x11,
    /// Switch from service mode to application mode (0xF1). The device
    /// re-enumerates instead of answering.
    RunApp = 0xF1,
    /// Initialize/mount the device filesystem (0xC0).
    DiskInit = 0xC0,
    /// Create a directory (0xD2).
    DirMake = 0xD2,
    /// Open a remote file handle (0xC9).
    FileOpen = 0xC9,
    /// Stream data into the open file handle (0xCC).
    FileWrite = 0xCC,
    /// Close the open file handle (0xCE).
    FileClose = 0xCE,
}

impl Opcode {
    /// Get the complement header byte (~op).
    pub fn complement(self) -> u8 {
        !(self as u8)
    }
}

/// Firmware mode reported by [`Opcode::GetMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceMode {
    /// Service (bootloader-like) firmware.
    Service,
    /// Application (operational) firmware.
    App,
    /// Anything else the device reported; carried as raw data so callers
    /// can decide whether it is fatal.
    Other(u8),
}

impl DeviceMode {
    /// Map a raw mode byte to a mode.
    pub fn from_raw(raw: u8) -> Self {
        match raw {
            MODE_SERVICE => Self::Service,
            MODE_APP => Self::App,
            other => Self::Other(other),
        }
    }

    /// The raw mode byte.
    pub fn raw(self) -> u8 {
        match self {
            Self::Service => MODE_SERVICE,
            Self::App => MODE_APP,
            Self::Other(raw) => raw,
        }
    }
}

/// EDIO command frame builder.
///
/// Builds the 4-byte header plus any command-specific payload. Frames are
/// constructed fresh per command and never reused.
#[derive(Debug)]
pub struct CommandFrame {
    opcode: Opcode,
    data: Vec<u8>,
}

impl CommandFrame {
    /// Create an empty frame with the given opcode.
    pub fn new(opcode: Opcode) -> Self {
        Self {
            opcode,
            data: Vec::new(),
        }
    }

    /// Build a status-check frame.
    pub fn check_status() -> Self {
        Self::new(Opcode::CheckStatus)
    }

    /// Build a mode-query frame.
    pub fn get_mode() -> Self {
        Self::new(Opcode::GetMode)
    }

    /// Build a switch-to-application-mode frame.
    pub fn run_app() -> Self {
        Self::new(Opcode::RunApp)
    }

    /// Build a disk-init frame.
    pub fn disk_init() -> Self {
        Self::new(Opcode::DiskInit)
    }

    /// Build a directory-create frame.
    ///
    /// Payload: u16-LE path length + raw path bytes.
    pub fn dir_make(path: &str) -> Self {
        let mut frame = Self::new(Opcode::DirMake);
        frame.push_path(path);
        frame
    }

    /// Build a file-open frame with write + create-always semantics.
    ///
    /// Payload: 1-byte mode flags + u16-LE path length + raw path bytes.
    pub fn file_open(path: &str) -> Self {
        let mut frame = Self::new(Opcode::FileOpen);
        frame.data.push(FAT_WRITE | FAT_CREATE_ALWAYS);
        frame.push_path(path);
        frame
    }

    /// Build a file-write frame announcing the total transfer length.
    ///
    /// Payload: u32-LE total length. The data itself follows in acked
    /// chunks outside the frame.
    #[allow(clippy::unwrap_used)] // Writing to Vec<u8> cannot fail
    pub fn file_write(total_len: u32) -> Self {
        let mut frame = Self::new(Opcode::FileWrite);
        frame
            .data
            .write_u32::<LittleEndian>(total_len)
            .unwrap();
        frame
    }

    /// Build a file-close frame.
    pub fn file_close() -> Self {
        Self::new(Opcode::FileClose)
    }

    /// Append a u16-LE length-prefixed path to the payload.
    #[allow(clippy::cast_possible_truncation)] // FAT paths are far below 64K
    #[allow(clippy::unwrap_used)] // Writing to Vec<u8> cannot fail
    fn push_path(&mut self, path: &str) {
        self.data
            .write_u16::<LittleEndian>(path.len() as u16)
            .unwrap();
        self.data
            .extend_from_slice(path.as_bytes());
    }

    /// Build the complete frame bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(4 + self.data.len());
        buf.push(FRAME_SENTINEL);
        buf.push(!FRAME_SENTINEL);
        buf.push(self.opcode as u8);
        buf.push(self.opcode.complement());
        buf.extend_from_slice(&self.data);
        buf
    }

    /// Get the frame's opcode.
    pub fn opcode(&self) -> Opcode {
        self.opcode
    }
}
