//! Upload session: probe, reconnect, provision, transfer.
//!
//! A [`Session`] owns exactly one transport handle and drives the whole
//! EDIO command sequence synchronously, run-to-completion. The transport's
//! original serial configuration is restored and the port closed on every
//! exit path, success or failure.

use {
    crate::{
        error::{Error, Result},
        port::{Port, SerialConfig},
        protocol::edio::{
            CommandFrame, DeviceMode, EXPECTED_STATUS, STATUS_DIR_EXISTS, STATUS_OK,
            WRITE_BLOCK_SIZE,
        },
        transfer::TransferState,
    },
    log::{debug, info, trace, warn},
    std::{
        fs,
        io::Read as _,
        path::Path,
        thread,
        time::Duration,
    },
};

/// Number of reopen attempts after a mode switch before giving up.
///
/// The device physically re-enumerates after switching modes; the budget
/// absorbs USB re-enumeration latency without waiting forever.
pub const RECONNECT_ATTEMPTS: usize = 4;

/// Settle interval slept before each reconnect attempt.
pub const RECONNECT_SETTLE: Duration = Duration::from_secs(1);

/// Reconnect state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReconnectState {
    /// Query the current mode; the device may already be where we want it.
    CheckMode,
    /// Mode-switch command sent; tear the transport down.
    SwitchRequested,
    /// Waiting for the device to come back, attempt `n` of the budget.
    Retry(usize),
    /// Device verified in application mode.
    Done,
}

/// An upload session against one cartridge.
///
/// Generic over the port type `P` so the protocol engine can be tested
/// against a scripted in-memory port.
pub struct Session<P: Port> {
    port: P,
    original_config: SerialConfig,
    session_config: SerialConfig,
    reconnect_attempts: usize,
    settle_delay: Duration,
}

impl<P: Port> Session<P> {
    /// Start a session on an open port, applying `config` to it.
    ///
    /// The configuration in effect beforehand is saved and reapplied when
    /// the session ends, so an abnormal exit never leaves the port in raw
    /// mode.
    pub fn new(mut port: P, config: SerialConfig) -> Result<Self> {
        let original_config = port.config();
        port.apply_config(&config)?;
        Ok(Self {
            port,
            original_config,
            session_config: config,
            reconnect_attempts: RECONNECT_ATTEMPTS,
            settle_delay: RECONNECT_SETTLE,
        })
    }

    /// Override the reconnect retry budget.
    #[must_use]
    pub fn with_reconnect_attempts(mut self, attempts: usize) -> Self {
        self.reconnect_attempts = attempts;
        self
    }

    /// Override the settle delay between reconnect attempts.
    #[must_use]
    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// Get a reference to the underlying port.
    pub fn port(&self) -> &P {
        &self.port
    }

    /// Get a mutable reference to the underlying port.
    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }

    /// Consume the session and return the underlying port as-is.
    pub fn into_port(self) -> P {
        self.port
    }

    /// Upload `source` to `destination` on the cartridge.
    ///
    /// Sequences mode probe, reconnect, disk init, directory provisioning
    /// and the file transfer. The first failure aborts the remaining
    /// stages; the port is restored and closed regardless of the outcome.
    pub fn upload(&mut self, source: &Path, destination: &str) -> Result<()> {
        let outcome = self.run_upload(source, destination);
        let cleanup = self.shutdown();
        outcome.and(cleanup)
    }

    fn run_upload(&mut self, source: &Path, destination: &str) -> Result<()> {
        info!("switching to application mode (if necessary)");
        self.ensure_app_mode()?;

        info!("initializing disk");
        self.disk_init()?;

        info!("creating directories (if necessary)");
        self.make_hierarchy(destination)?;

        info!("writing {destination}");
        self.open_remote_file(destination)?;
        self.write_file(source)?;
        self.close_remote_file()?;

        Ok(())
    }

    /// Restore the saved configuration and close the port.
    ///
    /// A port left closed by an exhausted reconnect is left alone.
    fn shutdown(&mut self) -> Result<()> {
        if self.port.is_open() {
            self.port.apply_config(&self.original_config)?;
            self.port.close()?;
        }
        Ok(())
    }

    // --- Status/mode probe ---

    /// Issue a status check, tolerating `acceptable` as a non-error code.
    ///
    /// A nonzero code other than `acceptable` is a device-reported error;
    /// a tag byte other than the expected sentinel is a protocol error.
    pub fn check_status(&mut self, acceptable: u8) -> Result<()> {
        self.send_frame(&CommandFrame::check_status())?;

        let mut response = [0u8; 2];
        self.read_response("status read", &mut response)?;
        let [code, tag] = response;

        if tag != EXPECTED_STATUS {
            return Err(Error::Protocol(format!(
                "unexpected status tag {tag:#04x} (code {code:#04x})"
            )));
        }
        if code != STATUS_OK && code != acceptable {
            return Err(Error::Device { code });
        }
        Ok(())
    }

    /// Query the device's firmware mode.
    ///
    /// An unrecognized mode byte is reported but still returned as raw
    /// data; the reconnect logic treats anything other than the target
    /// mode as "not yet ready".
    pub fn get_mode(&mut self) -> Result<DeviceMode> {
        self.send_frame(&CommandFrame::get_mode())?;

        let mut response = [0u8; 1];
        self.read_response("mode read", &mut response)?;

        let mode = DeviceMode::from_raw(response[0]);
        if let DeviceMode::Other(raw) = mode {
            warn!("unexpected device mode byte {raw:#04x}");
        }
        Ok(mode)
    }

    // --- Reconnect state machine ---

    /// Make sure the device runs its application firmware, switching modes
    /// and riding out the resulting re-enumeration if necessary.
    pub fn ensure_app_mode(&mut self) -> Result<()> {
        let mut state = ReconnectState::CheckMode;
        loop {
            state = match state {
                ReconnectState::CheckMode => {
                    if self.get_mode()? == DeviceMode::App {
                        debug!("device already in application mode");
                        ReconnectState::Done
                    } else {
                        ReconnectState::SwitchRequested
                    }
                },
                ReconnectState::SwitchRequested => {
                    if let Err(e) = self.send_frame(&CommandFrame::run_app()) {
                        // Device state is unknown after a failed switch
                        // write; shut the transport down and fail fatally.
                        let _ = self.port.apply_config(&self.original_config);
                        let _ = self.port.close();
                        return Err(e);
                    }
                    // The device disconnects to reboot into the new mode.
                    self.port.apply_config(&self.original_config)?;
                    self.port.close()?;
                    ReconnectState::Retry(0)
                },
                ReconnectState::Retry(attempt) => {
                    if attempt >= self.reconnect_attempts {
                        return Err(Error::ReconnectExhausted {
                            attempts: self.reconnect_attempts,
                        });
                    }
                    thread::sleep(self.settle_delay);
                    debug!(
                        "reconnect attempt {}/{}",
                        attempt + 1,
                        self.reconnect_attempts
                    );
                    if self.try_reconnect() {
                        ReconnectState::Done
                    } else {
                        ReconnectState::Retry(attempt + 1)
                    }
                },
                ReconnectState::Done => return Ok(()),
            };
        }
    }

    /// One reopen-and-verify attempt. Leaves the port closed on failure.
    fn try_reconnect(&mut self) -> bool {
        if let Err(e) = self.port.reopen() {
            debug!("reopen failed: {e}");
            return false;
        }
        // Whatever configuration the reopened port came up with is the new
        // baseline to restore.
        self.original_config = self.port.config();
        if let Err(e) = self.port.apply_config(&self.session_config) {
            debug!("failed to reapply session config: {e}");
            let _ = self.port.close();
            return false;
        }

        let verified = self.check_status(STATUS_OK).is_ok()
            && matches!(self.get_mode(), Ok(DeviceMode::App));
        if verified {
            info!("device reconnected in application mode");
        } else {
            let _ = self.port.apply_config(&self.original_config);
            let _ = self.port.close();
        }
        verified
    }

    // --- Filesystem provisioner ---

    /// Initialize/mount the cartridge filesystem.
    pub fn disk_init(&mut self) -> Result<()> {
        self.send_frame(&CommandFrame::disk_init())?;
        self.check_status(STATUS_OK)
    }

    /// Create a single directory, tolerating "already exists".
    pub fn make_directory(&mut self, path: &str) -> Result<()> {
        debug!("creating remote directory {path}");
        self.send_frame(&CommandFrame::dir_make(path))?;
        self.check_status(STATUS_DIR_EXISTS)
    }

    /// Create every ancestor directory of `destination`, in order.
    ///
    /// `a/b/c.nes` creates `a` then `a/b`. Stops at the first failure, so
    /// later ancestors are never attempted after an earlier one fails.
    pub fn make_hierarchy(&mut self, destination: &str) -> Result<()> {
        for (idx, _) in destination.match_indices(['/', '\\']) {
            if idx == 0 {
                continue;
            }
            self.make_directory(&destination[..idx])?;
        }
        Ok(())
    }

    // --- File transfer engine ---

    /// Open the remote file handle with truncate-or-create semantics.
    pub fn open_remote_file(&mut self, path: &str) -> Result<()> {
        debug!("opening remote file {path}");
        self.send_frame(&CommandFrame::file_open(path))?;
        self.check_status(STATUS_OK)
    }

    /// Read `source` fully, then stream it into the open remote handle.
    pub fn write_file(&mut self, source: &Path) -> Result<()> {
        let image = read_source(source)?;
        debug!("read {} bytes from {}", image.len(), source.display());
        self.write_image(&image)
    }

    /// Close the remote file handle.
    pub fn close_remote_file(&mut self) -> Result<()> {
        self.send_frame(&CommandFrame::file_close())?;
        self.check_status(STATUS_OK)
    }

    /// Stream `image` in bounded chunks, each gated by a 1-byte device ack.
    ///
    /// The ack lets the device apply backpressure while its write buffer
    /// or flash page drains. Partial transport writes advance the counters
    /// instead of erroring.
    #[allow(clippy::cast_possible_truncation)] // chunk writes never exceed WRITE_BLOCK_SIZE
    fn write_image(&mut self, image: &[u8]) -> Result<()> {
        let total = u32::try_from(image.len())
            .map_err(|_| Error::SourceRead("image exceeds 4 GiB".into()))?;

        self.send_frame(&CommandFrame::file_write(total))?;

        let mut state = TransferState::new(total);
        while !state.is_complete() {
            let mut ack = [0u8; 1];
            self.read_response("write ack read", &mut ack)?;
            if ack[0] != 0 {
                return Err(Error::Protocol(format!(
                    "bad write acknowledgment: {:#04x}",
                    ack[0]
                )));
            }

            let block = state.next_block(WRITE_BLOCK_SIZE as u32) as usize;
            let offset = state.offset() as usize;
            let written = self
                .port
                .write(&image[offset..offset + block])?;
            if written == 0 {
                return Err(Error::Transport {
                    operation: "data write",
                    actual: 0,
                    expected: block,
                });
            }
            state.advance(written as u32);
            trace!("wrote {written} bytes, {} remaining", state.remaining());
        }
        self.port.flush()?;

        self.check_status(STATUS_OK)
    }

    // --- Wire helpers ---

    /// Write one command frame. A short write is surfaced, never retried.
    fn send_frame(&mut self, frame: &CommandFrame) -> Result<()> {
        let data = frame.build();
        trace!("sending {:?} frame, {} bytes", frame.opcode(), data.len());

        let written = self.port.write(&data)?;
        if written != data.len() {
            return Err(Error::Transport {
                operation: "command write",
                actual: written,
                expected: data.len(),
            });
        }
        self.port.flush()?;
        Ok(())
    }

    /// Read exactly `buf.len()` response bytes within the port timeout.
    ///
    /// A single bounded read; fewer bytes than requested (including zero
    /// on timeout) is surfaced as a transport error.
    fn read_response(&mut self, operation: &'static str, buf: &mut [u8]) -> Result<()> {
        let actual = match self.port.read(buf) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => 0,
            Err(e) => return Err(Error::Io(e)),
        };
        if actual != buf.len() {
            return Err(Error::Transport {
                operation,
                actual,
                expected: buf.len(),
            });
        }
        Ok(())
    }
}

/// Read the whole source image up front, verifying the byte count against
/// the file's reported size so a racing truncation is caught before any
/// wire traffic.
fn read_source(path: &Path) -> Result<Vec<u8>> {
    let mut file = fs::File::open(path)
        .map_err(|e| Error::SourceRead(format!("{}: {e}", path.display())))?;
    let expected = file
        .metadata()
        .map_err(|e| Error::SourceRead(format!("{}: {e}", path.display())))?
        .len();

    let mut image = Vec::new();
    file.read_to_end(&mut image)
        .map_err(|e| Error::SourceRead(format!("{}: {e}", path.display())))?;

    if image.len() as u64 != expected {
        return Err(Error::SourceRead(format!(
            "{}: read {} of {} bytes",
            path.display(),
            image.len(),
            expected
        )));
    }
    Ok(image)
}
