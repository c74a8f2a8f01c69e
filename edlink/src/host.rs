//! Host-side serial port discovery.
//!
//! The cartridge enumerates as a USB CDC serial device, so discovery boils
//! down to listing serial ports and classifying the USB bridge behind each
//! one. Auto-detection picks the sole USB candidate when the user did not
//! name a port explicitly.

use {
    crate::{
        error::{Error, Result},
        port::{NativePortEnumerator, PortEnumerator, PortInfo},
    },
    log::debug,
};

/// Known USB serial bridge kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeKind {
    /// CH340/CH341 USB-to-Serial converter.
    Ch340,
    /// Silicon Labs CP210x USB-to-Serial converter.
    Cp210x,
    /// FTDI FT232/FT2232 USB-to-Serial converter.
    Ftdi,
    /// Prolific PL2303 USB-to-Serial converter.
    Prolific,
    /// Some other USB CDC serial device (the cartridge shows up as one).
    UsbCdc,
    /// Not a USB serial device.
    Unknown,
}

/// Known USB VID/PID pairs for common USB-to-UART bridges.
const KNOWN_USB_BRIDGES: &[(u16, &[u16], BridgeKind)] = &[
    (0x1A86, &[0x7523, 0x7522, 0x5523], BridgeKind::Ch340),
    (0x10C4, &[0xEA60, 0xEA70, 0xEA71], BridgeKind::Cp210x),
    (0x0403, &[0x6001, 0x6010, 0x6014, 0x6015], BridgeKind::Ftdi),
    (0x067B, &[0x2303, 0x23A3, 0x23C3], BridgeKind::Prolific),
];

impl BridgeKind {
    /// Classify a port by its USB VID/PID.
    pub fn classify(vid: Option<u16>, pid: Option<u16>) -> Self {
        let (Some(vid), Some(pid)) = (vid, pid) else {
            return Self::Unknown;
        };
        for (known_vid, pids, kind) in KNOWN_USB_BRIDGES {
            if vid == *known_vid && pids.contains(&pid) {
                return *kind;
            }
        }
        Self::UsbCdc
    }
}

/// A discovered serial port with its bridge classification.
#[derive(Debug, Clone)]
pub struct DetectedPort {
    /// Raw port information.
    pub info: PortInfo,
    /// Classified bridge kind.
    pub kind: BridgeKind,
}

/// Discover all available serial ports.
pub fn discover_ports() -> Result<Vec<DetectedPort>> {
    let ports = NativePortEnumerator::list_ports()?;
    Ok(ports
        .into_iter()
        .map(|info| {
            let kind = BridgeKind::classify(info.vid, info.pid);
            DetectedPort { info, kind }
        })
        .collect())
}

/// Auto-detect a single best serial port candidate.
///
/// Succeeds only when exactly one USB serial port is present; anything
/// else needs the user to name a port explicitly.
pub fn auto_detect_port() -> Result<DetectedPort> {
    let candidates: Vec<DetectedPort> = discover_ports()?
        .into_iter()
        .filter(|p| p.kind != BridgeKind::Unknown)
        .collect();

    for candidate in &candidates {
        debug!(
            "candidate port {} ({:?})",
            candidate.info.name, candidate.kind
        );
    }

    if candidates.len() > 1 {
        return Err(Error::DeviceNotFound(format!(
            "{} USB serial ports found ({}); specify one explicitly",
            candidates.len(),
            candidates
                .iter()
                .map(|p| p.info.name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    candidates.into_iter().next().ok_or_else(|| {
        Error::DeviceNotFound("no USB serial ports found; specify a port explicitly".into())
    })
}
