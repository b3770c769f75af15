//! Device model: supported mice, interface roles, and USB discovery.

use crate::error::{Error, Result};
use crate::{pids, RAZER_VID};
use serde::Serialize;
use tracing::{debug, info, warn};

/// Supported Razer mouse models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MouseModel {
    DeathAdder2013,
}

impl MouseModel {
    /// Look up model from USB product ID.
    pub fn from_pid(pid: u16) -> Option<Self> {
        match pid {
            pids::DEATHADDER_2013 => Some(Self::DeathAdder2013),
            _ => None,
        }
    }

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::DeathAdder2013 => "Razer DeathAdder 2013",
        }
    }

    /// USB Product ID.
    pub fn pid(&self) -> u16 {
        match self {
            Self::DeathAdder2013 => pids::DEATHADDER_2013,
        }
    }
}

/// Role of a HID interface, from its `bInterfaceProtocol`.
///
/// The DeathAdder enumerates one mouse interface and two keyboard
/// interfaces; only the mouse carries the special functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InterfaceProtocol {
    None,
    Keyboard,
    Mouse,
    Other(u8),
}

impl InterfaceProtocol {
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => Self::None,
            1 => Self::Keyboard,
            2 => Self::Mouse,
            other => Self::Other(other),
        }
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::None => 0,
            Self::Keyboard => 1,
            Self::Mouse => 2,
            Self::Other(code) => *code,
        }
    }
}

impl std::fmt::Display for InterfaceProtocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Keyboard => write!(f, "keyboard"),
            Self::Mouse => write!(f, "mouse"),
            Self::Other(code) => write!(f, "protocol {code}"),
        }
    }
}

/// One interface of a discovered device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InterfaceInfo {
    pub number: u8,
    pub protocol: InterfaceProtocol,
}

/// Information about a discovered Razer device.
#[derive(Debug, Clone, Serialize)]
pub struct DeviceInfo {
    pub model: MouseModel,
    pub vid: u16,
    pub pid: u16,
    pub bus: u8,
    pub address: u8,
    pub interfaces: Vec<InterfaceInfo>,
}

/// Map a libusb error onto the crate error, keeping the cases callers act on.
pub fn usb_error(e: rusb::Error) -> Error {
    match e {
        rusb::Error::NoDevice | rusb::Error::NotFound => Error::DeviceNotFound(e.to_string()),
        rusb::Error::Access => Error::PermissionDenied(e.to_string()),
        rusb::Error::Timeout => Error::Timeout(e.to_string()),
        other => Error::Usb(other.to_string()),
    }
}

/// Discover all connected supported Razer mice.
///
/// Enumerates the USB bus and returns info for any recognized models,
/// including the role of every interface in the active configuration.
pub fn discover_devices() -> Result<Vec<DeviceInfo>> {
    debug!("Starting USB device enumeration");
    let devices = rusb::devices().map_err(usb_error)?;

    let mut found = Vec::new();
    for device in devices.iter() {
        let Ok(desc) = device.device_descriptor() else {
            continue;
        };
        if desc.vendor_id() != RAZER_VID {
            continue;
        }
        let Some(model) = MouseModel::from_pid(desc.product_id()) else {
            debug!(
                pid = format_args!("0x{:04X}", desc.product_id()),
                "Razer device without special function support"
            );
            continue;
        };

        let interfaces = match device.active_config_descriptor() {
            Ok(config) => config
                .interfaces()
                .filter_map(|iface| {
                    iface.descriptors().next().map(|alt| InterfaceInfo {
                        number: alt.interface_number(),
                        protocol: InterfaceProtocol::from_code(alt.protocol_code()),
                    })
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "Cannot read active configuration");
                Vec::new()
            }
        };

        info!(
            model = model.name(),
            bus = device.bus_number(),
            address = device.address(),
            interfaces = interfaces.len(),
            "Found Razer device"
        );
        found.push(DeviceInfo {
            model,
            vid: desc.vendor_id(),
            pid: desc.product_id(),
            bus: device.bus_number(),
            address: device.address(),
            interfaces,
        });
    }

    debug!(count = found.len(), "Device enumeration complete");
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_model_from_known_pid() {
        assert_eq!(MouseModel::from_pid(0x0037), Some(MouseModel::DeathAdder2013));
        assert_eq!(MouseModel::DeathAdder2013.pid(), 0x0037);
    }

    #[test]
    fn mouse_model_from_unknown_pid() {
        assert_eq!(MouseModel::from_pid(0x0016), None);
    }

    #[test]
    fn interface_protocol_codes() {
        assert_eq!(InterfaceProtocol::from_code(2), InterfaceProtocol::Mouse);
        assert_eq!(InterfaceProtocol::from_code(1), InterfaceProtocol::Keyboard);
        assert_eq!(InterfaceProtocol::from_code(7), InterfaceProtocol::Other(7));
        for code in 0..=3u8 {
            assert_eq!(InterfaceProtocol::from_code(code).code(), code);
        }
    }

    #[test]
    fn usb_errors_keep_meaning() {
        assert!(matches!(usb_error(rusb::Error::NoDevice), Error::DeviceNotFound(_)));
        assert!(matches!(usb_error(rusb::Error::Access), Error::PermissionDenied(_)));
        assert!(matches!(usb_error(rusb::Error::Timeout), Error::Timeout(_)));
        assert!(matches!(usb_error(rusb::Error::Pipe), Error::Usb(_)));
    }
}
