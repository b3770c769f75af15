//! Frame delivery back ends and the attached-interface wrapper.

use razer_hid_core::device::{usb_error, InterfaceProtocol};
use razer_hid_core::driver::HidDevice;
use razer_hid_core::error::{Error, Result};
use razer_hid_core::transport::{ControlTransport, REQUEST_SET_CONFIGURATION, REQUEST_TYPE};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, warn};

/// Sends frames as HID feature reports through hidraw.
///
/// A class SET request with wValue `0x03nn` is exactly a SET_REPORT for
/// feature report `nn`, so the kernel emits the same control transfer
/// without the mouse driver being detached.
pub struct HidrawTransport {
    device: Mutex<hidapi::HidDevice>,
}

impl HidrawTransport {
    pub fn open(vid: u16, pid: u16, interface: u8) -> Result<Self> {
        let api = hidapi::HidApi::new().map_err(|e| Error::Usb(format!("hidapi init: {e}")))?;
        let info = api
            .device_list()
            .find(|d| {
                d.vendor_id() == vid
                    && d.product_id() == pid
                    && d.interface_number() == i32::from(interface)
            })
            .ok_or_else(|| {
                Error::DeviceNotFound(format!(
                    "no hidraw node for VID=0x{vid:04X} PID=0x{pid:04X} interface {interface}"
                ))
            })?;
        let device = api.open_path(info.path()).map_err(|e| {
            Error::PermissionDenied(format!("open {}: {e}", info.path().to_string_lossy()))
        })?;
        debug!(path = %info.path().to_string_lossy(), "hidraw node opened");
        Ok(Self {
            device: Mutex::new(device),
        })
    }
}

impl ControlTransport for HidrawTransport {
    /// hidapi does not report how many bytes the device accepted, so a
    /// successful report is counted as the whole frame. Short transfers are
    /// only detected on the `usb` back end.
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        _index: u16,
        data: &[u8],
    ) -> Result<usize> {
        if request_type != REQUEST_TYPE || request != REQUEST_SET_CONFIGURATION || value >> 8 != 0x03
        {
            return Err(Error::Usb(format!(
                "hidraw cannot issue request type 0x{request_type:02X} request 0x{request:02X} value 0x{value:04X}"
            )));
        }

        let mut report = Vec::with_capacity(data.len() + 1);
        report.push((value & 0xFF) as u8);
        report.extend_from_slice(data);

        let device = self
            .device
            .lock()
            .map_err(|_| Error::Usb("hidraw handle lock poisoned".into()))?;
        device
            .send_feature_report(&report)
            .map_err(|e| Error::Usb(format!("send_feature_report: {e}")))?;
        Ok(data.len())
    }
}

/// Sends frames as raw control transfers through libusb.
pub struct UsbTransport {
    handle: Mutex<rusb::DeviceHandle<rusb::GlobalContext>>,
    timeout: Duration,
}

impl UsbTransport {
    pub fn open(vid: u16, pid: u16, timeout: Duration) -> Result<Self> {
        let handle = rusb::open_device_with_vid_pid(vid, pid).ok_or_else(|| {
            Error::DeviceNotFound(format!("cannot open VID=0x{vid:04X} PID=0x{pid:04X}"))
        })?;
        Ok(Self {
            handle: Mutex::new(handle),
            timeout,
        })
    }
}

impl ControlTransport for UsbTransport {
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize> {
        let interface = u8::try_from(index)
            .map_err(|_| Error::Usb(format!("interface index {index} out of range")))?;
        let mut handle = self
            .handle
            .lock()
            .map_err(|_| Error::Usb("USB handle lock poisoned".into()))?;

        // The kernel mouse driver owns the interface; libusb re-attaches it on release.
        if let Err(e) = handle.set_auto_detach_kernel_driver(true) {
            debug!(error = %e, "Kernel driver auto-detach unavailable");
        }
        handle.claim_interface(interface).map_err(usb_error)?;

        let result = handle
            .write_control(request_type, request, value, index, data, self.timeout)
            .map_err(usb_error);

        if let Err(e) = handle.release_interface(interface) {
            warn!(interface, error = %e, "Cannot release interface");
        }
        result
    }
}

/// Prints frames instead of sending them.
pub struct DryRunTransport;

impl ControlTransport for DryRunTransport {
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize> {
        let hex: Vec<String> = data.iter().map(|b| format!("{b:02x}")).collect();
        println!(
            "control type=0x{request_type:02X} request=0x{request:02X} value=0x{value:04X} index={index} len={}",
            data.len()
        );
        println!("  {}", hex.join(" "));
        Ok(data.len())
    }
}

/// One interface of a discovered device, attached from user space.
///
/// The kernel keeps handling input reports, so parse and start have
/// nothing to do here.
pub struct UserspaceInterface {
    pub number: u8,
    pid: u16,
    protocol: InterfaceProtocol,
    transport: Arc<dyn ControlTransport>,
}

impl UserspaceInterface {
    pub fn new(
        number: u8,
        pid: u16,
        protocol: InterfaceProtocol,
        transport: Arc<dyn ControlTransport>,
    ) -> Self {
        Self {
            number,
            pid,
            protocol,
            transport,
        }
    }
}

impl HidDevice for UserspaceInterface {
    fn product_id(&self) -> u16 {
        self.pid
    }

    fn interface_protocol(&self) -> InterfaceProtocol {
        self.protocol
    }

    fn transport(&self) -> Arc<dyn ControlTransport> {
        Arc::clone(&self.transport)
    }

    fn parse(&mut self) -> Result<()> {
        Ok(())
    }

    fn start(&mut self) -> Result<()> {
        debug!(interface = self.number, protocol = %self.protocol, "Interface attached");
        Ok(())
    }

    fn stop(&mut self) {
        debug!(interface = self.number, "Interface detached");
    }
}
