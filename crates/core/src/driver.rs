//! Attach / detach entry points.
//!
//! Attaching reports two things separately: whether the device is usable at
//! all (the `Result`), and whether its special functions came up (the
//! `FeatureStatus`). A special-function failure never fails the attach; the
//! mouse keeps working as a plain pointer.

use crate::config::DriverConfig;
use crate::da2013::Da2013Functions;
use crate::device::{InterfaceProtocol, MouseModel};
use crate::error::{Error, Result};
use crate::host::FeatureHost;
use crate::session::DeviceSession;
use crate::transport::ControlTransport;
use std::sync::Arc;
use tracing::{error, info, warn};

/// One attached HID interface, as handed over by the host input stack.
///
/// `parse`, `start` and `stop` are the host's generic input handling; this
/// crate only sequences them around its own setup.
pub trait HidDevice {
    fn product_id(&self) -> u16;
    fn interface_protocol(&self) -> InterfaceProtocol;
    /// Control endpoint of the USB device this interface belongs to.
    fn transport(&self) -> Arc<dyn ControlTransport>;
    fn parse(&mut self) -> Result<()>;
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self);
}

/// Outcome of special-function setup.
#[derive(Debug)]
pub enum FeatureStatus {
    /// LEDs and resolution are available.
    Active,
    /// Nothing to set up for this product or interface.
    Unsupported,
    /// Setup failed and was rolled back.
    Failed(Error),
}

/// A successfully attached interface.
pub struct Attachment {
    pub session: Option<DeviceSession>,
    pub features: FeatureStatus,
}

impl Attachment {
    pub fn session(&self) -> Option<&DeviceSession> {
        self.session.as_ref()
    }
}

/// Attach to an interface.
///
/// Fails only if the generic parse or start fails.
pub fn probe(
    device: &mut dyn HidDevice,
    host: &dyn FeatureHost,
    config: &DriverConfig,
) -> Result<Attachment> {
    if let Err(e) = device.parse() {
        error!(error = %e, "Cannot parse device");
        return Err(e);
    }
    if let Err(e) = device.start() {
        error!(error = %e, "Cannot start device");
        return Err(e);
    }

    let model = MouseModel::from_pid(device.product_id());
    let session = DeviceSession::new(model, device.transport());

    let Some(model) = model else {
        warn!(
            pid = format_args!("0x{:04X}", device.product_id()),
            "No special function support implemented for this device"
        );
        return Ok(Attachment {
            session: Some(session),
            features: FeatureStatus::Unsupported,
        });
    };

    let setup = match model {
        MouseModel::DeathAdder2013 => {
            Da2013Functions::init(device.interface_protocol(), host, config)
        }
    };

    match setup {
        Ok(Some(functions)) => {
            info!(model = model.name(), "Special functions attached");
            Ok(Attachment {
                session: Some(session.with_special(Box::new(functions))),
                features: FeatureStatus::Active,
            })
        }
        Ok(None) => Ok(Attachment {
            session: Some(session),
            features: FeatureStatus::Unsupported,
        }),
        Err(e) => {
            error!(model = model.name(), error = %e, "Error initializing special function support");
            Ok(Attachment {
                session: None,
                features: FeatureStatus::Failed(e),
            })
        }
    }
}

/// Detach from an interface: release special functions, then stop the device.
pub fn remove(device: &mut dyn HidDevice, attachment: Attachment, host: &dyn FeatureHost) {
    if let Some(mut session) = attachment.session {
        session.close(host);
    }
    device.stop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LocalRegistry;
    use crate::pids;
    use crate::transport::mock::MockTransport;

    struct FakeDevice {
        pid: u16,
        protocol: InterfaceProtocol,
        transport: MockTransport,
        parse_fails: bool,
        running: bool,
    }

    impl FakeDevice {
        fn new(pid: u16, protocol: InterfaceProtocol) -> Self {
            Self {
                pid,
                protocol,
                transport: MockTransport::new(),
                parse_fails: false,
                running: false,
            }
        }
    }

    impl HidDevice for FakeDevice {
        fn product_id(&self) -> u16 {
            self.pid
        }
        fn interface_protocol(&self) -> InterfaceProtocol {
            self.protocol
        }
        fn transport(&self) -> Arc<dyn ControlTransport> {
            Arc::new(self.transport.clone())
        }
        fn parse(&mut self) -> Result<()> {
            if self.parse_fails {
                return Err(Error::Usb("bad report descriptor".into()));
            }
            Ok(())
        }
        fn start(&mut self) -> Result<()> {
            self.running = true;
            Ok(())
        }
        fn stop(&mut self) {
            self.running = false;
        }
    }

    #[test]
    fn parse_failure_fails_attach() {
        let host = LocalRegistry::new();
        let mut device = FakeDevice::new(pids::DEATHADDER_2013, InterfaceProtocol::Mouse);
        device.parse_fails = true;
        assert!(probe(&mut device, &host, &DriverConfig::default()).is_err());
        assert!(!device.running);
    }

    #[test]
    fn mouse_interface_is_active() {
        let host = LocalRegistry::new();
        let mut device = FakeDevice::new(pids::DEATHADDER_2013, InterfaceProtocol::Mouse);
        let attachment = probe(&mut device, &host, &DriverConfig::default()).unwrap();
        assert!(matches!(attachment.features, FeatureStatus::Active));
        assert!(attachment.session().unwrap().has_special_functions());
        assert!(device.running);

        remove(&mut device, attachment, &host);
        assert!(host.exposed().is_empty());
        assert!(!device.running);
    }

    #[test]
    fn keyboard_interface_is_plain() {
        let host = LocalRegistry::new();
        let mut device = FakeDevice::new(pids::DEATHADDER_2013, InterfaceProtocol::Keyboard);
        let attachment = probe(&mut device, &host, &DriverConfig::default()).unwrap();
        assert!(matches!(attachment.features, FeatureStatus::Unsupported));
        assert!(!attachment.session().unwrap().has_special_functions());
        assert!(host.history().is_empty());

        remove(&mut device, attachment, &host);
        assert!(host.history().is_empty());
    }

    #[test]
    fn unknown_product_is_plain() {
        let host = LocalRegistry::new();
        let mut device = FakeDevice::new(0x0016, InterfaceProtocol::Mouse);
        let attachment = probe(&mut device, &host, &DriverConfig::default()).unwrap();
        assert!(matches!(attachment.features, FeatureStatus::Unsupported));
        assert_eq!(attachment.session().unwrap().model(), None);
        assert!(host.history().is_empty());
    }

    #[test]
    fn setup_failure_keeps_device_usable() {
        let host = LocalRegistry::new();
        let mut device = FakeDevice::new(pids::DEATHADDER_2013, InterfaceProtocol::Mouse);
        let config = DriverConfig {
            led_prefix: "x".repeat(80),
            ..DriverConfig::default()
        };
        let attachment = probe(&mut device, &host, &config).unwrap();
        assert!(matches!(
            attachment.features,
            FeatureStatus::Failed(Error::Allocation(_))
        ));
        assert!(attachment.session.is_none());
        assert!(device.running);

        remove(&mut device, attachment, &host);
        assert!(!device.running);
    }
}
