//! Indicator LED controller.
//!
//! Each controller owns one LED and remembers its own position in the
//! device's indicator table, so a brightness request needs no lookup.
//! The device has no read command: brightness is write-only.

use crate::error::{Error, Result};
use crate::frame::CommandFrame;
use crate::host::IndicatorInfo;
use crate::transport::{send_frame, ControlTransport};
use tracing::{debug, error};

/// LEDs are plain on/off.
pub const MAX_BRIGHTNESS: u8 = 1;

/// Longest LED name the host accepts, including the prefix.
pub const MAX_NAME_LEN: usize = 64;

/// Name suffix per indicator position.
pub const INDICATOR_SUFFIXES: [&str; 2] = ["::wheel", "::logo"];

/// Controller for a single indicator LED.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorController {
    index: usize,
    name: String,
}

impl IndicatorController {
    /// Build the controller for the LED at `index`, named `<prefix><suffix>`.
    pub fn new(prefix: &str, index: usize) -> Result<Self> {
        let suffix = INDICATOR_SUFFIXES
            .get(index)
            .ok_or(Error::UnknownIndicator(index))?;
        let name = format!("{prefix}{suffix}");
        if prefix.is_empty() || name.contains('/') || name.len() > MAX_NAME_LEN {
            return Err(Error::Allocation(format!("LED name {name:?}")));
        }
        Ok(Self { index, name })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// What the host should expose for this LED.
    pub fn info(&self) -> IndicatorInfo {
        IndicatorInfo {
            name: self.name.clone(),
            brightness: MAX_BRIGHTNESS,
            max_brightness: MAX_BRIGHTNESS,
        }
    }

    /// Current brightness. Always 0: the device cannot report it.
    pub fn brightness(&self) -> u8 {
        debug!(name = %self.name, "LED read-back not supported");
        0
    }

    /// Switch the LED, reporting failures to the caller.
    pub fn apply(&self, transport: &dyn ControlTransport, value: u8) -> Result<()> {
        let frame = CommandFrame::set_indicator(self.index, value)?;
        send_frame(transport, &frame)?;
        debug!(name = %self.name, value, "LED set");
        Ok(())
    }

    /// Switch the LED. Failures are logged and dropped; the LED interface
    /// has no error channel.
    pub fn set(&self, transport: &dyn ControlTransport, value: u8) {
        if let Err(e) = self.apply(transport, value) {
            error!(name = %self.name, index = self.index, value, error = %e, "Setting LED failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;

    #[test]
    fn names_follow_prefix() {
        assert_eq!(IndicatorController::new("led", 0).unwrap().name(), "led::wheel");
        assert_eq!(IndicatorController::new("led", 1).unwrap().name(), "led::logo");
        assert_eq!(
            IndicatorController::new("da2013", 1).unwrap().name(),
            "da2013::logo"
        );
    }

    #[test]
    fn info_is_binary() {
        let info = IndicatorController::new("led", 0).unwrap().info();
        assert_eq!(info.brightness, 1);
        assert_eq!(info.max_brightness, 1);
    }

    #[test]
    fn bad_names_cannot_be_built() {
        assert!(matches!(
            IndicatorController::new("", 0),
            Err(Error::Allocation(_))
        ));
        assert!(matches!(
            IndicatorController::new("a/b", 0),
            Err(Error::Allocation(_))
        ));
        let long = "x".repeat(MAX_NAME_LEN);
        assert!(matches!(
            IndicatorController::new(&long, 1),
            Err(Error::Allocation(_))
        ));
    }

    #[test]
    fn only_two_positions_exist() {
        assert!(matches!(
            IndicatorController::new("led", 2),
            Err(Error::UnknownIndicator(2))
        ));
    }

    #[test]
    fn apply_sends_one_frame() {
        let mock = MockTransport::new();
        let wheel = IndicatorController::new("led", 0).unwrap();
        wheel.apply(&mock, 1).unwrap();
        assert_eq!(
            mock.frames(),
            vec![CommandFrame::set_indicator(0, 1).unwrap()]
        );
    }

    #[test]
    fn set_swallows_transport_failure() {
        let mock = MockTransport::new();
        mock.short_write(0);
        let logo = IndicatorController::new("led", 1).unwrap();
        logo.set(&mock, 0);
        // The frame went out; the short count was only logged.
        assert_eq!(mock.sent().len(), 1);
        assert!(logo.apply(&mock, 0).is_err());
    }

    #[test]
    fn brightness_reads_zero() {
        let mock = MockTransport::new();
        let wheel = IndicatorController::new("led", 0).unwrap();
        wheel.set(&mock, 1);
        assert_eq!(wheel.brightness(), 0);
    }
}
