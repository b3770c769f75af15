//! Sensor resolution ("DPI") controller, exposed as the `resolution` attribute.
//!
//! The attribute is text: writes parse a decimal byte, reads return a fixed
//! placeholder because the device has no read command.

use crate::error::{Error, Result};
use crate::frame::CommandFrame;
use crate::host::AttributeInfo;
use crate::transport::{send_frame, ControlTransport};
use tracing::{debug, error, warn};

/// Attribute name.
pub const ATTRIBUTE_NAME: &str = "resolution";
/// Readable by all, writable by owner and group.
pub const ATTRIBUTE_MODE: u32 = 0o664;
/// What a read returns.
pub const READ_PLACEHOLDER: &str = "0\n";

/// Controller for the resolution setting. Holds no state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensitivityController;

impl SensitivityController {
    pub fn attribute(&self) -> AttributeInfo {
        AttributeInfo {
            name: ATTRIBUTE_NAME,
            mode: ATTRIBUTE_MODE,
        }
    }

    /// Attribute read. The current value is unknown.
    pub fn show(&self) -> String {
        warn!("Get-Resolution not implemented");
        READ_PLACEHOLDER.to_string()
    }

    /// Attribute write.
    ///
    /// Returns the number of input bytes consumed (all of them) on success.
    /// Nothing is sent if `text` does not parse.
    pub fn store(&self, transport: &dyn ControlTransport, text: &str) -> Result<usize> {
        let value = parse_resolution(text)?;
        let frame = CommandFrame::set_sensitivity(value);
        if let Err(e) = send_frame(transport, &frame) {
            error!(value, error = %e, "Setting resolution failed");
            return Err(e);
        }
        debug!(value, "Resolution set");
        Ok(text.len())
    }
}

/// Parse attribute text as a resolution byte (0-255).
///
/// Surrounding whitespace, including the trailing newline `echo` adds, is
/// ignored.
pub fn parse_resolution(text: &str) -> Result<u8> {
    let trimmed = text.trim();
    trimmed.parse::<u8>().map_err(|_| {
        error!(input = trimmed, "No parsable value for resolution");
        Error::InvalidInput(format!("resolution {trimmed:?} is not a number in 0..=255"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::SENSITIVITY_CHECKSUM;
    use crate::transport::mock::MockTransport;

    #[test]
    fn parse_accepts_byte_range() {
        assert_eq!(parse_resolution("0").unwrap(), 0);
        assert_eq!(parse_resolution("255").unwrap(), 255);
        assert_eq!(parse_resolution(" 42\n").unwrap(), 42);
    }

    #[test]
    fn parse_rejects_garbage() {
        for input in ["", "abc", "256", "-1", "1.5", "0x10"] {
            assert!(
                matches!(parse_resolution(input), Err(Error::InvalidInput(_))),
                "{input:?} should be rejected"
            );
        }
    }

    #[test]
    fn store_sends_repeated_value() {
        let mock = MockTransport::new();
        let consumed = SensitivityController.store(&mock, "100\n").unwrap();
        assert_eq!(consumed, 4);

        let sent = mock.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].data[8], 100);
        assert_eq!(sent[0].data[9], 100);
        assert_eq!(sent[0].data[88], SENSITIVITY_CHECKSUM);
    }

    #[test]
    fn store_invalid_sends_nothing() {
        let mock = MockTransport::new();
        let result = SensitivityController.store(&mock, "fast");
        assert!(matches!(result, Err(Error::InvalidInput(_))));
        assert!(mock.sent().is_empty());
    }

    #[test]
    fn store_propagates_short_transfer() {
        let mock = MockTransport::new();
        mock.short_write(3);
        let result = SensitivityController.store(&mock, "7");
        assert!(matches!(result, Err(Error::ShortTransfer { actual: 3, .. })));
    }

    #[test]
    fn show_returns_placeholder() {
        assert_eq!(SensitivityController.show(), "0\n");
    }

    #[test]
    fn attribute_permissions() {
        let attr = SensitivityController.attribute();
        assert_eq!(attr.name, "resolution");
        assert_eq!(attr.mode, 0o664);
    }
}
