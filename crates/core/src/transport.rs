//! USB control-transfer abstraction for frame delivery.
//!
//! Real USB handles and mock devices share the same trait so that feature
//! controllers never touch the bus directly.

use crate::error::{Error, Result};
use crate::frame::{CommandFrame, FRAME_LEN};
use tracing::{debug, error, trace};

/// bmRequestType: host-to-device, class request, interface recipient.
pub const REQUEST_TYPE: u8 = 0x21;
/// bRequest: the SET_CONFIGURATION code (0x09), which the device expects here.
pub const REQUEST_SET_CONFIGURATION: u8 = 0x09;
/// wValue for every command frame.
pub const REQUEST_VALUE: u16 = 0x0300;
/// wIndex for every command frame.
pub const REQUEST_INDEX: u16 = 0;

/// Abstraction over an outgoing USB control transfer.
///
/// Implementations block until the transfer completes or their timeout
/// expires, and return the number of bytes the device accepted.
pub trait ControlTransport: Send + Sync {
    fn write_control(
        &self,
        request_type: u8,
        request: u8,
        value: u16,
        index: u16,
        data: &[u8],
    ) -> Result<usize>;
}

/// Encode a command frame and send it over the control endpoint.
///
/// The transfer only counts as delivered when the device took the whole frame.
pub fn send_frame(transport: &dyn ControlTransport, frame: &CommandFrame) -> Result<()> {
    let encoded = frame.encode();
    trace!(
        opcode = ?frame.opcode(),
        frame_hex = format_args!("{:02X?}", encoded),
        "Control TX"
    );

    let sent = transport.write_control(
        REQUEST_TYPE,
        REQUEST_SET_CONFIGURATION,
        REQUEST_VALUE,
        REQUEST_INDEX,
        &encoded,
    )?;

    if sent != FRAME_LEN {
        error!(sent, expected = FRAME_LEN, "Sending control frame");
        return Err(Error::ShortTransfer {
            expected: FRAME_LEN,
            actual: sent,
        });
    }

    debug!(opcode = ?frame.opcode(), checksum = frame.checksum, "Control frame delivered");
    Ok(())
}
