//! DeathAdder 2013 command frame encoding and decoding.
//!
//! Every command is a fixed 90-byte frame:
//!
//! | offset | len | field                                  |
//! |--------|-----|----------------------------------------|
//! | 0      | 6   | header magic `00 78 00 00 00 03`       |
//! | 6      | 2   | opcode                                 |
//! | 8      | 80  | payload (variant-specific, zero-padded) |
//! | 88     | 1   | checksum                               |
//! | 89     | 1   | footer (`00`)                          |
//!
//! The checksum is not computed. It is a per-command constant observed on the
//! wire, so it is kept as a literal lookup table.

use crate::error::{Error, Result};

/// Command family magic at the start of every frame.
pub const HEADER_MAGIC: [u8; 6] = [0x00, 0x78, 0x00, 0x00, 0x00, 0x03];
/// Frame terminator.
pub const FOOTER: u8 = 0x00;

/// Length of the header field.
pub const HEADER_LEN: usize = HEADER_MAGIC.len();
/// Length of the opcode field.
pub const OPCODE_LEN: usize = 2;
/// Payload area; every variant is padded to this size.
pub const PAYLOAD_LEN: usize = 80;
/// Total frame length on the wire.
pub const FRAME_LEN: usize = HEADER_LEN + OPCODE_LEN + PAYLOAD_LEN + 2;

const OPCODE_OFFSET: usize = HEADER_LEN;
const PAYLOAD_OFFSET: usize = OPCODE_OFFSET + OPCODE_LEN;
const CHECKSUM_OFFSET: usize = PAYLOAD_OFFSET + PAYLOAD_LEN;
const FOOTER_OFFSET: usize = CHECKSUM_OFFSET + 1;

/// Marker byte leading every indicator payload.
const INDICATOR_MARKER: u8 = 0x01;

/// Checksum of every set-sensitivity frame.
pub const SENSITIVITY_CHECKSUM: u8 = 0x06;

/// Selector and checksum bytes for one indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndicatorCode {
    pub selector: u8,
    pub checksum_off: u8,
    pub checksum_on: u8,
}

/// Indicator table, indexed by indicator position (0 = wheel, 1 = logo).
pub const INDICATOR_CODES: [IndicatorCode; 2] = [
    IndicatorCode {
        selector: 0x01,
        checksum_off: 0x00,
        checksum_on: 0x01,
    },
    IndicatorCode {
        selector: 0x04,
        checksum_off: 0x05,
        checksum_on: 0x04,
    },
];

/// Command kinds understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Opcode {
    SetIndicator,
    SetSensitivity,
}

impl Opcode {
    /// Wire encoding.
    pub fn bytes(self) -> [u8; OPCODE_LEN] {
        match self {
            Self::SetIndicator => [0x03, 0x00],
            Self::SetSensitivity => [0x04, 0x01],
        }
    }

    /// Look up an opcode from its wire encoding.
    pub fn from_bytes(bytes: [u8; OPCODE_LEN]) -> Option<Self> {
        match bytes {
            [0x03, 0x00] => Some(Self::SetIndicator),
            [0x04, 0x01] => Some(Self::SetSensitivity),
            _ => None,
        }
    }
}

/// Payload variant, keyed by opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Payload {
    /// Switch one indicator. `value` is 0 (off) or 1 (on).
    Indicator { selector: u8, value: u8 },
    /// Set sensor resolution. The device wants the value twice.
    Sensitivity { value: u8 },
}

impl Payload {
    /// Opcode this payload travels under.
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Indicator { .. } => Opcode::SetIndicator,
            Self::Sensitivity { .. } => Opcode::SetSensitivity,
        }
    }
}

/// A fully populated command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame {
    pub payload: Payload,
    pub checksum: u8,
}

impl CommandFrame {
    /// Build a set-indicator frame for the indicator at `index`.
    ///
    /// Any non-zero `value` switches the indicator on.
    pub fn set_indicator(index: usize, value: u8) -> Result<Self> {
        let code = INDICATOR_CODES
            .get(index)
            .ok_or(Error::UnknownIndicator(index))?;
        let on = value != 0;
        Ok(Self {
            payload: Payload::Indicator {
                selector: code.selector,
                value: u8::from(on),
            },
            checksum: if on {
                code.checksum_on
            } else {
                code.checksum_off
            },
        })
    }

    /// Build a set-sensitivity frame.
    pub fn set_sensitivity(value: u8) -> Self {
        Self {
            payload: Payload::Sensitivity { value },
            checksum: SENSITIVITY_CHECKSUM,
        }
    }

    /// Opcode of this frame.
    pub fn opcode(&self) -> Opcode {
        self.payload.opcode()
    }

    /// Encode into the fixed-size wire layout.
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut buf = [0u8; FRAME_LEN];
        buf[..HEADER_LEN].copy_from_slice(&HEADER_MAGIC);
        buf[OPCODE_OFFSET..PAYLOAD_OFFSET].copy_from_slice(&self.opcode().bytes());

        let payload = &mut buf[PAYLOAD_OFFSET..CHECKSUM_OFFSET];
        match self.payload {
            Payload::Indicator { selector, value } => {
                payload[0] = INDICATOR_MARKER;
                payload[1] = selector;
                payload[2] = value;
            }
            Payload::Sensitivity { value } => {
                payload[0] = value;
                payload[1] = value;
            }
        }

        buf[CHECKSUM_OFFSET] = self.checksum;
        buf[FOOTER_OFFSET] = FOOTER;
        buf
    }

    /// Decode a captured frame.
    ///
    /// Only frames this codec can produce are accepted: header, footer,
    /// padding and checksum must all match.
    pub fn decode(data: &[u8]) -> Result<Self> {
        if data.len() != FRAME_LEN {
            return Err(Error::InvalidInput(format!(
                "frame is {} bytes, expected {}",
                data.len(),
                FRAME_LEN
            )));
        }
        if data[..HEADER_LEN] != HEADER_MAGIC {
            return Err(Error::InvalidInput(format!(
                "bad header magic {:02X?}",
                &data[..HEADER_LEN]
            )));
        }
        if data[FOOTER_OFFSET] != FOOTER {
            return Err(Error::InvalidInput(format!(
                "bad footer 0x{:02X}",
                data[FOOTER_OFFSET]
            )));
        }

        let opcode_bytes = [data[OPCODE_OFFSET], data[OPCODE_OFFSET + 1]];
        let opcode = Opcode::from_bytes(opcode_bytes).ok_or_else(|| {
            Error::InvalidInput(format!("unknown opcode {:02X?}", opcode_bytes))
        })?;

        let payload = &data[PAYLOAD_OFFSET..CHECKSUM_OFFSET];
        let checksum = data[CHECKSUM_OFFSET];
        let (frame, used) = match opcode {
            Opcode::SetIndicator => {
                if payload[0] != INDICATOR_MARKER || payload[2] > 1 {
                    return Err(Error::InvalidInput(format!(
                        "malformed indicator payload {:02X?}",
                        &payload[..3]
                    )));
                }
                let index = INDICATOR_CODES
                    .iter()
                    .position(|c| c.selector == payload[1])
                    .ok_or_else(|| {
                        Error::InvalidInput(format!("unknown selector 0x{:02X}", payload[1]))
                    })?;
                (Self::set_indicator(index, payload[2])?, 3)
            }
            Opcode::SetSensitivity => {
                if payload[0] != payload[1] {
                    return Err(Error::InvalidInput(format!(
                        "resolution value {} does not match repeat {}",
                        payload[0], payload[1]
                    )));
                }
                (Self::set_sensitivity(payload[0]), 2)
            }
        };

        if payload[used..].iter().any(|&b| b != 0) {
            return Err(Error::InvalidInput("non-zero payload padding".into()));
        }
        if checksum != frame.checksum {
            return Err(Error::InvalidInput(format!(
                "checksum 0x{:02X}, expected 0x{:02X}",
                checksum, frame.checksum
            )));
        }
        Ok(frame)
    }
}
