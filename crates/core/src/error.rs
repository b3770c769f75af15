//! Error types for razer-hid-core.

use thiserror::Error;

/// Core library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// USB communication failure reported by the transport.
    #[error("USB error: {0}")]
    Usb(String),

    /// Device not found during enumeration, or gone mid-transfer.
    #[error("device not found: {0}")]
    DeviceNotFound(String),

    /// The control transfer moved a different number of bytes than the frame holds.
    #[error("short control transfer: sent {actual} of {expected} bytes")]
    ShortTransfer { expected: usize, actual: usize },

    /// Permission denied opening or claiming the device.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// Operation timed out.
    #[error("timeout: {0}")]
    Timeout(String),

    /// No indicator exists at this index.
    #[error("unknown LED index {0}")]
    UnknownIndicator(usize),

    /// Caller-supplied text could not be parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A feature controller could not be constructed.
    #[error("cannot allocate {0}")]
    Allocation(String),

    /// The host refused to expose an indicator or attribute.
    #[error("cannot register {name}: {reason}")]
    Registration { name: String, reason: String },

    /// Configuration file or value error.
    #[error("config error: {0}")]
    Config(String),
}

/// Convenience Result alias.
pub type Result<T> = std::result::Result<T, Error>;
