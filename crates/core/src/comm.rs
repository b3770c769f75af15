//! Error classification for callers of feature writes.
//!
//! Transfers are never retried. A failed transmission is classified here so
//! that write interfaces can report it in their own convention (errno codes
//! for attribute writes, exit status and hints for the CLI).

use crate::error::Error;

/// errno values reported by attribute writes.
pub mod errno {
    pub const EIO: i32 = 5;
    pub const ENOMEM: i32 = 12;
    pub const EACCES: i32 = 13;
    pub const ENODEV: i32 = 19;
    pub const EINVAL: i32 = 22;
    pub const ETIMEDOUT: i32 = 110;
}

/// Classification of feature-write errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Device is gone. Further writes will fail the same way.
    Disconnected,
    /// The process may not open or claim the device.
    PermissionDenied,
    /// The device did not answer within the control timeout.
    Timeout,
    /// The transfer ran but the device took the wrong number of bytes, or the
    /// bus reported some other failure.
    Transport,
    /// The request itself was bad; nothing was sent.
    InvalidRequest,
    /// Feature setup failed; the device still works as a plain mouse.
    Setup,
}

impl ErrorClass {
    /// Classify an error.
    pub fn classify(err: &Error) -> Self {
        match err {
            Error::DeviceNotFound(_) => Self::Disconnected,
            Error::PermissionDenied(_) => Self::PermissionDenied,
            Error::Timeout(_) => Self::Timeout,
            Error::ShortTransfer { .. } => Self::Transport,
            Error::Usb(msg) => {
                let lower = msg.to_lowercase();
                if lower.contains("no such device") || lower.contains("disconnect") {
                    Self::Disconnected
                } else if lower.contains("access") || lower.contains("permission") {
                    Self::PermissionDenied
                } else if lower.contains("timeout") || lower.contains("timed out") {
                    Self::Timeout
                } else {
                    Self::Transport
                }
            }
            Error::UnknownIndicator(_) | Error::InvalidInput(_) | Error::Config(_) => {
                Self::InvalidRequest
            }
            Error::Allocation(_) | Error::Registration { .. } => Self::Setup,
        }
    }

    /// Positive errno for this class.
    ///
    /// Transport failures collapse to `EIO` unless they carry a more specific
    /// meaning for the caller.
    pub fn errno(&self) -> i32 {
        match self {
            Self::Disconnected => errno::ENODEV,
            Self::PermissionDenied => errno::EACCES,
            Self::Timeout => errno::ETIMEDOUT,
            Self::Transport => errno::EIO,
            Self::InvalidRequest => errno::EINVAL,
            Self::Setup => errno::ENOMEM,
        }
    }

    /// Short hint for interactive users.
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Disconnected => Some("is the mouse still plugged in?"),
            Self::PermissionDenied => {
                Some("run as root or install a udev rule granting access to the device")
            }
            Self::Timeout => Some("the device did not acknowledge the command"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_short_transfer_as_transport() {
        let err = Error::ShortTransfer {
            expected: 90,
            actual: 0,
        };
        assert_eq!(ErrorClass::classify(&err), ErrorClass::Transport);
        assert_eq!(ErrorClass::classify(&err).errno(), errno::EIO);
    }

    #[test]
    fn classify_disconnect() {
        let err = Error::DeviceNotFound("DeathAdder".into());
        assert_eq!(ErrorClass::classify(&err), ErrorClass::Disconnected);
        assert_eq!(ErrorClass::classify(&err).errno(), errno::ENODEV);
    }

    #[test]
    fn classify_usb_messages() {
        assert_eq!(
            ErrorClass::classify(&Error::Usb("No such device (it may have been disconnected)".into())),
            ErrorClass::Disconnected
        );
        assert_eq!(
            ErrorClass::classify(&Error::Usb("Access denied (insufficient permissions)".into())),
            ErrorClass::PermissionDenied
        );
        assert_eq!(
            ErrorClass::classify(&Error::Usb("Operation timed out".into())),
            ErrorClass::Timeout
        );
        assert_eq!(
            ErrorClass::classify(&Error::Usb("Pipe error".into())),
            ErrorClass::Transport
        );
    }

    #[test]
    fn classify_invalid_input() {
        let err = Error::InvalidInput("abc".into());
        assert_eq!(ErrorClass::classify(&err), ErrorClass::InvalidRequest);
        assert_eq!(ErrorClass::classify(&err).errno(), errno::EINVAL);
    }

    #[test]
    fn classify_setup_failures() {
        let err = Error::Registration {
            name: "led::logo".into(),
            reason: "exists".into(),
        };
        assert_eq!(ErrorClass::classify(&err), ErrorClass::Setup);
        assert_eq!(
            ErrorClass::classify(&Error::Allocation("LED".into())),
            ErrorClass::Setup
        );
    }

    #[test]
    fn hints_only_for_environmental_errors() {
        assert!(ErrorClass::PermissionDenied.hint().is_some());
        assert!(ErrorClass::InvalidRequest.hint().is_none());
    }
}
