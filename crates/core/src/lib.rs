//! razer-hid-core: command frames, feature controllers, and device sessions.
//!
//! This crate drives the special functions of Razer mice (indicator LEDs and
//! sensor resolution) through a fixed-layout command protocol sent over the
//! USB control endpoint.

pub mod comm;
pub mod config;
pub mod da2013;
pub mod device;
pub mod driver;
pub mod error;
pub mod frame;
pub mod host;
pub mod indicator;
pub mod sensitivity;
pub mod session;
pub mod transport;

/// Razer USB Vendor ID.
pub const RAZER_VID: u16 = 0x1532;

/// Known Razer product IDs.
pub mod pids {
    /// DeathAdder 2013 Edition.
    pub const DEATHADDER_2013: u16 = 0x0037;
}
