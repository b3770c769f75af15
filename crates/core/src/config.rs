//! Driver configuration.
//!
//! Loaded from a JSON file. Every field has a default, so an empty object
//! (or no file at all) is a valid configuration.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Environment variable naming a config file when none is given explicitly.
pub const CONFIG_ENV: &str = "RAZER_HID_CONFIG";

/// Default LED name prefix.
pub const DEFAULT_LED_PREFIX: &str = "led";

/// Default control-transfer timeout, in milliseconds.
pub const DEFAULT_CONTROL_TIMEOUT_MS: u64 = 5000;

/// How frames reach the device.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// HID feature report through the kernel's hidraw node.
    #[default]
    Hidraw,
    /// Raw control transfer through libusb; detaches the kernel driver while sending.
    Usb,
}

/// Settings that shape how sessions are built and frames are sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    /// Prefix for LED names (`<prefix>::wheel`, `<prefix>::logo`).
    pub led_prefix: String,
    /// Control transfer timeout.
    pub control_timeout_ms: u64,
    pub backend: Backend,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            led_prefix: DEFAULT_LED_PREFIX.into(),
            control_timeout_ms: DEFAULT_CONTROL_TIMEOUT_MS,
            backend: Backend::default(),
        }
    }
}

impl DriverConfig {
    pub fn control_timeout(&self) -> Duration {
        Duration::from_millis(self.control_timeout_ms)
    }

    /// Reject values that could never produce a working session.
    pub fn validate(&self) -> Result<()> {
        if self.led_prefix.is_empty() || self.led_prefix.contains('/') {
            return Err(Error::Config(format!(
                "led_prefix {:?} must be non-empty and must not contain '/'",
                self.led_prefix
            )));
        }
        if self.control_timeout_ms == 0 {
            return Err(Error::Config("control_timeout_ms must be positive".into()));
        }
        Ok(())
    }

    /// Parse and validate a JSON document.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Which file to load: the explicit path, else `$RAZER_HID_CONFIG`, else none.
pub fn config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from))
}

/// Load the configuration, falling back to defaults when no file is named.
pub fn load_config(explicit: Option<&Path>) -> Result<DriverConfig> {
    let Some(path) = config_path(explicit) else {
        debug!("No config file, using defaults");
        return Ok(DriverConfig::default());
    };

    let text = std::fs::read_to_string(&path)
        .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
    let config = DriverConfig::from_json(&text)?;
    debug!(path = %path.display(), ?config, "Config loaded");
    Ok(config)
}
