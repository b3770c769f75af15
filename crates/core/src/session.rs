//! Per-device session: the feature controllers attached to one interface.

use crate::device::MouseModel;
use crate::error::{Error, Result};
use crate::host::FeatureHost;
use crate::indicator::IndicatorController;
use crate::sensitivity::SensitivityController;
use crate::transport::ControlTransport;
use std::sync::Arc;
use tracing::{error, info};

/// Model-specific feature controllers.
///
/// `close` releases whatever was actually built. It must be safe to call on
/// a partially built set and to call more than once.
pub trait SpecialFunctions: Send {
    fn indicators(&self) -> Vec<&IndicatorController>;
    fn sensitivity(&self) -> Option<&SensitivityController>;
    fn close(&mut self, host: &dyn FeatureHost);

    fn indicator(&self, index: usize) -> Option<&IndicatorController> {
        self.indicators().into_iter().find(|led| led.index() == index)
    }
}

/// State held for one attached device interface.
pub struct DeviceSession {
    model: Option<MouseModel>,
    transport: Arc<dyn ControlTransport>,
    special: Option<Box<dyn SpecialFunctions>>,
}

impl DeviceSession {
    /// A session with no special functions.
    pub fn new(model: Option<MouseModel>, transport: Arc<dyn ControlTransport>) -> Self {
        Self {
            model,
            transport,
            special: None,
        }
    }

    /// Attach model-specific controllers.
    pub fn with_special(mut self, special: Box<dyn SpecialFunctions>) -> Self {
        self.special = Some(special);
        self
    }

    pub fn model(&self) -> Option<MouseModel> {
        self.model
    }

    pub fn has_special_functions(&self) -> bool {
        self.special.is_some()
    }

    /// Names of all indicators, in index order.
    pub fn indicator_names(&self) -> Vec<String> {
        self.special
            .as_ref()
            .map(|s| s.indicators().iter().map(|led| led.name().to_string()).collect())
            .unwrap_or_default()
    }

    /// Map an indicator name to its index.
    pub fn indicator_index(&self, name: &str) -> Option<usize> {
        self.special
            .as_ref()?
            .indicators()
            .into_iter()
            .find(|led| led.name() == name)
            .map(IndicatorController::index)
    }

    /// Whether an indicator exists at `index`.
    pub fn has_indicator(&self, index: usize) -> bool {
        self.special
            .as_ref()
            .and_then(|s| s.indicator(index))
            .is_some()
    }

    /// Set an indicator and report the outcome.
    pub fn apply_indicator(&self, index: usize, value: u8) -> Result<()> {
        let led = self
            .special
            .as_ref()
            .and_then(|s| s.indicator(index))
            .ok_or(Error::UnknownIndicator(index))?;
        led.apply(self.transport.as_ref(), value)
    }

    /// Set an indicator. Fire-and-forget: failures are logged.
    pub fn set_indicator(&self, index: usize, value: u8) {
        match self.special.as_ref().and_then(|s| s.indicator(index)) {
            Some(led) => led.set(self.transport.as_ref(), value),
            None => error!(index, "Unknown LED index"),
        }
    }

    /// Brightness as the host would read it back (always 0).
    pub fn indicator_brightness(&self, index: usize) -> Option<u8> {
        self.special
            .as_ref()
            .and_then(|s| s.indicator(index))
            .map(IndicatorController::brightness)
    }

    /// Read the `resolution` attribute.
    pub fn read_sensitivity(&self) -> Option<String> {
        self.special
            .as_ref()
            .and_then(|s| s.sensitivity())
            .map(SensitivityController::show)
    }

    /// Write the `resolution` attribute.
    pub fn write_sensitivity(&self, text: &str) -> Result<usize> {
        let sensitivity = self
            .special
            .as_ref()
            .and_then(|s| s.sensitivity())
            .ok_or_else(|| Error::InvalidInput("no resolution attribute on this interface".into()))?;
        sensitivity.store(self.transport.as_ref(), text)
    }

    /// Release all special functions. Safe to call repeatedly.
    pub fn close(&mut self, host: &dyn FeatureHost) {
        if let Some(mut special) = self.special.take() {
            special.close(host);
            info!(model = ?self.model, "Special functions released");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::LocalRegistry;
    use crate::transport::mock::MockTransport;

    #[test]
    fn plain_session_has_nothing() {
        let mock = MockTransport::new();
        let session = DeviceSession::new(None, Arc::new(mock.clone()));
        assert!(!session.has_special_functions());
        assert!(session.indicator_names().is_empty());
        assert_eq!(session.indicator_index("led::wheel"), None);
        assert_eq!(session.read_sensitivity(), None);
        assert!(session.write_sensitivity("10").is_err());

        session.set_indicator(0, 1);
        assert!(!session.has_indicator(0));
        assert!(matches!(
            session.apply_indicator(0, 1),
            Err(Error::UnknownIndicator(0))
        ));
        assert!(mock.sent().is_empty());
    }

    #[test]
    fn close_without_special_functions_is_noop() {
        let host = LocalRegistry::new();
        let mut session = DeviceSession::new(None, Arc::new(MockTransport::new()));
        session.close(&host);
        session.close(&host);
        assert!(host.history().is_empty());
    }
}
