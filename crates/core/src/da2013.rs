//! DeathAdder 2013 special functions: wheel and logo LEDs plus resolution.
//!
//! Construction runs a fixed list of steps. Each completed step is pushed on
//! a stack; teardown pops the stack, so whatever was built is undone in
//! reverse order and nothing else is touched.

use crate::config::DriverConfig;
use crate::device::InterfaceProtocol;
use crate::error::{Error, Result};
use crate::host::FeatureHost;
use crate::indicator::IndicatorController;
use crate::sensitivity::{SensitivityController, ATTRIBUTE_NAME};
use crate::session::SpecialFunctions;
use tracing::{debug, error, info};

/// Number of LEDs on the device.
pub const INDICATOR_COUNT: usize = 2;

/// One construction step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStep {
    AllocateIndicator(usize),
    RegisterIndicator(usize),
    CreateAttribute,
}

/// Construction order. Teardown is the exact reverse.
pub const BUILD_ORDER: [BuildStep; 5] = [
    BuildStep::AllocateIndicator(0),
    BuildStep::AllocateIndicator(1),
    BuildStep::RegisterIndicator(0),
    BuildStep::RegisterIndicator(1),
    BuildStep::CreateAttribute,
];

/// Where construction or teardown stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    /// This many steps of `BUILD_ORDER` are complete.
    PartiallyBuilt(usize),
    Ready,
    Closed,
}

/// Controllers for one DeathAdder 2013 mouse interface.
pub struct Da2013Functions {
    indicators: [Option<IndicatorController>; INDICATOR_COUNT],
    sensitivity: SensitivityController,
    completed: Vec<BuildStep>,
    closed: bool,
}

impl Da2013Functions {
    fn empty() -> Self {
        Self {
            indicators: [None, None],
            sensitivity: SensitivityController,
            completed: Vec::with_capacity(BUILD_ORDER.len()),
            closed: false,
        }
    }

    /// Build the special functions for one interface.
    ///
    /// Only the mouse interface gets them; other interfaces return `Ok(None)`
    /// without touching the host. On failure everything built so far has
    /// already been torn down.
    pub fn init(
        protocol: InterfaceProtocol,
        host: &dyn FeatureHost,
        config: &DriverConfig,
    ) -> Result<Option<Self>> {
        if protocol != InterfaceProtocol::Mouse {
            debug!(%protocol, "Not the mouse interface, no special functions");
            return Ok(None);
        }

        let mut functions = Self::empty();
        for step in BUILD_ORDER {
            if let Err(e) = functions.run(step, host, &config.led_prefix) {
                error!(?step, error = %e, "Special function setup failed");
                functions.close(host);
                return Err(e);
            }
        }

        info!(prefix = %config.led_prefix, "LEDs and resolution attribute ready");
        Ok(Some(functions))
    }

    fn run(&mut self, step: BuildStep, host: &dyn FeatureHost, prefix: &str) -> Result<()> {
        match step {
            BuildStep::AllocateIndicator(index) => {
                let slot = self
                    .indicators
                    .get_mut(index)
                    .ok_or(Error::UnknownIndicator(index))?;
                *slot = Some(IndicatorController::new(prefix, index)?);
            }
            BuildStep::RegisterIndicator(index) => {
                let led = self
                    .indicators
                    .get(index)
                    .and_then(Option::as_ref)
                    .ok_or(Error::UnknownIndicator(index))?;
                host.register_indicator(&led.info())?;
            }
            BuildStep::CreateAttribute => {
                host.create_attribute(&self.sensitivity.attribute())?;
            }
        }
        self.completed.push(step);
        Ok(())
    }

    fn undo(&mut self, step: BuildStep, host: &dyn FeatureHost) {
        match step {
            BuildStep::CreateAttribute => host.remove_attribute(ATTRIBUTE_NAME),
            BuildStep::RegisterIndicator(index) => {
                if let Some(led) = self.indicators.get(index).and_then(Option::as_ref) {
                    host.unregister_indicator(led.name());
                }
            }
            BuildStep::AllocateIndicator(index) => {
                if let Some(slot) = self.indicators.get_mut(index) {
                    *slot = None;
                }
            }
        }
        debug!(?step, "Undone");
    }

    pub fn state(&self) -> SessionState {
        match (self.closed, self.completed.len()) {
            (true, _) => SessionState::Closed,
            (false, 0) => SessionState::Uninitialized,
            (false, n) if n == BUILD_ORDER.len() => SessionState::Ready,
            (false, n) => SessionState::PartiallyBuilt(n),
        }
    }

    /// Steps still awaiting teardown, in construction order.
    pub fn completed_steps(&self) -> &[BuildStep] {
        &self.completed
    }
}

impl SpecialFunctions for Da2013Functions {
    fn indicators(&self) -> Vec<&IndicatorController> {
        self.indicators.iter().flatten().collect()
    }

    fn sensitivity(&self) -> Option<&SensitivityController> {
        if self.completed.contains(&BuildStep::CreateAttribute) {
            Some(&self.sensitivity)
        } else {
            None
        }
    }

    fn close(&mut self, host: &dyn FeatureHost) {
        while let Some(step) = self.completed.pop() {
            self.undo(step, host);
        }
        self.closed = true;
    }
}
