//! Exposure of feature controllers to the host.
//!
//! The host decides how indicators and attributes become visible (LED class
//! devices, sysfs files, a CLI listing). Controllers only need to be
//! registered before use and unregistered before they are dropped.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Description of an indicator handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorInfo {
    pub name: String,
    /// Initial brightness reported to the host.
    pub brightness: u8,
    pub max_brightness: u8,
}

/// Description of a text attribute handed to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeInfo {
    pub name: &'static str,
    /// Unix permission bits.
    pub mode: u32,
}

/// Host side of indicator and attribute exposure.
pub trait FeatureHost {
    fn register_indicator(&self, info: &IndicatorInfo) -> Result<()>;
    fn unregister_indicator(&self, name: &str);
    fn create_attribute(&self, info: &AttributeInfo) -> Result<()>;
    fn remove_attribute(&self, name: &str);
}

/// Registration event, in the order the host saw them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostEvent {
    IndicatorRegistered(String),
    IndicatorUnregistered(String),
    AttributeCreated(String),
    AttributeRemoved(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exposed {
    Indicator(IndicatorInfo),
    Attribute(AttributeInfo),
}

#[derive(Default)]
struct RegistryState {
    exposed: BTreeMap<String, Exposed>,
    history: Vec<HostEvent>,
}

/// In-process host: keeps a name-keyed table of everything exposed.
///
/// Names are unique across indicators and attributes; a second registration
/// under a taken name is refused.
#[derive(Default)]
pub struct LocalRegistry {
    state: Mutex<RegistryState>,
}

impl LocalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether anything is currently exposed under `name`.
    pub fn is_registered(&self, name: &str) -> bool {
        self.lock().exposed.contains_key(name)
    }

    /// Snapshot of everything currently exposed, sorted by name.
    pub fn exposed(&self) -> Vec<(String, Exposed)> {
        self.lock()
            .exposed
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Every registration event so far.
    pub fn history(&self) -> Vec<HostEvent> {
        self.lock().history.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RegistryState> {
        // Every mutation completes under the lock, so a poisoned table is still consistent.
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn insert(&self, name: &str, entry: Exposed, event: HostEvent) -> Result<()> {
        let mut state = self.lock();
        if state.exposed.contains_key(name) {
            return Err(Error::Registration {
                name: name.to_string(),
                reason: "name already in use".into(),
            });
        }
        state.exposed.insert(name.to_string(), entry);
        state.history.push(event);
        Ok(())
    }

    fn remove(&self, name: &str, event: HostEvent) {
        let mut state = self.lock();
        if state.exposed.remove(name).is_none() {
            warn!(name, "Removing something that was never registered");
            return;
        }
        state.history.push(event);
    }
}

impl FeatureHost for LocalRegistry {
    fn register_indicator(&self, info: &IndicatorInfo) -> Result<()> {
        self.insert(
            &info.name,
            Exposed::Indicator(info.clone()),
            HostEvent::IndicatorRegistered(info.name.clone()),
        )?;
        debug!(name = %info.name, "LED registered");
        Ok(())
    }

    fn unregister_indicator(&self, name: &str) {
        self.remove(name, HostEvent::IndicatorUnregistered(name.to_string()));
        debug!(name, "LED unregistered");
    }

    fn create_attribute(&self, info: &AttributeInfo) -> Result<()> {
        self.insert(
            info.name,
            Exposed::Attribute(info.clone()),
            HostEvent::AttributeCreated(info.name.to_string()),
        )?;
        debug!(name = info.name, mode = format_args!("{:o}", info.mode), "Attribute created");
        Ok(())
    }

    fn remove_attribute(&self, name: &str) {
        self.remove(name, HostEvent::AttributeRemoved(name.to_string()));
        debug!(name, "Attribute removed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn led(name: &str) -> IndicatorInfo {
        IndicatorInfo {
            name: name.into(),
            brightness: 1,
            max_brightness: 1,
        }
    }

    #[test]
    fn register_and_unregister() {
        let host = LocalRegistry::new();
        host.register_indicator(&led("led::wheel")).unwrap();
        assert!(host.is_registered("led::wheel"));
        host.unregister_indicator("led::wheel");
        assert!(!host.is_registered("led::wheel"));
        assert_eq!(
            host.history(),
            vec![
                HostEvent::IndicatorRegistered("led::wheel".into()),
                HostEvent::IndicatorUnregistered("led::wheel".into()),
            ]
        );
    }

    #[test]
    fn duplicate_name_rejected() {
        let host = LocalRegistry::new();
        host.register_indicator(&led("led::logo")).unwrap();
        let result = host.register_indicator(&led("led::logo"));
        assert!(matches!(result, Err(Error::Registration { .. })));
    }

    #[test]
    fn attribute_and_indicator_share_namespace() {
        let host = LocalRegistry::new();
        host.create_attribute(&AttributeInfo {
            name: "resolution",
            mode: 0o664,
        })
        .unwrap();
        assert!(host.register_indicator(&led("resolution")).is_err());
    }

    #[test]
    fn removing_unknown_name_is_ignored() {
        let host = LocalRegistry::new();
        host.remove_attribute("resolution");
        host.unregister_indicator("led::wheel");
        assert!(host.history().is_empty());
    }
}
