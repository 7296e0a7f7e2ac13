//! Configuration change notifications.

use slotmap::new_key_type;

use super::config::{CameraConfig, ConfigField};

new_key_type! {
    /// Returned by [`Camera::subscribe`](super::Camera::subscribe).
    pub struct SubscriptionId;
}

/// One modified configuration field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigChange {
    pub field: ConfigField,
}

impl ConfigChange {
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.field.name()
    }
}

/// Receives one call per modified field after every `configure`.
pub trait ConfigObserver {
    /// `config` is the configuration after the whole patch was applied.
    fn on_change(&mut self, change: &ConfigChange, config: &CameraConfig);
}

impl<F> ConfigObserver for F
where
    F: FnMut(&ConfigChange, &CameraConfig),
{
    fn on_change(&mut self, change: &ConfigChange, config: &CameraConfig) {
        self(change, config);
    }
}
