//! Settings merger
//!
//! Precedence (highest to lowest):
//! 1. Persisted values from the settings store
//! 2. File overrides (`Context::Full` only)
//! 3. Module defaults

use crate::config::FileOverrides;
use crate::descriptor::ConfigDescriptorFactory;
use crate::settings::SettingsModel;
use crate::store::SettingsStore;
use crate::types::{Context, Result};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

/// Namespace root the module blobs live under
pub const DEFAULT_NAMESPACE: &str = "plugins.confreg";

pub struct SettingsMerger {
    store: Arc<dyn SettingsStore>,
    namespace: String,
    overrides: FileOverrides,
}

impl SettingsMerger {
    pub fn new(store: Arc<dyn SettingsStore>) -> Self {
        Self {
            store,
            namespace: DEFAULT_NAMESPACE.to_string(),
            overrides: FileOverrides::default(),
        }
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_overrides(mut self, overrides: FileOverrides) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Store path of a module's settings blob
    pub fn settings_path(&self, key: &str) -> String {
        format!("{}.{}", self.namespace, key)
    }

    pub fn merge(
        &self,
        factory: &ConfigDescriptorFactory,
        context: Context,
    ) -> Result<SettingsModel> {
        let key = factory.key();
        let mut settings = factory.create_settings_model();

        if context == Context::Full {
            if let Some(overrides) = self.overrides.for_module(key) {
                debug!("Applying {} file overrides to '{}'", overrides.len(), key);
                settings.overlay(overrides);
            }
        }

        match self.store.get(&self.settings_path(key))? {
            Some(Value::Object(persisted)) => settings.overlay(&persisted),
            Some(other) => warn!(
                "Ignoring persisted settings for '{}': expected an object, got {}",
                key, other
            ),
            None => debug!("No persisted settings for '{}'", key),
        }

        Ok(settings)
    }
}
