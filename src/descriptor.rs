//! Configuration descriptors and the factories that build them

use crate::config::{MigrationSource, ModuleSpec, NavSpec, SubNavItem};
use crate::installer::{LedgerMigration, Migration};
use crate::registry::ConfigurationRegistry;
use crate::settings::SettingsModel;
use crate::types::{Edition, Result};
use indexmap::IndexMap;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Resolved descriptors in discovery order
pub type Configs = IndexMap<String, ConfigDescriptor>;

pub type MigrationFactory = Arc<dyn Fn() -> Box<dyn Migration> + Send + Sync>;

/// Runs after a module's settings are merged; may query the registry
pub type SettingsHook =
    Arc<dyn Fn(&mut SettingsModel, &ConfigurationRegistry) -> Result<()> + Send + Sync>;

/// One configuration module, as resolved by a registry rebuild
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigDescriptor {
    pub key: String,
    pub display_name: String,
    pub description: String,
    pub dependency_group: String,
    pub edition: Edition,
    pub settings: Option<SettingsModel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nav_item: Option<NavSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_nav_item: Option<NavSpec>,
}

impl ConfigDescriptor {
    /// Alternate name when one is set, display name otherwise
    pub fn name(&self) -> &str {
        self.settings
            .as_ref()
            .and_then(|s| s.alternate_name.as_deref())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.display_name)
    }

    pub fn is_enabled(&self) -> bool {
        self.settings.as_ref().is_some_and(|s| s.enabled)
    }
}

/// Constructor table entry for a configuration module
#[derive(Clone)]
pub struct ConfigDescriptorFactory {
    spec: Arc<ModuleSpec>,
    migration: Option<MigrationFactory>,
    settings_hook: Option<SettingsHook>,
}

impl ConfigDescriptorFactory {
    pub fn new(spec: ModuleSpec) -> Self {
        let migration: Option<MigrationFactory> = match &spec.migration {
            MigrationSource::None => None,
            MigrationSource::Ledger { tables } => {
                let tables = tables.clone();
                let factory: MigrationFactory = Arc::new(move || {
                    Box::new(LedgerMigration::new(tables.clone())) as Box<dyn Migration>
                });
                Some(factory)
            }
        };

        Self {
            spec: Arc::new(spec),
            migration,
            settings_hook: None,
        }
    }

    /// Replace the install migration
    pub fn with_migration<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn Migration> + Send + Sync + 'static,
    {
        let factory: MigrationFactory = Arc::new(factory);
        self.migration = Some(factory);
        self
    }

    pub fn without_migration(mut self) -> Self {
        self.migration = None;
        self
    }

    pub fn with_settings_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut SettingsModel, &ConfigurationRegistry) -> Result<()> + Send + Sync + 'static,
    {
        let hook: SettingsHook = Arc::new(hook);
        self.settings_hook = Some(hook);
        self
    }

    pub fn key(&self) -> &str {
        &self.spec.key
    }

    pub fn dependency_group(&self) -> &str {
        self.spec.dependency_group()
    }

    pub fn spec(&self) -> &ModuleSpec {
        &self.spec
    }

    /// Fully defaulted settings for this module
    pub fn create_settings_model(&self) -> SettingsModel {
        self.spec.defaults.clone()
    }

    pub fn create_install_migration(&self) -> Option<Box<dyn Migration>> {
        self.migration.as_ref().map(|factory| factory())
    }

    pub(crate) fn settings_hook(&self) -> Option<&SettingsHook> {
        self.settings_hook.as_ref()
    }

    /// A fresh, unresolved descriptor at the module's baseline edition
    pub fn build(&self) -> ConfigDescriptor {
        ConfigDescriptor {
            key: self.spec.key.clone(),
            display_name: self.spec.display_name.clone(),
            description: self.spec.description.clone(),
            dependency_group: self.dependency_group().to_string(),
            edition: self.spec.edition,
            settings: None,
            nav_item: self.spec.nav.clone(),
            settings_nav_item: self.spec.settings_nav.clone(),
        }
    }
}

impl fmt::Debug for ConfigDescriptorFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigDescriptorFactory")
            .field("key", &self.spec.key)
            .field("dependency_group", &self.dependency_group())
            .field("has_migration", &self.migration.is_some())
            .field("has_settings_hook", &self.settings_hook.is_some())
            .finish()
    }
}

/// Entry of the primary navigation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NavItem {
    pub label: String,
    pub url: String,
    pub icon: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub subnav: IndexMap<String, SubNavItem>,
}

/// Entry of the settings-page listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageItem {
    pub label: String,
    pub url: String,
    pub icon: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::get_default_modules;

    fn reports_factory() -> ConfigDescriptorFactory {
        let modules = get_default_modules();
        ConfigDescriptorFactory::new(modules["reports"].clone())
    }

    #[test]
    fn test_build_is_unresolved() {
        let descriptor = reports_factory().build();
        assert_eq!(descriptor.key, "reports");
        assert_eq!(descriptor.settings, None);
        assert!(!descriptor.is_enabled());
        assert_eq!(descriptor.name(), "Reports");
    }

    #[test]
    fn test_name_prefers_alternate_name() {
        let mut descriptor = reports_factory().build();
        let mut settings = SettingsModel::new(true);
        settings.alternate_name = Some("Insights".to_string());
        descriptor.settings = Some(settings);
        assert_eq!(descriptor.name(), "Insights");
    }

    #[test]
    fn test_dependency_group_defaults_to_key() {
        let factory = reports_factory();
        assert_eq!(factory.dependency_group(), "reports");
    }

    #[test]
    fn test_ledger_migration_from_spec() {
        let factory = reports_factory();
        assert!(factory.create_install_migration().is_some());
        assert!(factory.without_migration().create_install_migration().is_none());
    }
}
