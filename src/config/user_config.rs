//! Host manifest and file override parsing

use crate::config::registry::ModuleSpec;
use crate::types::{Edition, RegistryError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::Path;

/// Extensions installed in the host, as described by a TOML manifest
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HostManifest {
    #[serde(default)]
    pub extensions: Vec<ExtensionEntry>,
    /// Modules defined by the host on top of the built-in catalogue
    #[serde(default)]
    pub modules: Vec<ModuleSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtensionEntry {
    pub handle: String,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub edition: Edition,
    /// Keys of the modules this extension contributes, in order
    #[serde(default)]
    pub modules: Vec<String>,
}

fn default_enabled() -> bool {
    true
}

impl HostManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RegistryError::ConfigError(format!(
                "Failed to read host manifest {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            RegistryError::ConfigError(format!("Failed to parse host manifest: {}", e))
        })
    }
}

/// File-based settings overrides, one table per module key
///
/// ```toml
/// [sitemaps]
/// totalElementsPerSitemap = 1000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileOverrides {
    modules: HashMap<String, Map<String, Value>>,
}

impl FileOverrides {
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            RegistryError::ConfigError(format!("Failed to parse overrides: {}", e))
        })
    }

    pub fn with_module(mut self, key: &str, values: Map<String, Value>) -> Self {
        self.modules.insert(key.to_string(), values);
        self
    }

    pub fn for_module(&self, key: &str) -> Option<&Map<String, Value>> {
        self.modules.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_host_manifest() {
        let manifest = HostManifest::from_toml_str(
            r#"
            [[extensions]]
            handle = "seo-suite"
            edition = "pro"
            modules = ["metadata", "redirects", "sitemaps"]

            [[extensions]]
            handle = "forms-suite"
            enabled = false
            modules = ["forms"]
            "#,
        )
        .unwrap();

        assert_eq!(manifest.extensions.len(), 2);
        assert_eq!(manifest.extensions[0].edition, Edition::Pro);
        assert!(manifest.extensions[0].enabled);
        assert!(!manifest.extensions[1].enabled);
        assert_eq!(manifest.extensions[1].edition, Edition::Standard);
    }

    #[test]
    fn test_manifest_with_custom_module() {
        let manifest = HostManifest::from_toml_str(
            r#"
            [[modules]]
            key = "events"
            display_name = "Events"

            [modules.defaults]
            enabled = true
            calendar = "default"
            "#,
        )
        .unwrap();

        let spec = &manifest.modules[0];
        assert_eq!(spec.dependency_group(), "events");
        assert!(spec.defaults.enabled);
        assert_eq!(spec.defaults.field("calendar"), Some(&json!("default")));
    }

    #[test]
    fn test_parse_overrides() {
        let overrides = FileOverrides::from_toml_str(
            r#"
            [sitemaps]
            enabled = false
            totalElementsPerSitemap = 1000
            "#,
        )
        .unwrap();

        let sitemaps = overrides.for_module("sitemaps").unwrap();
        assert_eq!(sitemaps.get("enabled"), Some(&json!(false)));
        assert_eq!(sitemaps.get("totalElementsPerSitemap"), Some(&json!(1000)));
        assert!(overrides.for_module("forms").is_none());
    }

    #[test]
    fn test_invalid_manifest() {
        let result = HostManifest::from_toml_str("extensions = 5");
        assert!(matches!(result, Err(RegistryError::ConfigError(_))));
    }
}
