//! Settings models
//!
//! A [`SettingsModel`] always starts from a module's defaults; layers are
//! overlaid field by field so nothing is ever left unset.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::warn;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsModel {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alternate_name: Option<String>,
    /// Module-specific fields
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl SettingsModel {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            ..Self::default()
        }
    }

    pub fn with_field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Overlay the fields present in `blob`; absent fields keep their value
    pub fn overlay(&mut self, blob: &Map<String, Value>) {
        for (name, value) in blob {
            match name.as_str() {
                "enabled" => match value.as_bool() {
                    Some(enabled) => self.enabled = enabled,
                    None => warn!("Ignoring non-boolean 'enabled' value: {}", value),
                },
                "alternateName" => match value {
                    Value::String(s) if !s.is_empty() => self.alternate_name = Some(s.clone()),
                    Value::String(_) | Value::Null => self.alternate_name = None,
                    other => warn!("Ignoring non-string 'alternateName' value: {}", other),
                },
                _ => {
                    self.fields.insert(name.clone(), value.clone());
                }
            }
        }
    }

    /// Persisted form of these settings
    pub fn to_value(&self) -> Value {
        let mut blob = Map::new();
        blob.insert("enabled".to_string(), Value::Bool(self.enabled));
        if let Some(name) = &self.alternate_name {
            blob.insert("alternateName".to_string(), Value::String(name.clone()));
        }
        for (name, value) in &self.fields {
            blob.insert(name.clone(), value.clone());
        }
        Value::Object(blob)
    }
}

/// Per-module entry nested in the control-panel settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleEntry {
    pub module_key: String,
    #[serde(default)]
    pub alternate_name: Option<String>,
}

/// The control-panel singleton that every module's settings merge against
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControlPanelSettings {
    pub settings: SettingsModel,
    /// Module entries indexed by module key
    pub modules: IndexMap<String, ModuleEntry>,
}

impl ControlPanelSettings {
    /// Re-index the persisted `modules` list by its `moduleKey` field.
    /// Malformed entries are dropped.
    pub fn from_settings(settings: SettingsModel) -> Self {
        let mut modules = IndexMap::new();

        let entries: Vec<Value> = match settings.field("modules") {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Object(map)) => map.values().cloned().collect(),
            Some(other) => {
                warn!("Ignoring malformed control panel modules: {}", other);
                Vec::new()
            }
            None => Vec::new(),
        };

        for entry in entries {
            match serde_json::from_value::<ModuleEntry>(entry) {
                Ok(entry) => {
                    modules.insert(entry.module_key.clone(), entry);
                }
                Err(e) => warn!("Skipping control panel module entry: {}", e),
            }
        }

        Self { settings, modules }
    }

    pub fn alternate_name_for(&self, key: &str) -> Option<&str> {
        self.modules
            .get(key)
            .and_then(|m| m.alternate_name.as_deref())
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_overlay_keeps_absent_fields() {
        let mut settings = SettingsModel::new(false)
            .with_field("defaultPageLength", 10)
            .with_field("defaultExportDelimiter", ",");

        settings.overlay(&object(json!({ "enabled": true, "defaultPageLength": 50 })));

        assert!(settings.enabled);
        assert_eq!(settings.field("defaultPageLength"), Some(&json!(50)));
        assert_eq!(settings.field("defaultExportDelimiter"), Some(&json!(",")));
    }

    #[test]
    fn test_overlay_ignores_malformed_enabled() {
        let mut settings = SettingsModel::new(true);
        settings.overlay(&object(json!({ "enabled": "yes" })));
        assert!(settings.enabled);
    }

    #[test]
    fn test_overlay_clears_empty_alternate_name() {
        let mut settings = SettingsModel::new(true);
        settings.overlay(&object(json!({ "alternateName": "Site Maps" })));
        assert_eq!(settings.alternate_name.as_deref(), Some("Site Maps"));

        settings.overlay(&object(json!({ "alternateName": "" })));
        assert_eq!(settings.alternate_name, None);
    }

    #[test]
    fn test_to_value_round_trips_through_overlay() {
        let settings = SettingsModel::new(true).with_field("maxRedirects", 250);
        let mut restored = SettingsModel::default();
        restored.overlay(&object(settings.to_value()));
        assert_eq!(restored, settings);
    }

    #[test]
    fn test_control_panel_modules_indexed_by_key() {
        let settings = SettingsModel::new(true).with_field(
            "modules",
            json!([
                { "moduleKey": "sitemaps", "alternateName": "XML Sitemaps" },
                { "moduleKey": "forms", "alternateName": "", "enabled": false },
                { "alternateName": "missing key" }
            ]),
        );

        let cp = ControlPanelSettings::from_settings(settings);

        assert_eq!(cp.modules.len(), 2);
        assert_eq!(cp.alternate_name_for("sitemaps"), Some("XML Sitemaps"));
        assert_eq!(cp.alternate_name_for("forms"), None);
        assert_eq!(cp.alternate_name_for("reports"), None);
    }
}
