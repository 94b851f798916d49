//! Configuration module catalogue types

use crate::edition::EditionRelation;
use crate::settings::SettingsModel;
use crate::types::Edition;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Declarative description of one configuration module
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleSpec {
    pub key: String,
    pub display_name: String,
    #[serde(default)]
    pub description: String,
    /// Ownership bucket; the key itself when unset
    #[serde(default)]
    pub dependency_group: Option<String>,
    /// Edition before any related extension elevates it
    #[serde(default)]
    pub edition: Edition,
    #[serde(default)]
    pub edition_relations: Vec<EditionRelation>,
    #[serde(default)]
    pub defaults: SettingsModel,
    #[serde(default)]
    pub nav: Option<NavSpec>,
    #[serde(default)]
    pub settings_nav: Option<NavSpec>,
    #[serde(default)]
    pub migration: MigrationSource,
}

impl ModuleSpec {
    pub fn dependency_group(&self) -> &str {
        self.dependency_group.as_deref().unwrap_or(&self.key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavSpec {
    pub label: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub subnav: IndexMap<String, SubNavItem>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubNavItem {
    pub label: String,
    pub url: String,
}

/// How a catalogue module installs its storage
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum MigrationSource {
    #[default]
    None,
    /// Records the module's tables in the schema ledger
    Ledger { tables: Vec<String> },
}
