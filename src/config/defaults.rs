//! Built-in configuration modules
//!
//! These ship with every installation; the rest of the catalogue is embedded
//! from `modules/*.toml`.

use crate::config::registry::{MigrationSource, ModuleSpec, NavSpec, SubNavItem};
use crate::edition::EditionRelation;
use crate::settings::SettingsModel;
use crate::types::Edition;
use indexmap::IndexMap;
use serde_json::json;

/// Key of the control-panel module every other module merges against
pub const CONTROL_PANEL_KEY: &str = "control-panel";

pub fn get_default_modules() -> IndexMap<String, ModuleSpec> {
    let mut modules = IndexMap::new();

    for spec in [control_panel_module(), reports_module(), sitemaps_module()] {
        modules.insert(spec.key.clone(), spec);
    }

    modules
}

pub fn control_panel_module() -> ModuleSpec {
    ModuleSpec {
        key: CONTROL_PANEL_KEY.to_string(),
        display_name: "Control Panel".to_string(),
        description: "Shared settings for all configuration modules".to_string(),
        dependency_group: None,
        edition: Edition::Standard,
        edition_relations: vec![],
        defaults: SettingsModel::new(true)
            .with_field("modules", json!([]))
            .with_field("enableUpgradeMessages", true),
        nav: None,
        settings_nav: Some(NavSpec {
            label: "Control Panel".to_string(),
            url: "confreg/settings/control-panel".to_string(),
            subnav: IndexMap::new(),
        }),
        migration: MigrationSource::None,
    }
}

fn reports_module() -> ModuleSpec {
    let mut subnav = IndexMap::new();
    subnav.insert(
        "reports".to_string(),
        SubNavItem {
            label: "Reports".to_string(),
            url: "confreg/settings/reports".to_string(),
        },
    );

    ModuleSpec {
        key: "reports".to_string(),
        display_name: "Reports".to_string(),
        description: "Build and export reports".to_string(),
        dependency_group: None,
        edition: Edition::Standard,
        edition_relations: vec![EditionRelation::new("reports-suite", Edition::Pro)],
        defaults: SettingsModel::new(true)
            .with_field("displayName", "")
            .with_field("defaultPageLength", 10)
            .with_field("defaultExportDelimiter", ","),
        nav: Some(NavSpec {
            label: "Reports".to_string(),
            url: "confreg/reports".to_string(),
            subnav: IndexMap::new(),
        }),
        settings_nav: Some(NavSpec {
            label: "Reports".to_string(),
            url: "confreg/settings/reports".to_string(),
            subnav,
        }),
        migration: MigrationSource::Ledger {
            tables: vec!["reports".to_string(), "reports_datasources".to_string()],
        },
    }
}

fn sitemaps_module() -> ModuleSpec {
    ModuleSpec {
        key: "sitemaps".to_string(),
        display_name: "Sitemaps".to_string(),
        description: "Manage XML sitemaps".to_string(),
        dependency_group: None,
        edition: Edition::Standard,
        edition_relations: vec![
            EditionRelation::new("xml-sitemaps", Edition::Standard),
            EditionRelation::new("seo-suite", Edition::Pro),
        ],
        defaults: SettingsModel::new(true)
            .with_field("enableCustomSections", false)
            .with_field("enableDynamicSitemaps", true)
            .with_field("totalElementsPerSitemap", 500)
            .with_field("enableMultilingualSitemaps", false),
        nav: Some(NavSpec {
            label: "Sitemaps".to_string(),
            url: "confreg/sitemaps".to_string(),
            subnav: IndexMap::new(),
        }),
        settings_nav: Some(NavSpec {
            label: "Sitemaps".to_string(),
            url: "confreg/settings/sitemaps".to_string(),
            subnav: IndexMap::new(),
        }),
        migration: MigrationSource::Ledger {
            tables: vec!["sitemaps".to_string()],
        },
    }
}
