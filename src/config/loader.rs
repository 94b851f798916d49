//! Module catalogue loader with 3-tier precedence
//!
//! Priority order (highest to lowest):
//! 1. Host modules (declared in the host manifest)
//! 2. Built-in defaults (control panel, reports, sitemaps)
//! 3. Embedded catalogue (`modules/*.toml`)
//!
//! File overrides for module settings are discovered separately by
//! [`ModuleCatalog::load_file_overrides`].

use crate::config::{get_default_modules, FileOverrides, HostManifest, ModuleSpec};
use crate::descriptor::ConfigDescriptorFactory;
use crate::extension::{StaticExtension, StaticHost};
use crate::types::{RegistryError, Result};
use include_dir::{include_dir, Dir};
use indexmap::IndexMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

// Embed the module catalogue at compile time
static MODULES_DIR: Dir = include_dir!("$CARGO_MANIFEST_DIR/modules");

pub struct ModuleCatalog {
    modules: IndexMap<String, ModuleSpec>,
}

impl ModuleCatalog {
    pub fn new() -> Result<Self> {
        let mut modules = get_default_modules();
        info!("Loaded {} built-in configuration modules", modules.len());

        let embedded = Self::load_embedded()?;
        info!("Loaded {} configuration modules from catalogue", embedded.len());

        for (key, spec) in embedded {
            if modules.contains_key(&key) {
                debug!("Built-in module '{}' takes priority over catalogue", key);
                continue;
            }
            modules.insert(key, spec);
        }

        Ok(Self { modules })
    }

    fn load_embedded() -> Result<IndexMap<String, ModuleSpec>> {
        let mut modules = IndexMap::new();

        let mut files: Vec<_> = MODULES_DIR
            .files()
            .filter(|f| f.path().extension().is_some_and(|ext| ext == "toml"))
            .collect();
        files.sort_by(|a, b| a.path().cmp(b.path()));

        for file in files {
            let file_name = file.path().display().to_string();

            let content = file.contents_utf8().ok_or_else(|| {
                RegistryError::ConfigError(format!("Invalid UTF-8 in {}", file_name))
            })?;

            match toml::from_str::<ModuleSpec>(content) {
                Ok(spec) => {
                    debug!("Loaded catalogue module: {}", spec.key);
                    modules.insert(spec.key.clone(), spec);
                }
                Err(e) => {
                    warn!("Failed to parse catalogue file {}: {}", file_name, e);
                }
            }
        }

        Ok(modules)
    }

    /// Add host-declared modules; these replace catalogue entries with the same key
    pub fn with_modules(mut self, specs: impl IntoIterator<Item = ModuleSpec>) -> Self {
        for spec in specs {
            debug!("Registering host module: {}", spec.key);
            self.modules.insert(spec.key.clone(), spec);
        }
        self
    }

    pub fn get(&self, key: &str) -> Result<&ModuleSpec> {
        self.modules
            .get(key)
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))
    }

    pub fn factory(&self, key: &str) -> Result<ConfigDescriptorFactory> {
        Ok(ConfigDescriptorFactory::new(self.get(key)?.clone()))
    }

    pub fn list(&self) -> Vec<&ModuleSpec> {
        self.modules.values().collect()
    }

    /// Build a host from a manifest, resolving module keys against this catalogue
    pub fn build_host(&self, manifest: &HostManifest) -> Result<StaticHost> {
        let mut host = StaticHost::new();

        for entry in &manifest.extensions {
            let mut extension = StaticExtension::new(entry.handle.clone())
                .with_edition(entry.edition)
                .with_enabled(entry.enabled);

            for key in &entry.modules {
                extension = extension.with_config(self.factory(key)?);
            }

            debug!(
                "Extension '{}' contributes {} modules",
                entry.handle,
                entry.modules.len()
            );
            host.push(Arc::new(extension));
        }

        Ok(host)
    }

    /// Load file overrides from the first location that exists:
    /// 1. ./.confreg.toml (project-specific)
    /// 2. $CONFREG_CONFIG (environment variable)
    /// 3. ~/.config/confreg/config.toml (user-global)
    pub fn load_file_overrides() -> Result<FileOverrides> {
        let mut candidates = Vec::new();

        if let Ok(cwd) = std::env::current_dir() {
            candidates.push(cwd.join(".confreg.toml"));
        }

        if let Ok(config_path) = std::env::var("CONFREG_CONFIG") {
            candidates.push(PathBuf::from(config_path));
        }

        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("confreg").join("config.toml"));
        }

        for path in &candidates {
            if path.exists() {
                debug!("Loading file overrides from: {}", path.display());
                let content = std::fs::read_to_string(path).map_err(|e| {
                    RegistryError::ConfigError(format!("Failed to read overrides: {}", e))
                })?;
                return FileOverrides::from_toml_str(&content);
            }
        }

        debug!("No override file found");
        Ok(FileOverrides::default())
    }
}
