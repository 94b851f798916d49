//! Extensions and the host that enumerates them

use crate::descriptor::ConfigDescriptorFactory;
use crate::types::{Edition, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An installed extension contributing configuration modules
pub trait ExtensionProvider: Send + Sync {
    fn handle(&self) -> &str;

    fn is_enabled(&self) -> bool;

    /// Edition the extension is licensed at
    fn edition(&self) -> Edition {
        Edition::Standard
    }

    fn contributed_configs(&self) -> Vec<ConfigDescriptorFactory>;
}

/// The plugin system hosting the extensions
pub trait ExtensionHost: Send + Sync {
    /// All installed extensions, enabled or not, in a stable order
    fn extensions(&self) -> Result<Vec<Arc<dyn ExtensionProvider>>>;

    fn extension(&self, handle: &str) -> Result<Option<Arc<dyn ExtensionProvider>>> {
        Ok(self
            .extensions()?
            .into_iter()
            .find(|ext| ext.handle() == handle))
    }
}

/// Extension with a fixed set of factories and a toggleable enabled flag
#[derive(Debug)]
pub struct StaticExtension {
    handle: String,
    edition: Edition,
    enabled: AtomicBool,
    configs: Vec<ConfigDescriptorFactory>,
}

impl StaticExtension {
    pub fn new(handle: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            edition: Edition::Standard,
            enabled: AtomicBool::new(true),
            configs: Vec::new(),
        }
    }

    pub fn with_edition(mut self, edition: Edition) -> Self {
        self.edition = edition;
        self
    }

    pub fn with_enabled(self, enabled: bool) -> Self {
        self.set_enabled(enabled);
        self
    }

    pub fn with_config(mut self, factory: ConfigDescriptorFactory) -> Self {
        self.configs.push(factory);
        self
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }
}

impl ExtensionProvider for StaticExtension {
    fn handle(&self) -> &str {
        &self.handle
    }

    fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    fn edition(&self) -> Edition {
        self.edition
    }

    fn contributed_configs(&self) -> Vec<ConfigDescriptorFactory> {
        self.configs.clone()
    }
}

/// Host over an in-memory list of extensions
#[derive(Default)]
pub struct StaticHost {
    extensions: Vec<Arc<dyn ExtensionProvider>>,
}

impl StaticHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extension(mut self, extension: Arc<dyn ExtensionProvider>) -> Self {
        self.extensions.push(extension);
        self
    }

    pub fn push(&mut self, extension: Arc<dyn ExtensionProvider>) {
        self.extensions.push(extension);
    }
}

impl ExtensionHost for StaticHost {
    fn extensions(&self) -> Result<Vec<Arc<dyn ExtensionProvider>>> {
        Ok(self.extensions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_extension_toggle() {
        let ext = StaticExtension::new("forms-suite").with_edition(Edition::Pro);
        assert!(ext.is_enabled());
        assert_eq!(ext.edition(), Edition::Pro);

        ext.set_enabled(false);
        assert!(!ext.is_enabled());
    }

    #[test]
    fn test_host_lookup_by_handle() {
        let host = StaticHost::new()
            .with_extension(Arc::new(StaticExtension::new("seo-suite")))
            .with_extension(Arc::new(StaticExtension::new("forms-suite")));

        let found = host.extension("forms-suite").unwrap();
        assert_eq!(found.map(|e| e.handle().to_string()), Some("forms-suite".to_string()));
        assert!(host.extension("missing").unwrap().is_none());
    }
}
