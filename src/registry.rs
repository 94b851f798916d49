//! Configuration registry
//!
//! Discovers the configuration modules contributed by enabled extensions,
//! resolves their edition and settings, and caches the result per loading
//! context.
//!
//! The registry is single-threaded. A module's settings hook may call back
//! into the registry while a rebuild is running; such calls are served the
//! last complete snapshot instead of starting a nested rebuild.

use crate::config::{control_panel_module, FileOverrides, CONTROL_PANEL_KEY};
use crate::descriptor::{ConfigDescriptor, ConfigDescriptorFactory, Configs, NavItem, PageItem};
use crate::edition::{EditionRelation, EditionResolver};
use crate::extension::ExtensionHost;
use crate::merger::SettingsMerger;
use crate::settings::{ControlPanelSettings, SettingsModel};
use crate::store::SettingsStore;
use crate::types::{Context, Edition, LoadState, RegistryError, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// URL and icon roots for derived navigation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryOptions {
    pub settings_root: String,
    pub icon_root: String,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            settings_root: "confreg/settings".to_string(),
            icon_root: "@confreg/icons".to_string(),
        }
    }
}

pub struct ConfigurationRegistry {
    host: Arc<dyn ExtensionHost>,
    pub(crate) store: Arc<dyn SettingsStore>,
    pub(crate) merger: SettingsMerger,
    options: RegistryOptions,
    control_panel: ConfigDescriptorFactory,

    /// Last complete set of descriptors
    configs: RefCell<Arc<Configs>>,
    load_state: Cell<LoadState>,
    last_context: Cell<Option<Context>>,
    rebuilds: Cell<u64>,

    cp_settings: RefCell<Option<Arc<ControlPanelSettings>>>,
    cp_load_state: Cell<LoadState>,
}

impl ConfigurationRegistry {
    pub fn new(host: Arc<dyn ExtensionHost>, store: Arc<dyn SettingsStore>) -> Self {
        Self {
            host,
            merger: SettingsMerger::new(Arc::clone(&store)),
            store,
            options: RegistryOptions::default(),
            control_panel: ConfigDescriptorFactory::new(control_panel_module()),
            configs: RefCell::new(Arc::new(Configs::new())),
            load_state: Cell::new(LoadState::NotLoaded),
            last_context: Cell::new(None),
            rebuilds: Cell::new(0),
            cp_settings: RefCell::new(None),
            cp_load_state: Cell::new(LoadState::NotLoaded),
        }
    }

    pub fn with_overrides(mut self, overrides: FileOverrides) -> Self {
        self.merger = self.merger.with_overrides(overrides);
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.merger = self.merger.with_namespace(namespace);
        self
    }

    pub fn with_options(mut self, options: RegistryOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the built-in control-panel module
    pub fn with_control_panel(mut self, factory: ConfigDescriptorFactory) -> Self {
        self.control_panel = factory;
        self
    }

    pub fn host(&self) -> &dyn ExtensionHost {
        self.host.as_ref()
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.options
    }

    /// Number of completed rebuilds since construction
    pub fn rebuild_count(&self) -> u64 {
        self.rebuilds.get()
    }

    #[cfg(test)]
    pub(crate) fn load_state(&self) -> LoadState {
        self.load_state.get()
    }

    /// All modules contributed by enabled extensions, resolved for `context`
    pub fn configs(&self, context: Context) -> Result<Arc<Configs>> {
        if self.load_state.get() == LoadState::Loading {
            debug!("Configuration rebuild in progress, serving last snapshot");
            return Ok(self.snapshot());
        }

        self.prepare_context(context);

        if self.load_state.get() == LoadState::Loaded {
            return Ok(self.snapshot());
        }

        self.load_state.set(LoadState::Loading);
        self.last_context.set(Some(context));

        match self.rebuild(context) {
            Ok(configs) => {
                *self.configs.borrow_mut() = Arc::new(configs);
                self.load_state.set(LoadState::Loaded);
                Ok(self.snapshot())
            }
            Err(e) => {
                warn!("Configuration rebuild failed: {}", e);
                self.load_state.set(LoadState::NotLoaded);
                Err(e)
            }
        }
    }

    pub fn config_by_key(&self, key: &str, context: Context) -> Result<ConfigDescriptor> {
        self.configs(context)?
            .get(key)
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(key.to_string()))
    }

    /// Drop both caches; the next read rebuilds
    pub fn invalidate(&self) {
        if self.load_state.get() == LoadState::Loading {
            debug!("Ignoring invalidation during rebuild");
        } else {
            self.load_state.set(LoadState::NotLoaded);
        }

        if self.cp_load_state.get() != LoadState::Loading {
            self.cp_load_state.set(LoadState::NotLoaded);
            *self.cp_settings.borrow_mut() = None;
        }
    }

    fn snapshot(&self) -> Arc<Configs> {
        Arc::clone(&self.configs.borrow())
    }

    fn prepare_context(&self, context: Context) {
        if self.last_context.get() != Some(context) && self.load_state.get() == LoadState::Loaded {
            debug!("Loading context changed to {:?}, invalidating cache", context);
            self.load_state.set(LoadState::NotLoaded);
        }
    }

    fn rebuild(&self, context: Context) -> Result<Configs> {
        let cp_settings = self.control_panel_settings()?;
        let resolver = EditionResolver::new(self.host.as_ref());
        let mut configs = Configs::new();

        for extension in self.host.extensions()? {
            if !extension.is_enabled() {
                debug!("Skipping disabled extension '{}'", extension.handle());
                continue;
            }

            for factory in extension.contributed_configs() {
                if configs.contains_key(factory.key()) {
                    debug!(
                        "Module '{}' already registered, ignoring contribution from '{}'",
                        factory.key(),
                        extension.handle()
                    );
                    continue;
                }

                let descriptor =
                    self.resolve_descriptor(&factory, &cp_settings, &resolver, context)?;
                configs.insert(descriptor.key.clone(), descriptor);
            }
        }

        self.rebuilds.set(self.rebuilds.get() + 1);
        info!(
            "Resolved {} configuration modules ({:?})",
            configs.len(),
            context
        );

        Ok(configs)
    }

    fn resolve_descriptor(
        &self,
        factory: &ConfigDescriptorFactory,
        cp_settings: &ControlPanelSettings,
        resolver: &EditionResolver<'_>,
        context: Context,
    ) -> Result<ConfigDescriptor> {
        let key = factory.key();
        let mut descriptor = factory.build();
        descriptor.edition = resolver.resolve(factory)?;

        let mut settings = self.merger.merge(factory, context)?;
        if settings.alternate_name.is_none() {
            settings.alternate_name = cp_settings.alternate_name_for(key).map(str::to_string);
        }

        let settings = self.apply_settings_hook(factory, settings)?;

        debug!(
            "Resolved module '{}' (edition: {}, enabled: {})",
            key, descriptor.edition, settings.enabled
        );
        descriptor.settings = Some(settings);

        Ok(descriptor)
    }

    /// Run the factory's settings hook on a copy of `settings`. Store errors
    /// propagate; any other hook failure keeps the merged settings.
    fn apply_settings_hook(
        &self,
        factory: &ConfigDescriptorFactory,
        settings: SettingsModel,
    ) -> Result<SettingsModel> {
        let Some(hook) = factory.settings_hook() else {
            return Ok(settings);
        };

        let mut candidate = settings.clone();
        match hook(&mut candidate, self) {
            Ok(()) => Ok(candidate),
            Err(err @ RegistryError::Store(_)) => Err(err),
            Err(e) => {
                warn!(
                    "Settings hook for '{}' failed, keeping merged settings: {}",
                    factory.key(),
                    e
                );
                Ok(settings)
            }
        }
    }

    /// The control-panel singleton, merged from persisted values only.
    ///
    /// Reads made while it is loading, for example from the control panel's
    /// own settings hook, get its defaults.
    pub fn control_panel_settings(&self) -> Result<Arc<ControlPanelSettings>> {
        match self.cp_load_state.get() {
            LoadState::Loaded => {
                if let Some(cp) = self.cp_settings.borrow().as_ref() {
                    return Ok(Arc::clone(cp));
                }
            }
            LoadState::Loading => {
                debug!("Control panel settings are loading, serving defaults");
                return Ok(Arc::new(ControlPanelSettings::from_settings(
                    self.control_panel.create_settings_model(),
                )));
            }
            LoadState::NotLoaded => {}
        }

        self.cp_load_state.set(LoadState::Loading);

        let merged = self
            .merger
            .merge(&self.control_panel, Context::SettingsOnly)
            .and_then(|settings| self.apply_settings_hook(&self.control_panel, settings));

        match merged {
            Ok(settings) => {
                let cp = Arc::new(ControlPanelSettings::from_settings(settings));
                *self.cp_settings.borrow_mut() = Some(Arc::clone(&cp));
                self.cp_load_state.set(LoadState::Loaded);
                Ok(cp)
            }
            Err(e) => {
                self.cp_load_state.set(LoadState::NotLoaded);
                Err(e)
            }
        }
    }

    /// Primary navigation for every enabled module that declares a nav item
    pub fn build_navigation_items(&self) -> Result<Vec<NavItem>> {
        let configs = self.configs(Context::SettingsOnly)?;

        let items = configs
            .values()
            .filter(|config| config.is_enabled())
            .filter_map(|config| {
                let nav = config.nav_item.as_ref()?;
                let label = match config.name() {
                    "" => nav.label.clone(),
                    name => name.to_string(),
                };

                Some(NavItem {
                    label,
                    url: nav.url.clone(),
                    icon: self.icon_path(&config.key, "icon-mask.svg"),
                    subnav: nav.subnav.clone(),
                })
            })
            .collect();

        Ok(items)
    }

    /// Settings pages, the control panel first
    pub fn build_settings_page_list(&self) -> Result<Vec<PageItem>> {
        let configs = self.configs(Context::SettingsOnly)?;
        let cp_spec = self.control_panel.spec();

        let mut pages = vec![PageItem {
            label: cp_spec.display_name.clone(),
            url: self.settings_url(&cp_spec.key),
            icon: self.icon_path(&cp_spec.key, "icon.svg"),
        }];

        for config in configs.values() {
            if config.key == CONTROL_PANEL_KEY
                || !config.is_enabled()
                || config.settings_nav_item.is_none()
            {
                continue;
            }

            pages.push(PageItem {
                label: config.name().to_string(),
                url: self.settings_url(&config.key),
                icon: self.icon_path(&config.key, "icon.svg"),
            });
        }

        Ok(pages)
    }

    /// Replace the host's per-extension nav entries with the registry's items
    pub fn merge_host_navigation(
        &self,
        host_items: Vec<NavItem>,
        registry_items: Vec<NavItem>,
    ) -> Result<Vec<NavItem>> {
        let handles: HashSet<String> = self
            .host
            .extensions()?
            .iter()
            .map(|ext| ext.handle().to_string())
            .collect();

        let mut items: Vec<NavItem> = host_items
            .into_iter()
            .filter(|item| !handles.contains(&item.url))
            .collect();
        items.extend(registry_items);

        Ok(items)
    }

    /// True if an enabled extension other than `handle` contributes to `group`
    pub fn is_dependency_in_use(&self, handle: &str, group: &str) -> Result<bool> {
        for extension in self.host.extensions()? {
            if extension.handle() == handle || !extension.is_enabled() {
                continue;
            }

            let in_use = extension
                .contributed_configs()
                .iter()
                .any(|factory| factory.dependency_group() == group);

            if in_use {
                debug!(
                    "Dependency group '{}' still in use by '{}'",
                    group,
                    extension.handle()
                );
                return Ok(true);
            }
        }

        Ok(false)
    }

    pub fn edition_of(&self, key: &str) -> Result<Edition> {
        Ok(self.config_by_key(key, Context::Full)?.edition)
    }

    /// Whether module `key` resolved to `edition`; false for unknown modules
    pub fn is_edition(&self, key: &str, edition: Edition) -> Result<bool> {
        match self.edition_of(key) {
            Ok(current) => Ok(current == edition),
            Err(RegistryError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether extension `handle` is enabled at `edition` or above
    pub fn is_extension_edition(&self, handle: &str, edition: Edition) -> Result<bool> {
        EditionRelation::new(handle, edition).is_satisfied_by(self.host.as_ref())
    }

    fn settings_url(&self, key: &str) -> String {
        format!("{}/{}", self.options.settings_root, key)
    }

    fn icon_path(&self, key: &str, file: &str) -> String {
        format!("{}/{}/{}", self.options.icon_root, key, file)
    }
}
