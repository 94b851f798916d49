//! Confreg - configuration registry for extension-contributed modules
//!
//! Extensions installed in a host contribute configuration modules. This
//! crate discovers the modules of enabled extensions, merges their default,
//! file-override and persisted settings, resolves each module's edition, and
//! derives navigation and settings pages for the enabled ones. It also runs
//! install/uninstall lifecycles without tearing down settings another
//! extension still owns.

pub mod config;
pub mod descriptor;
pub mod edition;
pub mod extension;
pub mod installer;
pub mod merger;
pub mod registry;
pub mod settings;
pub mod store;
pub mod types;

pub use config::{FileOverrides, HostManifest, ModuleCatalog, ModuleSpec};
pub use descriptor::{ConfigDescriptor, ConfigDescriptorFactory, Configs, NavItem, PageItem};
pub use edition::{EditionRelation, EditionResolver};
pub use extension::{ExtensionHost, ExtensionProvider, StaticExtension, StaticHost};
pub use installer::{
    InstallOutcome, InstallReport, LedgerMigration, Migration, MigrationContext, ModuleOutcome,
};
pub use merger::SettingsMerger;
pub use registry::{ConfigurationRegistry, RegistryOptions};
pub use settings::{ControlPanelSettings, SettingsModel};
pub use store::{JsonFileStore, MemoryStore, SettingsStore};
pub use types::{Context, Edition, RegistryError};
