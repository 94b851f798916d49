//! Configuration module catalogue
//!
//! Provides a 3-tier module catalogue:
//! 1. Host modules (highest priority)
//! 2. Built-in defaults (medium priority)
//! 3. Embedded catalogue (lowest priority)

mod defaults;
mod loader;
mod registry;
mod user_config;

pub use defaults::{control_panel_module, get_default_modules, CONTROL_PANEL_KEY};
pub use loader::ModuleCatalog;
pub use registry::{MigrationSource, ModuleSpec, NavSpec, SubNavItem};
pub use user_config::{ExtensionEntry, FileOverrides, HostManifest};
