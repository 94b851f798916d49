//! Install and uninstall lifecycle
//!
//! Runs each contributed module's migration and seeds or removes its
//! persisted settings. Uninstall skips any module whose dependency group is
//! still contributed by another enabled extension.

use crate::extension::ExtensionProvider;
use crate::registry::ConfigurationRegistry;
use crate::store::SettingsStore;
use crate::types::{RegistryError, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use tracing::{debug, info, trace};

/// Install migration of a configuration module. Both directions must be idempotent.
pub trait Migration {
    fn install_up(&self, ctx: &mut MigrationContext<'_>) -> Result<()>;

    fn install_down(&self, ctx: &mut MigrationContext<'_>) -> Result<()>;
}

/// What a migration may touch while it runs
pub struct MigrationContext<'a> {
    pub key: &'a str,
    pub namespace: &'a str,
    pub store: &'a dyn SettingsStore,
    /// Diagnostic output; captured and never shown to the caller
    pub output: &'a mut dyn Write,
}

/// Schema ledger entry written by [`LedgerMigration`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaRecord {
    pub tables: Vec<String>,
    pub installed_at: String,
}

/// Records a module's tables under `<namespace>._schema.<key>`
#[derive(Debug, Clone)]
pub struct LedgerMigration {
    tables: Vec<String>,
}

impl LedgerMigration {
    pub fn new(tables: Vec<String>) -> Self {
        Self { tables }
    }

    pub fn ledger_path(namespace: &str, key: &str) -> String {
        format!("{}._schema.{}", namespace, key)
    }
}

impl Migration for LedgerMigration {
    fn install_up(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        let path = Self::ledger_path(ctx.namespace, ctx.key);

        if ctx.store.get(&path)?.is_some() {
            writeln!(ctx.output, "schema for {} already installed", ctx.key)?;
            return Ok(());
        }

        for table in &self.tables {
            writeln!(ctx.output, "create table {}", table)?;
        }

        let record = SchemaRecord {
            tables: self.tables.clone(),
            installed_at: chrono::Utc::now().to_rfc3339(),
        };
        ctx.store.set(
            &path,
            serde_json::to_value(record)?,
            &format!("Installed schema for “{}”", ctx.key),
        )
    }

    fn install_down(&self, ctx: &mut MigrationContext<'_>) -> Result<()> {
        let path = Self::ledger_path(ctx.namespace, ctx.key);

        if ctx.store.get(&path)?.is_none() {
            writeln!(ctx.output, "schema for {} not installed", ctx.key)?;
            return Ok(());
        }

        for table in self.tables.iter().rev() {
            writeln!(ctx.output, "drop table {}", table)?;
        }

        ctx.store.remove(&path)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallOutcome {
    Installed,
    Removed,
    SkippedInUse,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleOutcome {
    pub key: String,
    pub outcome: InstallOutcome,
}

/// Per-module result of an install or uninstall run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InstallReport {
    pub extension: String,
    pub modules: Vec<ModuleOutcome>,
}

impl InstallReport {
    fn new(extension: &str) -> Self {
        Self {
            extension: extension.to_string(),
            modules: Vec::new(),
        }
    }

    fn record(&mut self, key: &str, outcome: InstallOutcome) {
        self.modules.push(ModuleOutcome {
            key: key.to_string(),
            outcome,
        });
    }

    pub fn outcome(&self, key: &str) -> Option<InstallOutcome> {
        self.modules
            .iter()
            .find(|m| m.key == key)
            .map(|m| m.outcome)
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Up,
    Down,
}

impl ConfigurationRegistry {
    /// Install every module `extension` contributes.
    ///
    /// A failing migration aborts the run; modules already installed stay
    /// installed. The cache is invalidated either way.
    pub fn run_install(&self, extension: &dyn ExtensionProvider) -> Result<InstallReport> {
        info!("Installing configuration modules for {}", extension.handle());

        let result = self.install_modules(extension);
        self.invalidate();

        let report = result?;
        info!(
            "Installed {} modules for {}",
            report.modules.len(),
            extension.handle()
        );

        Ok(report)
    }

    /// Uninstall the modules `extension` contributes that no other enabled
    /// extension still depends on
    pub fn run_uninstall(&self, extension: &dyn ExtensionProvider) -> Result<InstallReport> {
        info!("Uninstalling configuration modules for {}", extension.handle());

        let result = self.uninstall_modules(extension);
        self.invalidate();

        result
    }

    fn install_modules(&self, extension: &dyn ExtensionProvider) -> Result<InstallReport> {
        let mut report = InstallReport::new(extension.handle());

        for factory in extension.contributed_configs() {
            let key = factory.key();

            if let Some(migration) = factory.create_install_migration() {
                self.run_migration(key, migration.as_ref(), Direction::Up)?;
            }

            let settings = factory.create_settings_model();
            self.store.set(
                &self.merger.settings_path(key),
                settings.to_value(),
                &format!("Added default settings for “{}”", key),
            )?;

            report.record(key, InstallOutcome::Installed);
        }

        Ok(report)
    }

    fn uninstall_modules(&self, extension: &dyn ExtensionProvider) -> Result<InstallReport> {
        let mut report = InstallReport::new(extension.handle());

        for factory in extension.contributed_configs() {
            let key = factory.key();

            if self.is_dependency_in_use(extension.handle(), factory.dependency_group())? {
                info!(
                    "Keeping '{}': dependency group '{}' is still in use",
                    key,
                    factory.dependency_group()
                );
                report.record(key, InstallOutcome::SkippedInUse);
                continue;
            }

            if let Some(migration) = factory.create_install_migration() {
                self.run_migration(key, migration.as_ref(), Direction::Down)?;
            }

            self.store.remove(&self.merger.settings_path(key))?;
            report.record(key, InstallOutcome::Removed);
        }

        Ok(report)
    }

    /// [`run_install`](Self::run_install) for the extension registered under `handle`
    pub fn install_extension(&self, handle: &str) -> Result<InstallReport> {
        let extension = self
            .host()
            .extension(handle)?
            .ok_or_else(|| RegistryError::ExtensionNotFound(handle.to_string()))?;
        self.run_install(extension.as_ref())
    }

    pub fn uninstall_extension(&self, handle: &str) -> Result<InstallReport> {
        let extension = self
            .host()
            .extension(handle)?
            .ok_or_else(|| RegistryError::ExtensionNotFound(handle.to_string()))?;
        self.run_uninstall(extension.as_ref())
    }

    fn run_migration(&self, key: &str, migration: &dyn Migration, direction: Direction) -> Result<()> {
        debug!("Running {:?} migration for '{}'", direction, key);

        let mut captured: Vec<u8> = Vec::new();
        let result = {
            let mut ctx = MigrationContext {
                key,
                namespace: self.merger.namespace(),
                store: self.store.as_ref(),
                output: &mut captured,
            };

            match direction {
                Direction::Up => migration.install_up(&mut ctx),
                Direction::Down => migration.install_down(&mut ctx),
            }
        };

        if !captured.is_empty() {
            trace!(
                "Suppressed migration output for '{}': {}",
                key,
                String::from_utf8_lossy(&captured).trim_end()
            );
        }

        result.map_err(|e| e.into_migration(key))
    }
}

/// The persisted schema record for `key`, if its migration has run
pub fn schema_record(
    store: &dyn SettingsStore,
    namespace: &str,
    key: &str,
) -> Result<Option<SchemaRecord>> {
    match store.get(&LedgerMigration::ledger_path(namespace, key))? {
        Some(value) => Ok(Some(serde_json::from_value::<SchemaRecord>(value)?)),
        None => Ok(None),
    }
}
