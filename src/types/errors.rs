use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Configuration module not found: {0}")]
    NotFound(String),

    #[error("Extension not found: {0}")]
    ExtensionNotFound(String),

    #[error("Migration failed for '{key}': {message}")]
    Migration { key: String, message: String },

    #[error("Settings store error: {0}")]
    Store(String),

    #[error("Invalid file path: {0}")]
    InvalidPath(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl RegistryError {
    /// Wrap a failure raised while a migration ran. Store errors keep their kind.
    pub(crate) fn into_migration(self, key: &str) -> Self {
        match self {
            err @ (RegistryError::Migration { .. } | RegistryError::Store(_)) => err,
            other => RegistryError::Migration {
                key: key.to_string(),
                message: other.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, RegistryError>;
