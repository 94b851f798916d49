//! Shared types: editions, loading contexts, load states and errors

mod errors;

pub use errors::{RegistryError, Result};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Feature tier of a configuration module or extension
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    #[default]
    Standard,
    Pro,
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edition::Standard => write!(f, "standard"),
            Edition::Pro => write!(f, "pro"),
        }
    }
}

impl FromStr for Edition {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "standard" => Ok(Edition::Standard),
            "pro" => Ok(Edition::Pro),
            other => Err(RegistryError::ConfigError(format!(
                "Unknown edition '{}'",
                other
            ))),
        }
    }
}

/// Which layers a settings read includes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Context {
    /// Defaults, file overrides and persisted values
    #[default]
    Full,
    /// Defaults and persisted values only
    SettingsOnly,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
}
