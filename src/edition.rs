//! Edition resolution
//!
//! A module is Pro when any of its related extensions is enabled at or above
//! the relation's threshold. Resolution is an OR over the relations, so a
//! lower-tier extension can never demote a module another one elevated.

use crate::descriptor::ConfigDescriptorFactory;
use crate::extension::ExtensionHost;
use crate::types::{Edition, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// "Extension `extension` is enabled at `at_least` or above"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditionRelation {
    pub extension: String,
    #[serde(default)]
    pub at_least: Edition,
}

impl EditionRelation {
    pub fn new(extension: impl Into<String>, at_least: Edition) -> Self {
        Self {
            extension: extension.into(),
            at_least,
        }
    }

    pub fn is_satisfied_by(&self, host: &dyn ExtensionHost) -> Result<bool> {
        Ok(host
            .extension(&self.extension)?
            .is_some_and(|ext| ext.is_enabled() && ext.edition() >= self.at_least))
    }
}

pub struct EditionResolver<'a> {
    host: &'a dyn ExtensionHost,
}

impl<'a> EditionResolver<'a> {
    pub fn new(host: &'a dyn ExtensionHost) -> Self {
        Self { host }
    }

    pub fn resolve(&self, factory: &ConfigDescriptorFactory) -> Result<Edition> {
        let spec = factory.spec();

        for relation in &spec.edition_relations {
            if relation.is_satisfied_by(self.host)? {
                debug!(
                    "Module '{}' elevated to pro by '{}'",
                    spec.key, relation.extension
                );
                return Ok(Edition::Pro);
            }
        }

        Ok(spec.edition)
    }
}
