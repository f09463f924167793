//! Manifest plugins - YAML files binding commands to named handlers

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::application::errors::{PluginError, PluginResult};
use crate::domain::entities::PluginDescriptor;
use super::builtin::HandlerTable;
use super::loader::UnitImporter;

/// Plugin manifest as written on disk.
///
/// ```yaml
/// commands: [ping, test]
/// handler: ping
/// restrict-to-private-chat: false
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginManifest {
    pub commands: Option<Vec<String>>,

    /// Name of a handler in the `HandlerTable`
    pub handler: Option<String>,

    #[serde(default)]
    pub restrict_to_bot_self: bool,

    #[serde(default)]
    pub restrict_to_private_chat: bool,

    pub description: Option<String>,
}

impl PluginManifest {
    pub fn from_file(path: impl AsRef<Path>) -> PluginResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| PluginError::Load(format!("Failed to read manifest: {}", e)))?;

        serde_yaml::from_str(&content).map_err(|e| PluginError::Import {
            origin: path.display().to_string(),
            reason: format!("Failed to parse manifest: {}", e),
        })
    }
}

/// Imports `.yaml`/`.yml` manifests, resolving handlers by name
pub struct ManifestImporter {
    handlers: HandlerTable,
}

impl ManifestImporter {
    pub fn new(handlers: HandlerTable) -> Self {
        Self { handlers }
    }

    fn descriptor(&self, manifest: PluginManifest) -> PluginDescriptor {
        let handler = manifest.handler.as_deref().and_then(|name| {
            let found = self.handlers.get(name);
            if found.is_none() {
                tracing::debug!("Unknown handler '{}'", name);
            }
            found
        });

        PluginDescriptor {
            commands: manifest.commands,
            handler,
            restrict_to_bot_self: manifest.restrict_to_bot_self,
            restrict_to_private_chat: manifest.restrict_to_private_chat,
            ..Default::default()
        }
    }
}

impl UnitImporter for ManifestImporter {
    fn extensions(&self) -> &[&'static str] {
        &["yaml", "yml"]
    }

    fn import(&self, path: &Path) -> PluginResult<PluginDescriptor> {
        Ok(self.descriptor(PluginManifest::from_file(path)?))
    }
}
