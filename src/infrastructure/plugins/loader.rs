//! Plugin loader - Scans the plugin directory and rebuilds the registry

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::errors::{PluginError, PluginResult};
use crate::domain::entities::{PluginDescriptor, PluginUnit};
use super::registry::{PluginRegistry, RegistrySnapshot};

/// Turns one plugin source file into a descriptor
pub trait UnitImporter: Send + Sync {
    /// File extensions (without the dot) this importer handles
    fn extensions(&self) -> &[&'static str];

    /// Import the unit at `path`. Validation is left to the loader.
    fn import(&self, path: &Path) -> PluginResult<PluginDescriptor>;
}

/// Plugin loader
#[derive(Clone)]
pub struct PluginLoader {
    plugin_dir: PathBuf,
    importers: Vec<Arc<dyn UnitImporter>>,
    registry: Arc<PluginRegistry>,
}

impl PluginLoader {
    pub fn new(plugin_dir: impl Into<PathBuf>, registry: Arc<PluginRegistry>) -> Self {
        Self {
            plugin_dir: plugin_dir.into(),
            importers: Vec::new(),
            registry,
        }
    }

    /// Register an importer; earlier importers win on extension clashes
    pub fn with_importer<I: UnitImporter + 'static>(mut self, importer: I) -> Self {
        self.importers.push(Arc::new(importer));
        self
    }

    pub fn plugin_dir(&self) -> &Path {
        &self.plugin_dir
    }

    pub fn registry(&self) -> &Arc<PluginRegistry> {
        &self.registry
    }

    /// Whether `path` has an extension some importer can load
    pub fn is_plugin_source(&self, path: &Path) -> bool {
        self.importer_for(path).is_some()
    }

    fn importer_for(&self, path: &Path) -> Option<&Arc<dyn UnitImporter>> {
        let ext = path.extension()?.to_str()?;
        self.importers
            .iter()
            .find(|importer| importer.extensions().iter().any(|e| *e == ext))
    }

    /// Load every eligible unit and swap it in as the active registry.
    ///
    /// A missing or unreadable directory is logged and yields an empty
    /// snapshot; the active registry is left as it was.
    pub fn load(&self) -> RegistrySnapshot {
        match self.try_load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("{}", e);
                Arc::new(Vec::new())
            }
        }
    }

    /// `load` on the blocking pool, for callers inside the async runtime.
    /// Importing may read files and map shared libraries.
    pub async fn load_blocking(&self) -> RegistrySnapshot {
        let loader = self.clone();
        match tokio::task::spawn_blocking(move || loader.load()).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::error!("Plugin load task failed: {}", e);
                Arc::new(Vec::new())
            }
        }
    }

    /// Like `load`, but reports directory-level failures to the caller
    pub fn try_load(&self) -> PluginResult<RegistrySnapshot> {
        let units = self.scan()?;
        self.registry.replace(units);
        let snapshot = self.registry.snapshot();
        tracing::info!(
            "Loaded {} plugin(s) from {}",
            snapshot.len(),
            self.plugin_dir.display()
        );
        Ok(snapshot)
    }

    /// Import and validate all units without touching the registry
    pub fn scan(&self) -> PluginResult<Vec<PluginUnit>> {
        if !self.plugin_dir.is_dir() {
            return Err(PluginError::DirectoryNotFound(self.plugin_dir.clone()));
        }

        let mut paths = Vec::new();
        for entry in std::fs::read_dir(&self.plugin_dir)
            .map_err(|e| PluginError::Load(format!("Failed to read plugin directory: {}", e)))?
        {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !path.is_file() {
                continue;
            }

            // Skip hidden files and editor swap files
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                if name.starts_with('.') {
                    continue;
                }
            }

            if self.is_plugin_source(&path) {
                paths.push(path);
            }
        }
        paths.sort();

        let mut units = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(unit) = self.load_unit(&path) {
                units.push(unit);
            }
        }
        Ok(units)
    }

    /// Import and validate one file. Failures stay with this file.
    fn load_unit(&self, path: &Path) -> Option<PluginUnit> {
        let origin = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let importer = self.importer_for(path)?;

        let descriptor = match importer.import(path) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                tracing::error!("Failed to load plugin {}: {}", origin, e);
                return None;
            }
        };

        match descriptor.validate(origin.as_str()) {
            Ok(unit) => {
                tracing::info!("Plugin loaded: {} {:?}", origin, unit.commands());
                Some(unit)
            }
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        }
    }
}
