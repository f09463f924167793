//! Plugin system for plugbot
//! 
//! Plugins are files in the plugin directory: YAML manifests binding commands to
//! named handlers, or shared libraries exporting a descriptor. The loader turns
//! them into a registry snapshot; the watcher reloads it when the directory changes.

pub mod builtin;
pub mod dylib;
pub mod loader;
pub mod manifest;
pub mod registry;
pub mod watcher;

pub use builtin::HandlerTable;
pub use dylib::DylibImporter;
pub use loader::{PluginLoader, UnitImporter};
pub use manifest::{ManifestImporter, PluginManifest};
pub use registry::{PluginRegistry, RegistrySnapshot};
pub use watcher::{PluginWatcher, WatchHandle};

/// Loader with the manifest and shared-library importers registered
pub fn default_loader(
    plugin_dir: impl Into<std::path::PathBuf>,
    registry: std::sync::Arc<PluginRegistry>,
    handlers: HandlerTable,
) -> PluginLoader {
    PluginLoader::new(plugin_dir, registry)
        .with_importer(ManifestImporter::new(handlers))
        .with_importer(DylibImporter::new())
}
