//! Shared-library plugins loaded with `libloading`
//!
//! A plugin library exports `plugbot_plugin_init`, returning a boxed
//! `PluginDescriptor`. Use `declare_plugin!` to generate it. The library must be
//! built with the same compiler and `plugbot` version as the host.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::{Library, Symbol};

use crate::application::errors::{PluginError, PluginResult};
use crate::domain::entities::PluginDescriptor;
use super::loader::UnitImporter;

/// Symbol every plugin library must export
pub const INIT_SYMBOL: &[u8] = b"plugbot_plugin_init";

/// Function signature for plugin initialization
#[allow(improper_ctypes_definitions)]
pub type PluginInitFn = unsafe extern "C" fn() -> *mut PluginDescriptor;

/// Export a descriptor constructor as the plugin entry point.
///
/// ```ignore
/// fn plugin() -> PluginDescriptor {
///     PluginDescriptor::new(vec!["hello".into()], Arc::new(Hello))
/// }
/// plugbot::declare_plugin!(plugin);
/// ```
#[macro_export]
macro_rules! declare_plugin {
    ($constructor:path) => {
        #[no_mangle]
        #[allow(improper_ctypes_definitions)]
        pub extern "C" fn plugbot_plugin_init() -> *mut $crate::domain::entities::PluginDescriptor {
            let descriptor: $crate::domain::entities::PluginDescriptor = $constructor();
            ::std::boxed::Box::into_raw(::std::boxed::Box::new(descriptor))
        }
    };
}

/// Imports `.so`, `.dylib` and `.dll` plugins
pub struct DylibImporter {
    shadow_dir: PathBuf,
}

impl DylibImporter {
    pub fn new() -> Self {
        Self {
            shadow_dir: std::env::temp_dir().join("plugbot-shadow"),
        }
    }

    /// Copy the library under a unique name.
    ///
    /// The dynamic loader caches libraries by path, so loading the original path
    /// again after a rebuild would hand back the stale mapping.
    fn shadow_copy(&self, path: &Path) -> PluginResult<PathBuf> {
        std::fs::create_dir_all(&self.shadow_dir)
            .map_err(|e| PluginError::Load(format!("Failed to create shadow directory: {}", e)))?;

        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("plugin");
        let ext = path.extension().and_then(|s| s.to_str()).unwrap_or_default();
        let shadow = self
            .shadow_dir
            .join(format!("{}-{}.{}", stem, uuid::Uuid::new_v4().simple(), ext));

        std::fs::copy(path, &shadow)
            .map_err(|e| PluginError::Load(format!("Failed to copy {}: {}", path.display(), e)))?;
        Ok(shadow)
    }
}

impl Default for DylibImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl UnitImporter for DylibImporter {
    fn extensions(&self) -> &[&'static str] {
        &["so", "dylib", "dll"]
    }

    fn import(&self, path: &Path) -> PluginResult<PluginDescriptor> {
        let origin = path.display().to_string();
        let shadow = self.shadow_copy(path)?;

        let library = unsafe { Library::new(&shadow) };
        if let Err(e) = std::fs::remove_file(&shadow) {
            // Windows refuses while the library is mapped
            tracing::debug!("Shadow copy {} not removed: {}", shadow.display(), e);
        }
        let library = library.map_err(|e| PluginError::Import {
            origin: origin.clone(),
            reason: format!("Failed to load library: {}", e),
        })?;

        let mut descriptor = unsafe {
            let init: Symbol<PluginInitFn> = library.get(INIT_SYMBOL).map_err(|e| PluginError::Import {
                origin: origin.clone(),
                reason: format!("Failed to find init function: {}", e),
            })?;

            let ptr = init();
            if ptr.is_null() {
                return Err(PluginError::Import {
                    origin,
                    reason: "Plugin init returned null".to_string(),
                });
            }
            *Box::from_raw(ptr)
        };

        descriptor.library = Some(Arc::new(library));
        Ok(descriptor)
    }
}
