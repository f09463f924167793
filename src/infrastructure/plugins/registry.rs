//! Plugin registry - Holds the current snapshot of loaded plugin units

use std::sync::{Arc, RwLock};
use crate::domain::entities::PluginUnit;

/// Immutable, ordered set of plugin units as of one load
pub type RegistrySnapshot = Arc<Vec<PluginUnit>>;

/// Registry of loaded plugins.
///
/// Readers take a snapshot; loads swap the whole snapshot. Units are never
/// modified in place, so a reader always sees one complete load.
pub struct PluginRegistry {
    current: RwLock<RegistrySnapshot>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(Vec::new())),
        }
    }

    /// Current snapshot
    pub fn snapshot(&self) -> RegistrySnapshot {
        match self.current.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Atomically replace the active units, returning the previous snapshot
    pub fn replace(&self, units: Vec<PluginUnit>) -> RegistrySnapshot {
        let next = Arc::new(units);
        let mut guard = match self.current.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        std::mem::replace(&mut *guard, next)
    }

    /// All accepted command names, in registry order
    pub fn commands(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .flat_map(|unit| unit.commands().iter().cloned())
            .collect()
    }

    /// Get the number of loaded plugin units
    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    /// Check if no plugins are loaded
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PluginRegistry {
    fn default() -> Self {
        Self::new()
    }
}
