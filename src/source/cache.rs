//! Module cache
//!
//! Append-only, in-memory store of loaded modules shared by every task of a
//! run. Entries are never replaced or invalidated once inserted.

use crate::source::{Module, ModuleLocator};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone, Default)]
pub struct ModuleCache {
    entries: Arc<RwLock<HashMap<ModuleLocator, Arc<Module>>>>,
}

impl ModuleCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a previously loaded module
    pub async fn get(&self, locator: &ModuleLocator) -> Option<Arc<Module>> {
        let entries = self.entries.read().await;
        let hit = entries.get(locator).cloned();
        if hit.is_some() {
            tracing::debug!("Cache hit for module {}", locator);
        }
        hit
    }

    /// Store a module, keeping the first copy if another task won the race
    pub async fn insert(&self, module: Arc<Module>) -> Arc<Module> {
        let mut entries = self.entries.write().await;
        entries
            .entry(module.locator.clone())
            .or_insert(module)
            .clone()
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    #[cfg(test)]
    pub(crate) async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
