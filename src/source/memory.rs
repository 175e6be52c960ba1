//! In-memory module source for tests and embedding

use crate::source::{Module, ModuleLocator, ModuleSource};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Module source serving documents registered up front
#[derive(Debug, Clone, Default)]
pub struct MemoryModuleSource {
    modules: HashMap<ModuleLocator, Value>,
    delay: Option<Duration>,
}

impl MemoryModuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module at an absolute file path
    pub fn with_module(mut self, path: impl Into<PathBuf>, document: Value) -> Self {
        self.modules
            .insert(ModuleLocator::File(path.into()), document);
        self
    }

    /// Delay every load, to exercise load timeouts
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl ModuleSource for MemoryModuleSource {
    async fn load(&self, locator: &ModuleLocator) -> Result<Arc<Module>> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let document = self.modules.get(locator).ok_or_else(|| Error::ModuleLoad {
            locator: locator.to_string(),
            message: "module not found".to_string(),
        })?;

        Ok(Arc::new(Module::from_value(locator.clone(), document.clone())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemoryModuleSource::new().with_module("/m/a.schema.json", json!({ "s": {} }));

        let module = source
            .load(&ModuleLocator::File("/m/a.schema.json".into()))
            .await
            .unwrap();
        assert_eq!(module.exports.len(), 1);

        let missing = source.load(&ModuleLocator::File("/m/b.json".into())).await;
        assert!(matches!(missing, Err(Error::ModuleLoad { .. })));
    }
}
