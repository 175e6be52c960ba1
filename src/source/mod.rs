//! Module source - Abstraction for loading declarative modules
//!
//! A module is a structured document whose top-level keys are its exported
//! bindings, kept in declaration order. Loading a module only parses it;
//! nothing in it is executed.

use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub mod cache;
pub mod file;
pub mod memory;

pub use cache::ModuleCache;
pub use file::FileModuleSource;
pub use memory::MemoryModuleSource;

/// Absolute address of a module
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleLocator {
    /// Absolute filesystem path
    File(PathBuf),

    /// Remote `http://` or `https://` address, passed through unchanged
    Url(String),
}

impl fmt::Display for ModuleLocator {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ModuleLocator::File(path) => write!(f, "{}", path.display()),
            ModuleLocator::Url(url) => write!(f, "{}", url),
        }
    }
}

/// Resolve a user-supplied path into a loader-addressable locator.
///
/// `file://` URLs and absolute paths pass through, `http(s)://` URLs are
/// kept as URLs, relative paths are resolved against the current directory.
pub fn resolve_locator(path: &str) -> Result<ModuleLocator> {
    if let Some(local) = path.strip_prefix("file://") {
        return Ok(ModuleLocator::File(PathBuf::from(local)));
    }
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(ModuleLocator::Url(path.to_string()));
    }

    let candidate = Path::new(path);
    if candidate.is_absolute() {
        Ok(ModuleLocator::File(candidate.to_path_buf()))
    } else {
        Ok(ModuleLocator::File(std::env::current_dir()?.join(candidate)))
    }
}

/// A loaded module and its exports
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    pub locator: ModuleLocator,

    /// Exported bindings in declaration order
    pub exports: Vec<(String, Value)>,
}

impl Module {
    /// Build a module from a parsed document; the root must be an object
    pub fn from_value(locator: ModuleLocator, value: Value) -> Result<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                locator,
                exports: map.into_iter().collect(),
            }),
            other => Err(Error::ModuleFormat {
                file: PathBuf::from(locator.to_string()),
                message: format!(
                    "module root must be a table of exports, found {}",
                    value_kind(&other)
                ),
            }),
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Module source trait for loading declarative modules
///
/// Implementations provide different hosts for module content:
/// - `FileModuleSource`: Reads JSON/TOML files from disk
/// - `MemoryModuleSource`: Serves in-memory documents
#[async_trait]
pub trait ModuleSource: Send + Sync {
    /// Load the module at `locator`
    async fn load(&self, locator: &ModuleLocator) -> Result<Arc<Module>>;
}

/// Create the default module source: files on disk behind a run-wide cache
pub fn create_module_source() -> Arc<dyn ModuleSource> {
    Arc::new(FileModuleSource::new().with_cache(ModuleCache::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_absolute_and_urls() {
        assert_eq!(
            resolve_locator("/srv/app/cart.machine.json").unwrap(),
            ModuleLocator::File(PathBuf::from("/srv/app/cart.machine.json"))
        );
        assert_eq!(
            resolve_locator("file:///srv/app/a.schema.toml").unwrap(),
            ModuleLocator::File(PathBuf::from("/srv/app/a.schema.toml"))
        );
        assert_eq!(
            resolve_locator("https://example.com/a.schema.json").unwrap(),
            ModuleLocator::Url("https://example.com/a.schema.json".to_string())
        );
    }

    #[test]
    fn test_resolve_relative_against_cwd() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(
            resolve_locator("schemas/a.schema.json").unwrap(),
            ModuleLocator::File(cwd.join("schemas/a.schema.json"))
        );
    }

    #[test]
    fn test_module_keeps_declaration_order() {
        let value = json!({ "zeta": {}, "alpha": {}, "mid": 1 });
        let module = Module::from_value(ModuleLocator::Url("mem".into()), value).unwrap();
        let names: Vec<&str> = module.exports.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_module_root_must_be_object() {
        let result = Module::from_value(ModuleLocator::Url("mem".into()), json!([1, 2]));
        assert!(matches!(result, Err(Error::ModuleFormat { .. })));
    }
}
