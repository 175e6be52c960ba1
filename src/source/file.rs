//! Filesystem module source
//!
//! Reads `.json` and `.toml` modules from disk. Files with any other
//! extension are parsed as JSON first and TOML second.

use crate::source::{Module, ModuleCache, ModuleLocator, ModuleSource};
use crate::{Error, Result};
use async_trait::async_trait;
use serde_json::{Map, Number, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::fs;

/// Module source reading declarative files from the local filesystem
#[derive(Debug, Clone, Default)]
pub struct FileModuleSource {
    cache: Option<ModuleCache>,
}

impl FileModuleSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache(mut self, cache: ModuleCache) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn read(&self, locator: &ModuleLocator, path: &Path) -> Result<Module> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|e| Error::ModuleLoad {
                locator: locator.to_string(),
                message: e.to_string(),
            })?;

        let value = parse_document(path, &contents)?;
        Module::from_value(locator.clone(), value)
    }
}

#[async_trait]
impl ModuleSource for FileModuleSource {
    async fn load(&self, locator: &ModuleLocator) -> Result<Arc<Module>> {
        let ModuleLocator::File(path) = locator else {
            return Err(Error::UnsupportedLocator(locator.to_string()));
        };

        if let Some(cache) = &self.cache
            && let Some(module) = cache.get(locator).await
        {
            return Ok(module);
        }

        tracing::debug!("Loading module {}", locator);
        let module = Arc::new(self.read(locator, path).await?);

        match &self.cache {
            Some(cache) => Ok(cache.insert(module).await),
            None => Ok(module),
        }
    }
}

/// Parse document text into a JSON value according to the file extension
pub fn parse_document(path: &Path, contents: &str) -> Result<Value> {
    let format_error = |message: String| Error::ModuleFormat {
        file: path.to_path_buf(),
        message,
    };

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(contents).map_err(|e| format_error(e.to_string())),
        Some("toml") => parse_toml(contents).map_err(format_error),
        _ => serde_json::from_str(contents).or_else(|json_err| {
            parse_toml(contents).map_err(|toml_err| {
                format_error(format!(
                    "not valid JSON ({}) or TOML ({})",
                    json_err, toml_err
                ))
            })
        }),
    }
}

fn parse_toml(contents: &str) -> std::result::Result<Value, String> {
    let table: toml::Table = toml::from_str(contents).map_err(|e| e.to_string())?;
    Ok(toml_table_to_json(table))
}

fn toml_table_to_json(table: toml::Table) -> Value {
    Value::Object(
        table
            .into_iter()
            .map(|(key, value)| (key, toml_to_json(value)))
            .collect::<Map<String, Value>>(),
    )
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(text) => Value::String(text),
        toml::Value::Integer(number) => Value::Number(number.into()),
        toml::Value::Float(number) => Number::from_f64(number)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(flag) => Value::Bool(flag),
        toml::Value::Datetime(datetime) => Value::String(datetime.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => toml_table_to_json(table),
    }
}
