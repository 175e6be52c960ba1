//! Extraction pipeline - Load modules, classify exports, collect schemas
//!
//! Failures never escape this module: load errors and malformed exports
//! become [`Diagnostic`]s and the pipeline keeps going.

use crate::Error;
use crate::diagnostics::Diagnostic;
use crate::parser::{classify, normalize_export};
use crate::schema::{CanonicalSchema, slug::find_collisions};
use crate::source::{Module, ModuleLocator, ModuleSource, resolve_locator};
use std::sync::Arc;
use std::time::Duration;

pub mod collector;
pub mod discovery;

pub use collector::{DEFAULT_GLOBS, collect, extract_all};
pub use discovery::{compile_glob, discover};

/// Default upper bound for loading a single module
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Schemas extracted by a run, with the warnings raised along the way
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub schemas: Vec<CanonicalSchema>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Extraction {
    pub fn failed(diagnostic: Diagnostic) -> Self {
        Self {
            schemas: Vec::new(),
            diagnostics: vec![diagnostic],
        }
    }

    /// Append another extraction, keeping order
    pub fn extend(&mut self, other: Extraction) {
        self.schemas.extend(other.schemas);
        self.diagnostics.extend(other.diagnostics);
    }
}

/// Loads modules through a [`ModuleSource`] and turns their exports into
/// canonical schemas
#[derive(Clone)]
pub struct Extractor {
    source: Arc<dyn ModuleSource>,
    timeout: Duration,
}

impl Extractor {
    pub fn new(source: Arc<dyn ModuleSource>) -> Self {
        Self {
            source,
            timeout: DEFAULT_LOAD_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Extract every schema exported by the module at `file_path`.
    ///
    /// Never fails: a module that cannot be loaded yields an empty result
    /// with one diagnostic, and each export that fails to normalize is
    /// skipped with its own diagnostic.
    pub async fn extract_from(&self, file_path: &str) -> Extraction {
        let locator = match resolve_locator(file_path) {
            Ok(locator) => locator,
            Err(e) => return Extraction::failed(Diagnostic::module_load(file_path, e)),
        };

        match self.load(&locator).await {
            Ok(module) => extract_module(&module, file_path),
            Err(e) => Extraction::failed(Diagnostic::module_load(file_path, e)),
        }
    }

    async fn load(&self, locator: &ModuleLocator) -> crate::Result<Arc<Module>> {
        match tokio::time::timeout(self.timeout, self.source.load(locator)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout {
                locator: locator.to_string(),
                after: self.timeout,
            }),
        }
    }
}

/// Classify and normalize the exports of a loaded module, in declaration order
pub fn extract_module(module: &Module, file: &str) -> Extraction {
    let mut extraction = Extraction::default();

    for (export_name, value) in &module.exports {
        match normalize_export(value, export_name) {
            Ok(Some(schema)) => {
                tracing::debug!(
                    "Extracted {} export {} from {}",
                    classify(value).kind(),
                    export_name,
                    file
                );
                extraction.diagnostics.extend(slug_collisions(&schema));
                extraction.schemas.push(schema);
            }
            Ok(None) => tracing::debug!("Ignoring export {} in {}", export_name, file),
            Err(e) => extraction
                .diagnostics
                .push(Diagnostic::export(export_name, file, e)),
        }
    }

    extraction
}

/// Report distinct logic ids or state names that share a slug
fn slug_collisions(schema: &CanonicalSchema) -> Vec<Diagnostic> {
    let logic_ids = find_collisions(schema.logic.iter().map(|logic| logic.id.as_str()));
    let state_names = schema.logic.iter().flat_map(|logic| {
        find_collisions(logic.states().iter().map(|state| state.name.as_str()))
    });

    logic_ids
        .into_iter()
        .chain(state_names)
        .map(|(slug, names)| Diagnostic::slug_collision(&schema.name, slug, names))
        .collect()
}
