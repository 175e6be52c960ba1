//! Typed diagnostics returned alongside extraction results
//!
//! Every diagnostic is a non-fatal warning. They are also emitted as
//! `tracing` warnings when recorded so interactive runs see them live.

use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiagnosticKind {
    /// A file could not be loaded or parsed as a module
    ModuleLoad { file: String, cause: String },

    /// One recognized export failed to normalize
    Export {
        export: String,
        file: String,
        cause: String,
    },

    /// Logic ids or state names inside one schema share a slug
    SlugCollision {
        schema: String,
        slug: String,
        names: Vec<String>,
    },

    /// Schemas in one batch share a slug, and so an output directory
    SchemaSlugCollision { slug: String, names: Vec<String> },

    /// The discovery root could not be walked
    Discovery { root: PathBuf, cause: String },

    /// The whole batch produced no schema
    EmptyResult,
}

/// A non-fatal warning
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    #[serde(flatten)]
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    pub fn module_load(file: impl Into<String>, cause: impl fmt::Display) -> Self {
        let file = file.into();
        let cause = cause.to_string();
        Self::record(
            format!("Failed to import {}: {}", file, cause),
            DiagnosticKind::ModuleLoad { file, cause },
        )
    }

    pub fn export(
        export: impl Into<String>,
        file: impl Into<String>,
        cause: impl fmt::Display,
    ) -> Self {
        let export = export.into();
        let file = file.into();
        let cause = cause.to_string();
        Self::record(
            format!("Failed to parse export {} in {}: {}", export, file, cause),
            DiagnosticKind::Export {
                export,
                file,
                cause,
            },
        )
    }

    pub fn slug_collision(
        schema: impl Into<String>,
        slug: impl Into<String>,
        names: Vec<String>,
    ) -> Self {
        let schema = schema.into();
        let slug = slug.into();
        Self::record(
            format!(
                "Names {} in schema {} share the slug `{}`; generated files may overwrite each other",
                names.join(", "),
                schema,
                slug
            ),
            DiagnosticKind::SlugCollision {
                schema,
                slug,
                names,
            },
        )
    }

    pub fn schema_slug_collision(slug: impl Into<String>, names: Vec<String>) -> Self {
        let slug = slug.into();
        Self::record(
            format!(
                "Schemas {} share the slug `{}`; their documentation directories overlap",
                names.join(", "),
                slug
            ),
            DiagnosticKind::SchemaSlugCollision { slug, names },
        )
    }

    pub fn discovery(root: impl Into<PathBuf>, cause: impl fmt::Display) -> Self {
        let root = root.into();
        let cause = cause.to_string();
        Self::record(
            format!("Failed to search {:?}: {}", root, cause),
            DiagnosticKind::Discovery { root, cause },
        )
    }

    pub fn empty_result() -> Self {
        Self::record(
            "No schemas found. Check your source path and globs configuration \
             (looking for *.schema.* and legacy *.machine.* files)."
                .to_string(),
            DiagnosticKind::EmptyResult,
        )
    }

    fn record(message: String, kind: DiagnosticKind) -> Self {
        tracing::warn!("{}", message);
        Self { kind, message }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "warning: {}", self.message)
    }
}
