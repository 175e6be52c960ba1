//! Batch collection over a directory tree

use crate::diagnostics::Diagnostic;
use crate::extract::{Extraction, Extractor, discovery};
use crate::schema::slug::find_collisions;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Patterns covering both schema and legacy machine file names
pub const DEFAULT_GLOBS: &[&str] = &[
    "**/*.schema.json",
    "**/*.schema.toml",
    "**/*.machine.json",
    "**/*.machine.toml",
];

/// Extract every schema from the files under `root` matching `globs`.
///
/// Always completes. An empty result carries exactly one empty-result
/// diagnostic, plus a discovery diagnostic when `root` could not be walked.
pub async fn collect(
    extractor: &Extractor,
    root: &Path,
    globs: &[String],
    max_concurrency: usize,
) -> Extraction {
    let mut extraction = Extraction::default();

    let files = match discovery::discover(root, globs).await {
        Ok(files) => files,
        Err(e) => {
            extraction.diagnostics.push(Diagnostic::discovery(root, e));
            Vec::new()
        }
    };

    tracing::info!("Found {} candidate files under {}", files.len(), root.display());
    extraction.extend(extract_all(extractor, files, max_concurrency).await);

    if extraction.schemas.is_empty() {
        extraction.diagnostics.push(Diagnostic::empty_result());
    } else {
        tracing::info!("Extracted {} schemas", extraction.schemas.len());
    }

    extraction
}

/// Extract several files concurrently, concatenating results in input order.
///
/// At most `max_concurrency` modules load at once. Dropping the returned
/// future aborts every in-flight extraction. Schemas whose names share a slug
/// across the whole batch are reported after the per-file diagnostics.
pub async fn extract_all(
    extractor: &Extractor,
    files: Vec<PathBuf>,
    max_concurrency: usize,
) -> Extraction {
    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let mut task_files = HashMap::new();

    for (index, file) in files.iter().enumerate() {
        let extractor = extractor.clone();
        let semaphore = Arc::clone(&semaphore);
        let path = file.to_string_lossy().into_owned();

        let handle = tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.ok();
            (index, extractor.extract_from(&path).await)
        });
        task_files.insert(handle.id(), file.clone());
    }

    let mut results: Vec<Option<Extraction>> = (0..files.len()).map(|_| None).collect();
    let mut failures = Vec::new();

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, extraction)) => results[index] = Some(extraction),
            Err(e) => {
                let file = task_files
                    .get(&e.id())
                    .map(|path| path.to_string_lossy().into_owned())
                    .unwrap_or_default();
                failures.push(Diagnostic::module_load(file, e));
            }
        }
    }

    let mut extraction = Extraction::default();
    for result in results.into_iter().flatten() {
        extraction.extend(result);
    }
    extraction.diagnostics.extend(failures);

    let collisions = find_collisions(extraction.schemas.iter().map(|s| s.name.as_str()));
    for (slug, names) in collisions {
        extraction
            .diagnostics
            .push(Diagnostic::schema_slug_collision(slug, names));
    }
    extraction
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::source::{FileModuleSource, MemoryModuleSource};
    use serde_json::json;
    use tempfile::TempDir;

    fn default_globs() -> Vec<String> {
        DEFAULT_GLOBS.iter().map(|g| g.to_string()).collect()
    }

    #[tokio::test]
    async fn test_empty_directory_single_warning() {
        let dir = TempDir::new().unwrap();
        let extractor = Extractor::new(Arc::new(FileModuleSource::new()));

        let extraction = collect(&extractor, dir.path(), &default_globs(), 4).await;
        assert!(extraction.schemas.is_empty());
        assert_eq!(extraction.diagnostics.len(), 1);
        assert_eq!(extraction.diagnostics[0].kind, DiagnosticKind::EmptyResult);
    }

    #[tokio::test]
    async fn test_missing_root_warns_twice() {
        let extractor = Extractor::new(Arc::new(FileModuleSource::new()));
        let extraction =
            collect(&extractor, Path::new("/no/such/root"), &default_globs(), 4).await;
        assert!(extraction.schemas.is_empty());
        assert!(matches!(
            extraction.diagnostics[0].kind,
            DiagnosticKind::Discovery { .. }
        ));
        assert_eq!(extraction.diagnostics[1].kind, DiagnosticKind::EmptyResult);
    }

    #[tokio::test]
    async fn test_collect_from_disk() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("light.machine.json"),
            r#"{ "lightMachine": { "id": "light", "states": { "red": { "on": { "TIMER": "green" } }, "green": {} } } }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("task.schema.toml"),
            "[taskSchema]\nname = \"Tasks\"\n\n[[taskSchema.logic]]\nid = \"flow\"\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("broken.schema.json"), "{ nope").unwrap();
        std::fs::write(dir.path().join("readme.txt"), "ignored").unwrap();

        let extractor = Extractor::new(Arc::new(FileModuleSource::new()));
        let extraction = collect(&extractor, dir.path(), &default_globs(), 2).await;

        let names: Vec<&str> = extraction.schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["light", "Tasks"]);
        assert_eq!(extraction.diagnostics.len(), 1);
        assert!(matches!(
            &extraction.diagnostics[0].kind,
            DiagnosticKind::ModuleLoad { file, .. } if file.ends_with("broken.schema.json")
        ));
    }

    #[tokio::test]
    async fn test_collect_fixtures() {
        let root = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures");
        let extractor = Extractor::new(Arc::new(FileModuleSource::new()));
        let extraction = collect(&extractor, &root, &default_globs(), 4).await;

        assert!(extraction.diagnostics.is_empty());
        let names: Vec<&str> = extraction.schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["shoppingCart", "TaskManagement", "trafficLight"]);

        let cart = &extraction.schemas[0].logic[0];
        let state_names: Vec<&str> = cart.states().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(
            state_names,
            vec![
                "empty",
                "active",
                "checkout",
                "checkout.shipping",
                "checkout.payment",
                "processing",
                "completed",
                "failed"
            ]
        );
        assert_eq!(cart.events.len(), 10);
        assert_eq!(cart.states()[4].on[0].target, "processing");

        let tasks = &extraction.schemas[1];
        assert_eq!(tasks.slug, "taskmanagement");
        assert_eq!(tasks.version.as_deref(), Some("1.0.0"));
        assert_eq!(tasks.components.as_ref().map(Vec::len), Some(2));
        let flow = &tasks.logic[0];
        assert_eq!(flow.slug, "task-state-machine");
        assert_eq!(flow.facts.len(), 2);
        let from: Vec<&str> = flow.states().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(from, vec!["new", "assigned", "in_progress", "paused"]);
    }

    #[tokio::test]
    async fn test_extract_all_keeps_input_order() {
        let source = MemoryModuleSource::new()
            .with_module("/m/1.json", json!({ "one": { "id": "one" } }))
            .with_module("/m/2.json", json!({ "two": { "id": "two" } }))
            .with_module("/m/3.json", json!({ "three": { "id": "three" } }));
        let extractor = Extractor::new(Arc::new(source));

        let files = vec!["/m/3.json", "/m/1.json", "/m/2.json"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        let extraction = extract_all(&extractor, files, 8).await;
        let names: Vec<&str> = extraction.schemas.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["three", "one", "two"]);
    }

    #[tokio::test]
    async fn test_extract_all_reports_schema_slug_collisions() {
        let source = MemoryModuleSource::new()
            .with_module("/m/a.json", json!({ "cart": { "id": "Cart" } }))
            .with_module("/m/b.json", json!({ "cartCopy": { "id": "cart!" } }))
            .with_module("/m/c.json", json!({ "light": { "id": "light" } }));
        let extractor = Extractor::new(Arc::new(source));

        let files = vec!["/m/a.json", "/m/b.json", "/m/c.json"]
            .into_iter()
            .map(PathBuf::from)
            .collect();
        let extraction = extract_all(&extractor, files, 4).await;

        assert_eq!(extraction.schemas.len(), 3);
        assert_eq!(extraction.diagnostics.len(), 1);
        assert_eq!(
            extraction.diagnostics[0].kind,
            DiagnosticKind::SchemaSlugCollision {
                slug: "cart".to_string(),
                names: vec!["Cart".to_string(), "cart!".to_string()],
            }
        );
    }
}
