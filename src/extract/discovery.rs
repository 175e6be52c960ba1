//! File discovery
//!
//! Walks a root directory and keeps the files whose root-relative,
//! `/`-separated path matches one of the configured glob patterns.

use crate::{Error, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Compile a glob pattern into an anchored regex.
///
/// Supports `**/` (any number of directories), `**`, `*` (within one path
/// segment), `?` and `{a,b}` alternation.
pub fn compile_glob(pattern: &str) -> Result<Regex> {
    let pattern = pattern.strip_prefix("./").unwrap_or(pattern);
    let mut source = String::from("^");
    let mut chars = pattern.chars().peekable();
    let mut in_group = false;

    while let Some(c) = chars.next() {
        match c {
            '*' if chars.peek() == Some(&'*') => {
                chars.next();
                if chars.peek() == Some(&'/') {
                    chars.next();
                    source.push_str("(?:.*/)?");
                } else {
                    source.push_str(".*");
                }
            }
            '*' => source.push_str("[^/]*"),
            '?' => source.push_str("[^/]"),
            '{' if !in_group => {
                in_group = true;
                source.push_str("(?:");
            }
            '}' if in_group => {
                in_group = false;
                source.push(')');
            }
            ',' if in_group => source.push('|'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }

    if in_group {
        return Err(Error::Discovery(format!(
            "unclosed `{{` in glob pattern {}",
            pattern
        )));
    }

    source.push('$');
    Regex::new(&source)
        .map_err(|e| Error::Discovery(format!("invalid glob pattern {}: {}", pattern, e)))
}

/// Find every file under `root` matching any of `globs`.
///
/// Results are absolute paths sorted by directory walk order (file names
/// ascending), so repeated runs see files in the same order. Symbolic links
/// are followed and reported under their link path.
pub async fn discover(root: &Path, globs: &[String]) -> Result<Vec<PathBuf>> {
    let patterns = globs
        .iter()
        .map(|glob| compile_glob(glob))
        .collect::<Result<Vec<_>>>()?;

    let root = if root.is_absolute() {
        root.to_path_buf()
    } else {
        std::env::current_dir()?.join(root)
    };

    tokio::task::spawn_blocking(move || walk(&root, &patterns))
        .await
        .map_err(|e| Error::Other(anyhow::anyhow!("discovery task failed: {}", e)))?
}

fn walk(root: &Path, patterns: &[Regex]) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(Error::Discovery(format!(
            "{} is not a readable directory",
            root.display()
        )));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        if patterns.iter().any(|pattern| pattern.is_match(&relative)) {
            files.push(entry.into_path());
        }
    }

    tracing::debug!("Discovered {} files under {}", files.len(), root.display());
    Ok(files)
}
