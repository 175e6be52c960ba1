//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Environment variables (`RUST_LOG`)
//! - Configuration files (TOML, or JSON by extension)
//! - Defaults

use crate::error::{Error, Result};
use crate::extract::DEFAULT_GLOBS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File names searched in the working directory, in order
pub const CONFIG_FILE_NAMES: &[&str] = &["statedoc.toml", ".statedoc.toml"];

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub templates: TemplatesConfig,

    #[serde(default)]
    pub visualization: VisualizationConfig,

    #[serde(default)]
    pub loader: LoaderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where to read definitions from and where to write documentation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Title rendered at the top of the index page
    #[serde(default = "default_title")]
    pub title: String,

    /// Root directory searched for definition files
    #[serde(default = "default_source")]
    pub source: PathBuf,

    /// Output directory for generated documentation
    #[serde(default = "default_target")]
    pub target: PathBuf,
}

/// File discovery patterns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    #[serde(default = "default_globs")]
    pub globs: Vec<String>,
}

/// Template overrides; built-in templates are used when unset
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TemplatesConfig {
    pub outline: Option<String>,
    pub schema_index: Option<String>,
    pub logic_page: Option<String>,
}

/// Diagram output settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VisualizationConfig {
    #[serde(default)]
    pub format: DiagramFormat,

    /// Append the Mermaid source to each logic page
    #[serde(default)]
    pub inline: bool,
}

/// Diagram source language
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum DiagramFormat {
    #[default]
    Mermaid,
    Dot,
}

impl DiagramFormat {
    /// File extension used for diagram files
    pub fn extension(&self) -> &'static str {
        match self {
            DiagramFormat::Mermaid => "mmd",
            DiagramFormat::Dot => "dot",
        }
    }
}

/// Module loading limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoaderConfig {
    /// Upper bound for loading a single module
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of modules loaded at once
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_title() -> String {
    "Application Documentation".to_string()
}

fn default_source() -> PathBuf {
    PathBuf::from("./src")
}

fn default_target() -> PathBuf {
    PathBuf::from("./docs")
}

fn default_globs() -> Vec<String> {
    DEFAULT_GLOBS.iter().map(|glob| glob.to_string()).collect()
}

fn default_timeout_ms() -> u64 {
    5000
}

fn default_max_concurrency() -> usize {
    8
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            source: default_source(),
            target: default_target(),
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            globs: default_globs(),
        }
    }
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

const DEFAULT_CONFIG_TOML: &str = r##"# statedoc configuration

[project]
title = "Application Documentation"
# Directory searched for *.schema.* and legacy *.machine.* files
source = "./src"
target = "./docs"

[discovery]
globs = ["**/*.schema.json", "**/*.schema.toml", "**/*.machine.json", "**/*.machine.toml"]

# Override the built-in page templates
# [templates]
# outline = "# {{projectTitle}}\n{{#each schemas}}- {{name}}\n{{/each}}"
# schema_index = "..."
# logic_page = "..."

[visualization]
# "mermaid" or "dot"
format = "mermaid"
inline = false

[loader]
timeout_ms = 5000
max_concurrency = 8

[logging]
level = "info"
"##;

impl Config {
    /// Load configuration from file, picking the parser by extension
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let config: Config = if is_json {
            serde_json::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        } else {
            toml::from_str(&contents).map_err(|e| {
                Error::Config(format!("Failed to parse config file {:?}: {}", path, e))
            })?
        };

        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./statedoc.toml
    /// 2. ./.statedoc.toml
    /// 3. ~/.statedoc/config.toml
    pub fn load() -> Result<Self> {
        let mut paths: Vec<PathBuf> = CONFIG_FILE_NAMES.iter().map(PathBuf::from).collect();
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".statedoc").join("config.toml"));
        }

        for path in paths {
            if path.exists() {
                tracing::info!("Loading config from {:?}", path);
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Commented default configuration written by `init`
    pub fn default_toml() -> &'static str {
        DEFAULT_CONFIG_TOML
    }

    /// Write the default configuration to `path`, refusing to overwrite
    /// an existing file unless `force` is set
    pub fn write_default(path: &Path, force: bool) -> Result<()> {
        if path.exists() && !force {
            return Err(Error::Config(format!(
                "Config file already exists: {:?} (use --force to overwrite)",
                path
            )));
        }

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, DEFAULT_CONFIG_TOML)?;
        Ok(())
    }

    /// Per-module load timeout
    pub fn load_timeout(&self) -> Duration {
        Duration::from_millis(self.loader.timeout_ms)
    }
}
