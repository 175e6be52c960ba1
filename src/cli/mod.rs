//! CLI module
//!
//! This module defines the command-line interface using clap and implements
//! the command execution logic.

use crate::config::DiagramFormat;
use crate::{Config, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

pub mod commands;
pub mod output;

/// Documentation generator for declarative schemas and state machines
#[derive(Parser, Debug)]
#[command(name = "statedoc")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level (overrides config; RUST_LOG overrides both)
    #[arg(long, global = true, env = "STATEDOC_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to `gen`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Generate documentation for every definition under the source directory
    Gen {
        /// Directory searched for definition files (overrides config)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output directory (overrides config)
        #[arg(short, long)]
        target: Option<PathBuf>,
    },

    /// Write a default configuration file
    Init {
        /// Where to write the configuration
        #[arg(short, long, default_value = "statedoc.toml")]
        path: PathBuf,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// List the schemas found under the source directory
    List {
        /// Directory searched for definition files (overrides config)
        #[arg(short, long)]
        source: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },

    /// Print state diagrams for the logic units of one file
    Diagram {
        /// Definition file to load
        file: PathBuf,

        /// Only print the logic unit with this id or slug
        #[arg(short, long)]
        logic: Option<String>,

        /// Diagram language (overrides config)
        #[arg(short, long, value_enum)]
        format: Option<DiagramFormat>,
    },
}

/// Output format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text table
    Table,
}

impl Cli {
    /// The command to run, `gen` when none was given
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or(Commands::Gen {
            source: None,
            target: None,
        })
    }
}

/// Execute the CLI command
pub async fn execute(args: Cli, config: Config) -> Result<()> {
    match args.command() {
        Commands::Gen { source, target } => {
            commands::generate::execute(source, target, config).await
        }
        Commands::Init { path, force } => commands::init::execute(&path, force),
        Commands::List { source, output } => commands::list::execute(source, output, config).await,
        Commands::Diagram {
            file,
            logic,
            format,
        } => commands::diagram::execute(&file, logic.as_deref(), format, config).await,
    }
}
