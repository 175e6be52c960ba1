//! statedoc
//!
//! A documentation generator for declarative schemas and hierarchical
//! state machines.
//!
//! This library provides functionality for:
//! - Loading JSON/TOML definition modules and classifying their exports
//! - Normalizing rich schemas and legacy machines into one canonical model
//! - Flattening nested state trees into transition graphs
//! - Rendering Markdown pages and Mermaid/DOT state diagrams

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod extract;
pub mod parser;
pub mod render;
pub mod schema;
pub mod source;
pub mod state_machine;

pub use config::Config;
pub use diagnostics::{Diagnostic, DiagnosticKind};
pub use error::{Error, Result};
pub use extract::{Extraction, Extractor};
pub use schema::CanonicalSchema;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Initialize logging with the given log level
///
/// `RUST_LOG` takes precedence over `level`. Calling this twice is a no-op.
pub fn init_logging(level: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
