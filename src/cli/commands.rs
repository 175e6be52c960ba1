//! CLI command implementations
//!
//! This module contains the implementation for each CLI command.

use crate::extract::{Extraction, Extractor, collect};
use crate::source::create_module_source;
use crate::{Config, Result};
use std::path::{Path, PathBuf};

/// Build an extractor honoring the configured load timeout
fn extractor(config: &Config) -> Extractor {
    Extractor::new(create_module_source()).with_timeout(config.load_timeout())
}

/// Collect every schema under `source`, falling back to the configured root
async fn collect_schemas(source: Option<PathBuf>, config: &Config) -> Extraction {
    let root = source.unwrap_or_else(|| config.project.source.clone());
    tracing::info!("Collecting definitions from {:?}", root);

    collect(
        &extractor(config),
        &root,
        &config.discovery.globs,
        config.loader.max_concurrency,
    )
    .await
}

/// Gen command implementation
pub mod generate {
    use super::*;
    use crate::render::DocGenerator;

    /// Execute the gen command
    pub async fn execute(
        source: Option<PathBuf>,
        target: Option<PathBuf>,
        config: Config,
    ) -> Result<()> {
        let target = target.unwrap_or_else(|| config.project.target.clone());
        let generator = DocGenerator::from_config(&config, &target)?;

        let extraction = collect_schemas(source, &config).await;
        let report = generator.generate(&extraction.schemas).await?;

        println!(
            "Generated documentation for {} schemas ({} logic pages, {} diagrams) in {}",
            report.schemas,
            report.logic_pages,
            report.diagrams,
            target.display()
        );
        if !extraction.diagnostics.is_empty() {
            eprintln!("{} warning(s):", extraction.diagnostics.len());
            for diagnostic in &extraction.diagnostics {
                eprintln!("  {}", diagnostic);
            }
        }

        Ok(())
    }
}

/// Init command implementation
pub mod init {
    use super::*;

    /// Execute the init command
    pub fn execute(path: &Path, force: bool) -> Result<()> {
        Config::write_default(path, force)?;
        tracing::info!("Wrote default configuration to {:?}", path);

        println!("Created config file: {}", path.display());
        println!();
        println!("Edit the config file to customize:");
        println!("  - project.title:  Your project name");
        println!("  - project.source: Directory containing your definition files");
        println!("  - project.target: Output directory for documentation");
        println!("  - discovery.globs: File patterns to match");
        println!();
        println!("Run 'statedoc gen' to generate documentation.");
        Ok(())
    }
}

/// List command implementation
pub mod list {
    use super::*;
    use crate::cli::{OutputFormat, output};

    /// Execute the list command
    pub async fn execute(
        source: Option<PathBuf>,
        format: OutputFormat,
        config: Config,
    ) -> Result<()> {
        let extraction = collect_schemas(source, &config).await;

        let mut stdout = std::io::stdout().lock();
        match format {
            OutputFormat::Json => output::output_json(&mut stdout, &extraction)?,
            OutputFormat::Table => output::output_table(&mut stdout, &extraction)?,
        }
        Ok(())
    }
}

/// Diagram command implementation
pub mod diagram {
    use super::*;
    use crate::config::DiagramFormat;
    use crate::schema::LogicUnit;
    use crate::state_machine::{build_state_graph, to_diagram_source};

    /// Render one logic unit in the requested diagram language
    pub fn render(logic: &LogicUnit, format: DiagramFormat) -> String {
        match format {
            DiagramFormat::Mermaid => to_diagram_source(logic.states()),
            DiagramFormat::Dot => build_state_graph(logic).to_dot(),
        }
    }

    /// Execute the diagram command
    pub async fn execute(
        file: &Path,
        logic_filter: Option<&str>,
        format: Option<DiagramFormat>,
        config: Config,
    ) -> Result<()> {
        let format = format.unwrap_or(config.visualization.format);
        let extraction = extractor(&config)
            .extract_from(&file.to_string_lossy())
            .await;

        for diagnostic in &extraction.diagnostics {
            eprintln!("{}", diagnostic);
        }

        let selected: Vec<&LogicUnit> = extraction
            .schemas
            .iter()
            .flat_map(|schema| schema.logic.iter())
            .filter(|logic| match logic_filter {
                Some(wanted) => logic.id == wanted || logic.slug == wanted,
                None => !logic.states().is_empty(),
            })
            .collect();

        if selected.is_empty() {
            return Err(crate::Error::custom(match logic_filter {
                Some(wanted) => format!("No logic unit `{}` in {}", wanted, file.display()),
                None => format!("No logic unit with states in {}", file.display()),
            }));
        }

        let diagrams: Vec<String> = selected
            .into_iter()
            .map(|logic| render(logic, format))
            .collect();
        println!("{}", diagrams.join("\n\n"));
        Ok(())
    }

}
