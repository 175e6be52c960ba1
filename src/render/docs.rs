//! Documentation writer
//!
//! Layout under the target directory:
//!
//! ```text
//! index.md
//! schemas/<schema-slug>/README.md
//! schemas/<schema-slug>/logic/<logic-slug>.md
//! schemas/<schema-slug>/logic/<logic-slug>.mmd   (or .dot)
//! ```

use crate::Result;
use crate::config::{Config, DiagramFormat};
use crate::render::Template;
use crate::schema::{CanonicalSchema, LogicUnit};
use crate::state_machine::{build_state_graph, to_diagram_source};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Built-in index page template
pub const DEFAULT_OUTLINE: &str = "# {{projectTitle}}
{{#each schemas}}

## {{name}}
{{description}}

### Logic Definitions
{{#each logic}}
- [{{name}}](./schemas/{{../slug}}/logic/{{slug}}.md) - {{description}}
{{/each}}
{{/each}}
";

/// Built-in per-schema README template
pub const DEFAULT_SCHEMA_INDEX: &str = "# {{name}}

{{description}}
{{#if version}}

Version: {{version}}
{{/if}}

## Models
{{#each models}}

### {{name}}
{{description}}

Fields:
{{#each fields}}
- **{{name}}** ({{type}}){{#if description}} - {{description}}{{/if}}
{{/each}}
{{else}}

_No models declared._
{{/each}}

## Logic Definitions
{{#each logic}}
- [{{name}}](./logic/{{slug}}.md) - {{description}}
{{/each}}
{{#if components}}

## Components
{{#each components}}
- **{{name}}** ({{type}}){{#if model}} for {{model}}{{/if}}{{#if description}} - {{description}}{{/if}}
{{/each}}
{{/if}}
";

/// Built-in per-logic page template
pub const DEFAULT_LOGIC_PAGE: &str = "# {{schema.name}} / {{name}}

{{description}}

## Events
{{#each events}}
- **{{tag}}**{{#if description}} - {{description}}{{/if}}
{{/each}}
{{#if states}}

## States
{{#each states}}

### {{name}}
{{description}}

Transitions:
{{#each on}}
- {{event}} -> {{target}}{{#if description}} - {{description}}{{/if}}
{{else}}
- none (final)
{{/each}}
{{/each}}
{{/if}}
{{#if facts}}

## Facts
{{#each facts}}
- **{{tag}}**{{#if description}} - {{description}}{{/if}}
{{/each}}
{{/if}}
{{#if transitions}}

## State Transitions
{{#each transitions}}
- {{from}} --[{{event}}]--> {{to}}{{#if description}} - {{description}}{{/if}}
{{/each}}
{{/if}}
{{#if rules}}

## Rules
{{#each rules}}
- {{#if id}}**{{id}}**: {{/if}}{{description}}
{{/each}}
{{/if}}
";

/// Directory name used when a slug comes out empty
const UNNAMED_SLUG: &str = "unnamed";

/// Files written by one documentation run
#[derive(Debug, Clone, Default)]
pub struct DocReport {
    pub files: Vec<PathBuf>,
    pub schemas: usize,
    pub logic_pages: usize,
    pub diagrams: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OutlineData<'a> {
    project_title: &'a str,
    schemas: &'a [CanonicalSchema],
}

#[derive(Serialize)]
struct LogicPageData<'a> {
    #[serde(flatten)]
    logic: &'a LogicUnit,
    schema: &'a CanonicalSchema,
}

/// Renders canonical schemas into a documentation tree
#[derive(Debug, Clone)]
pub struct DocGenerator {
    title: String,
    target: PathBuf,
    outline: Template,
    schema_index: Template,
    logic_page: Template,
    format: DiagramFormat,
    inline: bool,
}

impl DocGenerator {
    /// Generator with the built-in templates
    pub fn new(title: impl Into<String>, target: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            title: title.into(),
            target: target.into(),
            outline: Template::compile(DEFAULT_OUTLINE)?,
            schema_index: Template::compile(DEFAULT_SCHEMA_INDEX)?,
            logic_page: Template::compile(DEFAULT_LOGIC_PAGE)?,
            format: DiagramFormat::default(),
            inline: false,
        })
    }

    /// Generator honoring the template overrides and visualization settings
    /// of `config`
    pub fn from_config(config: &Config, target: impl Into<PathBuf>) -> Result<Self> {
        let templates = &config.templates;
        let compile = |custom: &Option<String>, fallback: &str| {
            Template::compile(custom.as_deref().unwrap_or(fallback))
        };

        Ok(Self {
            title: config.project.title.clone(),
            target: target.into(),
            outline: compile(&templates.outline, DEFAULT_OUTLINE)?,
            schema_index: compile(&templates.schema_index, DEFAULT_SCHEMA_INDEX)?,
            logic_page: compile(&templates.logic_page, DEFAULT_LOGIC_PAGE)?,
            format: config.visualization.format,
            inline: config.visualization.inline,
        })
    }

    pub fn with_format(mut self, format: DiagramFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_inline(mut self, inline: bool) -> Self {
        self.inline = inline;
        self
    }

    /// Write the whole documentation tree
    pub async fn generate(&self, schemas: &[CanonicalSchema]) -> Result<DocReport> {
        let mut report = DocReport::default();
        let schemas_dir = self.target.join("schemas");
        tokio::fs::create_dir_all(&schemas_dir).await?;

        let index = self.outline.render_serialize(&OutlineData {
            project_title: &self.title,
            schemas,
        })?;
        write_file(&self.target.join("index.md"), &index, &mut report).await?;

        for schema in schemas {
            let schema_dir = schemas_dir.join(dir_name(&schema.slug));
            let logic_dir = schema_dir.join("logic");
            tokio::fs::create_dir_all(&logic_dir).await?;

            let readme = self.schema_index.render_serialize(schema)?;
            write_file(&schema_dir.join("README.md"), &readme, &mut report).await?;
            report.schemas += 1;

            for logic in &schema.logic {
                self.write_logic(schema, logic, &logic_dir, &mut report).await?;
            }
        }

        tracing::info!(
            "Wrote {} files for {} schemas to {}",
            report.files.len(),
            report.schemas,
            self.target.display()
        );
        Ok(report)
    }

    async fn write_logic(
        &self,
        schema: &CanonicalSchema,
        logic: &LogicUnit,
        logic_dir: &Path,
        report: &mut DocReport,
    ) -> Result<()> {
        let slug = dir_name(&logic.slug);
        let mut page = self
            .logic_page
            .render_serialize(&LogicPageData { logic, schema })?;

        let states = logic.states();
        if !states.is_empty() {
            let mermaid = to_diagram_source(states);
            let diagram = match self.format {
                DiagramFormat::Mermaid => mermaid.clone(),
                DiagramFormat::Dot => build_state_graph(logic).to_dot(),
            };
            let diagram_path = logic_dir.join(format!("{}.{}", slug, self.format.extension()));
            write_file(&diagram_path, &diagram, report).await?;
            report.diagrams += 1;

            if self.inline {
                if !page.ends_with('\n') {
                    page.push('\n');
                }
                page.push_str(&format!("\n```mermaid\n{}\n```\n", mermaid));
            }
        }

        write_file(&logic_dir.join(format!("{}.md", slug)), &page, report).await?;
        report.logic_pages += 1;
        Ok(())
    }
}

fn dir_name(slug: &str) -> &str {
    if slug.is_empty() { UNNAMED_SLUG } else { slug }
}

async fn write_file(path: &Path, contents: &str, report: &mut DocReport) -> Result<()> {
    tokio::fs::write(path, contents).await?;
    tracing::debug!("Wrote {}", path.display());
    report.files.push(path.to_path_buf());
    Ok(())
}
