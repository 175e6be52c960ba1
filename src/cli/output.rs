//! Output formatting module
//!
//! This module formats extracted schemas and their diagnostics for the
//! `list` command.

use crate::{Error, Result};
use crate::extract::Extraction;
use crate::schema::LogicUnit;
use crate::state_machine::analyzer::{AnalysisReport, detect_pattern};
use crate::state_machine::{GraphStats, build_state_graph};
use serde_json::json;

fn analyze(logic: &LogicUnit) -> (GraphStats, AnalysisReport) {
    let graph = build_state_graph(logic);
    (graph.stats(), detect_pattern(&graph))
}

/// Output schemas and diagnostics as JSON
pub fn output_json(w: &mut impl std::io::Write, extraction: &Extraction) -> Result<()> {
    let output = json!({
        "summary": {
            "total_schemas": extraction.schemas.len(),
            "total_logic": extraction.schemas.iter().map(|s| s.logic.len()).sum::<usize>(),
            "total_warnings": extraction.diagnostics.len(),
        },
        "schemas": extraction.schemas.iter().map(|schema| {
            json!({
                "name": schema.name,
                "slug": schema.slug,
                "description": schema.description,
                "version": schema.version,
                "models": schema.models.iter().map(|m| m.name.as_str()).collect::<Vec<_>>(),
                "logic": schema.logic.iter().map(|logic| {
                    let (stats, report) = analyze(logic);
                    json!({
                        "id": logic.id,
                        "slug": logic.slug,
                        "events": logic.events.len(),
                        "states": stats.total_states,
                        "transitions": stats.total_transitions,
                        "initial_states": stats.initial_states,
                        "terminal_states": stats.terminal_states,
                        "dangling_targets": stats.dangling_targets,
                        "pattern": report.pattern.display_name(),
                        "max_depth": report.max_depth,
                        "max_out_degree": report.max_out_degree,
                        "has_cycles": report.has_cycles,
                    })
                }).collect::<Vec<_>>(),
            })
        }).collect::<Vec<_>>(),
        "diagnostics": extraction.diagnostics,
    });

    serde_json::to_writer_pretty(&mut *w, &output).map_err(|e| Error::Io(e.into()))?;
    writeln!(w)?;
    Ok(())
}

/// Output schemas and diagnostics as text table
pub fn output_table(w: &mut impl std::io::Write, extraction: &Extraction) -> Result<()> {
    writeln!(w, "statedoc - Extracted Schemas")?;
    writeln!(w, "{}", "=".repeat(80))?;
    writeln!(w)?;

    writeln!(w, "Summary:")?;
    writeln!(w, "  Total Schemas:  {}", extraction.schemas.len())?;
    writeln!(w, "  Total Warnings: {}", extraction.diagnostics.len())?;
    writeln!(w)?;

    if !extraction.schemas.is_empty() {
        writeln!(
            w,
            "{:<24} {:<24} {:>7} {:>7} {:>8} {:>6}  {:<10}",
            "Schema", "Logic", "Events", "States", "Trans.", "Depth", "Pattern"
        )?;
        writeln!(w, "{:-<95}", "")?;

        for schema in &extraction.schemas {
            if schema.logic.is_empty() {
                writeln!(w, "{:<24} {:<24}", truncate(&schema.name, 24), "-")?;
            }
            for logic in &schema.logic {
                let (stats, report) = analyze(logic);
                writeln!(
                    w,
                    "{:<24} {:<24} {:>7} {:>7} {:>8} {:>6}  {:<10}",
                    truncate(&schema.name, 24),
                    truncate(&logic.id, 24),
                    logic.events.len(),
                    stats.total_states,
                    stats.total_transitions,
                    report.max_depth,
                    report.pattern.display_name()
                )?;
            }
        }
        writeln!(w)?;
    }

    if !extraction.diagnostics.is_empty() {
        writeln!(w, "Warnings:")?;
        for diagnostic in &extraction.diagnostics {
            writeln!(w, "  {}", diagnostic.message)?;
        }
        writeln!(w)?;
    }

    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() > width {
        let kept: String = text.chars().take(width.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Diagnostic;
    use crate::parser::normalize_export;

    fn create_test_extraction() -> Extraction {
        let export = json!({
            "id": "light",
            "states": {
                "green": { "on": { "TIMER": "yellow" } },
                "yellow": { "on": { "TIMER": "red" } },
                "red": { "on": { "TIMER": "green" } }
            }
        });
        Extraction {
            schemas: vec![normalize_export(&export, "lightMachine").unwrap().unwrap()],
            diagnostics: vec![Diagnostic::module_load("/defs/broken.schema.json", "bad json")],
        }
    }

    #[test]
    fn test_output_json() {
        let mut buf = Vec::new();
        output_json(&mut buf, &create_test_extraction()).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();
        assert_eq!(value["summary"]["total_schemas"], 1);
        assert_eq!(value["summary"]["total_warnings"], 1);
        assert_eq!(value["schemas"][0]["logic"][0]["states"], 3);
        assert_eq!(value["schemas"][0]["logic"][0]["pattern"], "Cyclic");
        assert_eq!(value["schemas"][0]["logic"][0]["max_depth"], 2);
        assert_eq!(value["schemas"][0]["logic"][0]["max_out_degree"], 1);
        assert_eq!(value["schemas"][0]["logic"][0]["has_cycles"], true);
        assert_eq!(value["diagnostics"][0]["kind"], "module_load");
    }

    #[test]
    fn test_output_table() {
        let mut buf = Vec::new();
        output_table(&mut buf, &create_test_extraction()).unwrap();

        let output = String::from_utf8(buf).unwrap();
        assert!(output.contains("Total Schemas:  1"));
        assert!(output.contains("light"));
        assert!(output.contains("Depth"));
        let row = output.lines().find(|line| line.starts_with("light ")).unwrap();
        let columns: Vec<&str> = row.split_whitespace().collect();
        assert_eq!(columns, vec!["light", "light", "1", "3", "3", "2", "Cyclic"]);
        assert!(output.contains("Failed to import /defs/broken.schema.json: bad json"));
    }

    struct ClosedPipe;

    impl std::io::Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_output_json_write_failure_is_io() {
        let err = output_json(&mut ClosedPipe, &create_test_extraction()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 24), "short");
        assert_eq!(truncate("abcdefghij", 6), "abc...");
    }
}
