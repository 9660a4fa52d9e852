//! Table output formatting for CLI commands
//!
//! Domain models, load failures, traces and MCP servers rendered with
//! comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use super::truncate;
use crate::domain::models::{
    DomainSummary, LoadFailure, LoadWarning, McpServerConfig, TraceEntry, TraceOutcome,
};

/// Table formatter for CLI output
pub struct TableFormatter {
    /// Whether to use colors in output
    use_colors: bool,
}

impl TableFormatter {
    /// Create a new table formatter
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
        }
    }

    /// Create a new table formatter with custom settings
    pub fn with_colors(use_colors: bool) -> Self {
        Self { use_colors }
    }

    pub fn format_domains(&self, domains: &[DomainSummary]) -> String {
        let mut table = Self::create_base_table();
        table.set_header(header(&["ID", "Name", "Version", "Keywords", "Description"]));

        for domain in domains {
            table.add_row(vec![
                Cell::new(&domain.domain_id),
                Cell::new(&domain.domain_name),
                Cell::new(&domain.version),
                Cell::new(domain.expertise_keywords.join(", ")),
                Cell::new(truncate(&domain.description, 50)),
            ]);
        }

        table.to_string()
    }

    pub fn format_failures(&self, failures: &[LoadFailure]) -> String {
        let mut table = Self::create_base_table();
        table.set_header(header(&["File", "Kind", "Error"]));

        for failure in failures {
            let kind = Cell::new(failure.error.kind());
            table.add_row(vec![
                Cell::new(failure.path.display()),
                if self.use_colors { kind.fg(Color::Red) } else { kind },
                Cell::new(failure.error.to_string()),
            ]);
        }

        table.to_string()
    }

    pub fn format_warnings(&self, warnings: &[LoadWarning]) -> String {
        let mut table = Self::create_base_table();
        table.set_header(header(&["File", "Domain", "Warning"]));

        for warning in warnings {
            table.add_row(vec![
                Cell::new(warning.path.display()),
                Cell::new(&warning.domain_id),
                Cell::new(warning.issue.to_string()),
            ]);
        }

        table.to_string()
    }

    pub fn format_traces(&self, traces: &[TraceEntry]) -> String {
        let mut table = Self::create_base_table();
        table.set_header(header(&["Request", "Outcome", "Domains", "Time"]));

        for trace in traces {
            let outcome = Cell::new(trace.outcome);
            table.add_row(vec![
                Cell::new(&trace.request_id),
                if self.use_colors {
                    outcome.fg(outcome_color(trace.outcome))
                } else {
                    outcome
                },
                Cell::new(trace.domain_ids_consulted.join(", ")),
                Cell::new(trace.timestamp.format("%Y-%m-%d %H:%M:%S UTC")),
            ]);
        }

        table.to_string()
    }

    /// Format MCP server configurations as a table
    pub fn format_mcp_servers(&self, servers: &[McpServerConfig]) -> String {
        let mut table = Self::create_base_table();
        table.set_header(header(&["ID", "Name", "Type", "Endpoint", "Enabled"]));

        for server in servers {
            table.add_row(vec![
                Cell::new(&server.id),
                Cell::new(&server.name),
                Cell::new(&server.server_type),
                Cell::new(server.endpoint.as_deref().unwrap_or("-")),
                Cell::new(if server.enabled { "yes" } else { "no" }),
            ]);
        }

        table.to_string()
    }

    fn create_base_table() -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);
        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names
        .iter()
        .map(|name| Cell::new(name).add_attribute(Attribute::Bold))
        .collect()
}

fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

const fn outcome_color(outcome: TraceOutcome) -> Color {
    match outcome {
        TraceOutcome::Success => Color::Green,
        TraceOutcome::Partial => Color::Yellow,
        TraceOutcome::Failure => Color::Red,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::DomainModelDescriptor;

    #[test]
    fn test_format_domains() {
        let summary = DomainModelDescriptor::new("investments", "Portfolio analysis", "1.0.0")
            .with_keyword("finance")
            .summary();
        let output = TableFormatter::with_colors(false).format_domains(&[summary]);
        assert!(output.contains("investments"));
        assert!(output.contains("finance"));
        assert!(output.contains("1.0.0"));
    }

    #[test]
    fn test_format_traces() {
        let entry = TraceEntry::new("req-1", TraceOutcome::Partial)
            .with_domains(vec!["investments".into()]);
        let output = TableFormatter::with_colors(false).format_traces(&[entry]);
        assert!(output.contains("req-1"));
        assert!(output.contains("partial"));
    }
}
