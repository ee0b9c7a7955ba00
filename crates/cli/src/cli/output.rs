//! Output formatting
//!
//! Node results, introspection summaries and configuration rendered as JSON,
//! YAML or human-readable text. JSON node output is the `[file, result]`
//! tuple list Nx expects from a `createNodes` call.

use anyhow::{Context, Result};
use nxgradle_core::{CreateNodesResult, NxGradleConfig};
use nxgradle_introspect::Introspection;
use serde::Serialize;
use serde_json::{json, Value};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Json,
    Yaml,
    Human,
}

pub struct OutputFormatter {
    format: OutputFormat,
}

impl OutputFormatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_nodes(&self, results: &[(String, CreateNodesResult)]) -> Result<String> {
        match self.format {
            OutputFormat::Json => to_json(&results, "node results"),
            OutputFormat::Yaml => to_yaml(&results, "node results"),
            OutputFormat::Human => Ok(self.format_nodes_human(results)),
        }
    }

    pub fn format_introspection(
        &self,
        introspection: &Introspection,
        report_path: &Path,
    ) -> Result<String> {
        let summary = introspection_summary(introspection, report_path);
        match self.format {
            OutputFormat::Json => to_json(&summary, "introspection summary"),
            OutputFormat::Yaml => to_yaml(&summary, "introspection summary"),
            OutputFormat::Human => Ok(self.format_introspection_human(introspection, report_path)),
        }
    }

    pub fn format_config(&self, config: &NxGradleConfig) -> Result<String> {
        let map = config_map(config);
        match self.format {
            OutputFormat::Json => to_json(&map, "config"),
            OutputFormat::Yaml => to_yaml(&map, "config"),
            OutputFormat::Human => Ok(config.to_string()),
        }
    }

    fn format_nodes_human(&self, results: &[(String, CreateNodesResult)]) -> String {
        let mut output = String::new();
        let mut projects = 0;

        for (file, result) in results {
            match &result.projects {
                Some(nodes) if !nodes.is_empty() => {
                    for (root, node) in nodes {
                        projects += 1;
                        output.push_str(&format!("{} -> {} ({})\n", file, node.name, root));
                        for (name, target) in &node.targets {
                            output.push_str(&format!("  {:<20} {}\n", name, target.command));
                        }
                    }
                }
                _ => output.push_str(&format!("{} -> no project\n", file)),
            }
        }

        output.push_str(&format!(
            "\n{} files, {} projects\n",
            results.len(),
            projects
        ));
        output
    }

    fn format_introspection_human(&self, introspection: &Introspection, report_path: &Path) -> String {
        let mut output = String::new();
        output.push_str(&format!(
            "Root project: {}\n",
            introspection.root_project_name
        ));
        output.push_str(&format!("Report: {}\n", report_path.display()));
        output.push_str(&format!("Projects: {}\n", introspection.report.len()));

        for root in introspection.report.roots() {
            output.push_str(&format!("  {}\n", root));
        }

        if !introspection.skipped.is_empty() {
            output.push_str(&format!("Skipped: {}\n", introspection.skipped.len()));
            for skipped in &introspection.skipped {
                output.push_str(&format!("  {}: {}\n", skipped.project_dir, skipped.reason));
            }
        }
        output
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {} to JSON", what))
}

fn to_yaml<T: Serialize + ?Sized>(value: &T, what: &str) -> Result<String> {
    serde_yaml::to_string(value).with_context(|| format!("Failed to serialize {} to YAML", what))
}

fn introspection_summary(introspection: &Introspection, report_path: &Path) -> Value {
    json!({
        "rootProject": introspection.root_project_name,
        "report": report_path.display().to_string(),
        "projects": introspection.report.roots().collect::<Vec<_>>(),
        "skipped": introspection
            .skipped
            .iter()
            .map(|s| json!({"projectDir": s.project_dir, "reason": s.reason}))
            .collect::<Vec<_>>(),
    })
}

fn config_map(config: &NxGradleConfig) -> Value {
    json!({
        "workspace_root": config.workspace_root.display().to_string(),
        "report_dir": config.report_dir().display().to_string(),
        "workspace_data_dir": config.workspace_data_dir().display().to_string(),
        "log_level": config.log_level,
        "platform": format!("{:?}", config.platform).to_lowercase(),
    })
}
