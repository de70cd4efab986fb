//! Migration report
//!
//! Markdown summary of a translation run: what was translated, what failed and
//! what the operator still has to do by hand.

use chrono::{DateTime, Utc};
use cloudport_types::{MappingResult, Resource, ResourceType};
use std::fmt::Write;

/// Report line for one resource
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    pub resource_id: String,
    pub resource_type: ResourceType,
    pub service_name: String,
    pub failed: bool,
    pub warnings: Vec<String>,
    pub manual_steps: Vec<String>,
}

impl ReportEntry {
    pub fn new(resource: &Resource, result: &MappingResult) -> Self {
        Self {
            resource_id: resource.id.clone(),
            resource_type: resource.resource_type.clone(),
            service_name: result.docker_service.name.clone(),
            failed: result.is_error_placeholder(),
            warnings: result.warnings.clone(),
            manual_steps: result.manual_steps.clone(),
        }
    }
}

/// Report for one batch
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<ReportEntry>,
    /// Batch-level changes made while assembling the compose file
    pub notes: Vec<String>,
}

impl MigrationReport {
    pub fn new(entries: Vec<ReportEntry>) -> Self {
        Self {
            generated_at: Utc::now(),
            entries,
            notes: Vec::new(),
        }
    }

    pub fn with_notes(mut self, notes: Vec<String>) -> Self {
        self.notes = notes;
        self
    }

    /// Pair resources with their results (as returned by a batch, same order)
    pub fn from_results(resources: &[Resource], results: &[MappingResult]) -> Self {
        Self::new(
            resources
                .iter()
                .zip(results)
                .map(|(resource, result)| ReportEntry::new(resource, result))
                .collect(),
        )
    }

    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.failed).count()
    }

    pub fn warning_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| !e.failed)
            .map(|e| e.warnings.len())
            .sum()
    }

    pub fn manual_step_count(&self) -> usize {
        self.entries.iter().map(|e| e.manual_steps.len()).sum()
    }

    /// Render as Markdown
    pub fn render(&self) -> String {
        let mut out = String::new();
        let total = self.entries.len();
        let failed = self.failed_count();

        // Writing to a String cannot fail
        let _ = writeln!(out, "# Migration report\n");
        let _ = writeln!(
            out,
            "Generated {}\n",
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
        );
        let _ = writeln!(out, "## Summary\n");
        let _ = writeln!(out, "| | Count |");
        let _ = writeln!(out, "|---|---|");
        let _ = writeln!(out, "| Resources | {} |", total);
        let _ = writeln!(out, "| Translated | {} |", total - failed);
        let _ = writeln!(out, "| Failed | {} |", failed);
        let _ = writeln!(out, "| Warnings | {} |", self.warning_count());
        let _ = writeln!(out, "| Manual steps | {} |", self.manual_step_count());

        if failed > 0 {
            let _ = writeln!(out, "\n## Failed resources\n");
            for entry in self.entries.iter().filter(|e| e.failed) {
                let reason = entry.warnings.first().map(String::as_str).unwrap_or("unknown error");
                let _ = writeln!(
                    out,
                    "- `{}` ({}): {}",
                    entry.resource_id, entry.resource_type, reason
                );
            }
        }

        if !self.notes.is_empty() {
            let _ = writeln!(out, "\n## Compose adjustments\n");
            for note in &self.notes {
                let _ = writeln!(out, "- {}", note);
            }
        }

        let translated: Vec<&ReportEntry> = self.entries.iter().filter(|e| !e.failed).collect();
        if !translated.is_empty() {
            let _ = writeln!(out, "\n## Resources");
            for entry in translated {
                let _ = writeln!(
                    out,
                    "\n### {} (`{}`)\n",
                    entry.service_name, entry.resource_id
                );
                let _ = writeln!(out, "Type: `{}`", entry.resource_type);

                if !entry.warnings.is_empty() {
                    let _ = writeln!(out, "\n**Warnings**\n");
                    for warning in &entry.warnings {
                        let _ = writeln!(out, "- {}", warning);
                    }
                }
                if !entry.manual_steps.is_empty() {
                    let _ = writeln!(out, "\n**Manual steps**\n");
                    for step in &entry.manual_steps {
                        let _ = writeln!(out, "- [ ] {}", step);
                    }
                }
            }
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translated() -> (Resource, MappingResult) {
        let resource = Resource::new("db-1", ResourceType::RdsInstance, "orders-db");
        let mut result = MappingResult::new("orders-db");
        result.docker_service.image = "postgres:16-alpine".to_string();
        result.add_warning("Multi-AZ dropped");
        result.add_warning("Read replica dropped");
        result.add_manual_step("Set ORDERS_DB_PASSWORD");
        (resource, result)
    }

    #[test]
    fn test_summary_counts() {
        let (resource, result) = translated();
        let failed_resource = Resource::new("q-1", ResourceType::SqsQueue, "jobs");
        let failed = MappingResult::failed("q-1", "No mapper registered for resource type: aws_sqs_queue");

        let report = MigrationReport::from_results(&[resource, failed_resource], &[result, failed]);
        let markdown = report.render();

        assert!(markdown.contains("| Resources | 2 |"));
        assert!(markdown.contains("| Translated | 1 |"));
        assert!(markdown.contains("| Failed | 1 |"));
        assert!(markdown.contains("| Warnings | 2 |"));
        assert!(markdown.contains("| Manual steps | 1 |"));
        assert!(markdown.contains("- `q-1` (aws_sqs_queue): Failed to map resource q-1"));
    }

    #[test]
    fn test_warnings_keep_generation_order() {
        let (resource, result) = translated();
        let markdown = MigrationReport::from_results(&[resource], &[result]).render();

        let first = markdown.find("Multi-AZ dropped").unwrap();
        let second = markdown.find("Read replica dropped").unwrap();
        let step = markdown.find("- [ ] Set ORDERS_DB_PASSWORD").unwrap();
        assert!(first < second);
        assert!(second < step);
        assert!(!markdown.contains("## Failed resources"));
        assert!(!markdown.contains("## Compose adjustments"));
    }

    #[test]
    fn test_notes_are_rendered() {
        let (resource, result) = translated();
        let markdown = MigrationReport::from_results(&[resource], &[result])
            .with_notes(vec!["Host port 5672 of `emails` moved to 5673".to_string()])
            .render();

        assert!(markdown.contains("## Compose adjustments"));
        assert!(markdown.contains("- Host port 5672 of `emails` moved to 5673"));
    }
}
