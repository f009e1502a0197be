//! Line-oriented lint for the Markdown artifacts stages produce.
//!
//! The checkers are independent of the pipeline state machine: they consume
//! an artifact path (plus, optionally, the requirements document for
//! cross-referencing) and produce a pass/fail report.

mod architecture;
mod implementation;
mod requirements;
pub mod traceability;

pub use traceability::{build_matrix, TraceMatrix, TraceStatus};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Which artifact a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DocumentKind {
    Requirements,
    Architecture,
    Implementation,
}

impl DocumentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentKind::Requirements => "requirements",
            DocumentKind::Architecture => "architecture",
            DocumentKind::Implementation => "implementation",
        }
    }
}

/// Raw findings produced by one checker pass.
#[derive(Debug, Default)]
pub(crate) struct Findings {
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: BTreeMap<String, u64>,
}

/// Pass/fail verdict plus issue and suggestion lists for one document.
#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub document: String,
    pub kind: DocumentKind,
    pub passed: bool,
    pub issues: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: BTreeMap<String, u64>,
    pub generated_at: DateTime<Utc>,
}

impl CheckReport {
    fn from_findings(document: &Path, kind: DocumentKind, findings: Findings) -> Self {
        Self {
            document: document.display().to_string(),
            kind,
            passed: findings.issues.is_empty(),
            issues: findings.issues,
            warnings: findings.warnings,
            stats: findings.stats,
            generated_at: Utc::now(),
        }
    }

    /// Markdown rendering, mirroring the JSON report content.
    pub fn to_markdown(&self) -> String {
        let verdict = if self.passed { "PASS" } else { "FAIL" };
        let mut lines = vec![
            format!("# {} check: {verdict}", self.kind.as_str()),
            String::new(),
            format!("Document: `{}`", self.document),
            String::new(),
        ];
        if !self.issues.is_empty() {
            lines.push("## Issues".to_string());
            for issue in &self.issues {
                lines.push(format!("- {issue}"));
            }
            lines.push(String::new());
        }
        if !self.warnings.is_empty() {
            lines.push("## Suggestions".to_string());
            for warning in &self.warnings {
                lines.push(format!("- {warning}"));
            }
            lines.push(String::new());
        }
        if !self.stats.is_empty() {
            lines.push("## Stats".to_string());
            for (key, value) in &self.stats {
                lines.push(format!("- {key}: {value}"));
            }
            lines.push(String::new());
        }
        lines.push(format!(
            "_Generated: {}_",
            self.generated_at.format("%Y-%m-%d %H:%M UTC")
        ));
        lines.join("\n")
    }
}

/// Run the checker for `kind` over `document`.
///
/// `requirements` is consulted by the architecture and implementation
/// checkers for cross-referencing and is ignored otherwise.
pub fn check_document(
    kind: DocumentKind,
    document: &Path,
    requirements: Option<&Path>,
) -> Result<CheckReport> {
    let content = std::fs::read_to_string(document)
        .with_context(|| format!("failed to read {}", document.display()))?;
    let requirements_content = match requirements {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?,
        ),
        None => None,
    };

    let findings = match kind {
        DocumentKind::Requirements => requirements::check(&content),
        DocumentKind::Architecture => {
            architecture::check(&content, requirements_content.as_deref())
        }
        DocumentKind::Implementation => {
            implementation::check(&content, requirements_content.as_deref())
        }
    };
    Ok(CheckReport::from_findings(document, kind, findings))
}

/// Build the requirements traceability matrix from document paths.
pub fn trace_documents(
    requirements: &Path,
    architecture: &Path,
    implementation: &Path,
) -> Result<TraceMatrix> {
    let read = |path: &Path| {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    };
    Ok(build_matrix(
        &read(requirements)?,
        &read(architecture)?,
        &read(implementation)?,
    ))
}

/// Per-ID cross-reference pass shared by the architecture and implementation
/// checkers: one warning per declared requirement ID the document never
/// mentions. Falls back to a single generic warning when the requirements
/// document declares no IDs.
pub(crate) fn cross_reference_warnings(
    content: &str,
    requirements: &str,
    document_label: &str,
) -> Vec<String> {
    if requirements.trim().is_empty() {
        return Vec::new();
    }
    let ids = traceability::requirement_ids(requirements);
    if ids.is_empty() {
        if content.to_lowercase().contains("requirement") {
            Vec::new()
        } else {
            vec![format!(
                "No requirement references found; add a traceability table linking the {document_label} back to requirements"
            )]
        }
    } else {
        ids.into_iter()
            .filter(|id| !content.contains(id.as_str()))
            .map(|id| format!("Requirement {id} is never referenced in the {document_label}"))
            .collect()
    }
}

/// Sections that must appear (as headings, case-insensitive) in a document.
pub(crate) fn missing_sections(content: &str, required: &[&str]) -> Vec<String> {
    let lowered = content.to_lowercase();
    required
        .iter()
        .filter(|section| {
            let needle = section.to_lowercase();
            !lowered
                .lines()
                .any(|line| line.trim_start().starts_with('#') && line.to_lowercase().contains(&needle))
        })
        .map(|section| format!("Missing required section: {section}"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_sections_is_heading_based() {
        let content = "# Title\n\n## Overview\n\nwe talk about constraints in prose\n";
        let missing = missing_sections(content, &["Overview", "Constraints"]);
        assert_eq!(missing, vec!["Missing required section: Constraints"]);
    }

    #[test]
    fn test_check_document_reports_and_renders() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("requirements.md");
        std::fs::write(&path, "# Requirements\n\nno structure at all\n").unwrap();

        let report = check_document(DocumentKind::Requirements, &path, None).unwrap();
        assert!(!report.passed);
        assert!(!report.issues.is_empty());

        let markdown = report.to_markdown();
        assert!(markdown.contains("requirements check: FAIL"));
        assert!(markdown.contains("## Issues"));

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["kind"], "requirements");
        assert_eq!(json["passed"], false);
    }

    #[test]
    fn test_trace_documents_reads_all_three() {
        let temp = TempDir::new().unwrap();
        let req = temp.path().join("requirements.md");
        let arch = temp.path().join("architecture.md");
        let imp = temp.path().join("implementation.md");
        std::fs::write(&req, "FR-1: Persist progress.\nFR-2: Gate ordering.\n").unwrap();
        std::fs::write(&arch, "FR-1 maps to the state store.\n").unwrap();
        std::fs::write(&imp, "1. FR-1 work item.\n2. FR-2 work item.\n").unwrap();

        let matrix = trace_documents(&req, &arch, &imp).unwrap();
        assert_eq!(matrix.total(), 2);
        assert_eq!(matrix.fully_traced(), 1);
        assert!(matrix.nothing_missing());

        // A missing input is an error, not an empty matrix.
        assert!(trace_documents(&req, &arch, &temp.path().join("absent.md")).is_err());
    }

    #[test]
    fn test_cross_reference_prefers_ids_over_keyword() {
        let requirements = "FR-1: Persist progress.\n";
        // The keyword alone does not satisfy an ID-declaring requirements doc.
        let warnings = cross_reference_warnings(
            "this document discusses requirements in general",
            requirements,
            "architecture document",
        );
        assert_eq!(
            warnings,
            vec!["Requirement FR-1 is never referenced in the architecture document"]
        );
    }
}
