//! Requirements traceability: which requirement IDs flow through the
//! downstream documents.
//!
//! Requirement IDs follow the `PREFIX-NUM:` convention (for example
//! `FR-1: The system SHALL ...`). A requirement is fully traced when both
//! the architecture and the implementation document mention its ID.

use regex::Regex;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    Complete,
    Partial,
    Missing,
}

impl TraceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TraceStatus::Complete => "complete",
            TraceStatus::Partial => "partial",
            TraceStatus::Missing => "missing",
        }
    }
}

impl fmt::Display for TraceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One requirement's trace through the downstream documents.
#[derive(Debug, Serialize)]
pub struct TraceRow {
    pub id: String,
    pub description: String,
    pub in_architecture: bool,
    pub in_implementation: bool,
}

impl TraceRow {
    pub fn status(&self) -> TraceStatus {
        match (self.in_architecture, self.in_implementation) {
            (true, true) => TraceStatus::Complete,
            (false, false) => TraceStatus::Missing,
            _ => TraceStatus::Partial,
        }
    }
}

/// The full requirements-to-documents matrix.
#[derive(Debug, Serialize)]
pub struct TraceMatrix {
    pub rows: Vec<TraceRow>,
}

impl TraceMatrix {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn total(&self) -> usize {
        self.rows.len()
    }

    pub fn fully_traced(&self) -> usize {
        self.rows
            .iter()
            .filter(|row| row.status() == TraceStatus::Complete)
            .count()
    }

    pub fn coverage_percent(&self) -> f64 {
        if self.rows.is_empty() {
            0.0
        } else {
            self.fully_traced() as f64 * 100.0 / self.total() as f64
        }
    }

    /// Every requirement appears in at least one downstream document.
    pub fn nothing_missing(&self) -> bool {
        self.rows.iter().all(|row| row.status() != TraceStatus::Missing)
    }

    pub fn to_markdown(&self) -> String {
        let mut lines = vec![
            "# Requirements Traceability Matrix".to_string(),
            String::new(),
            "| Requirement | Description | Architecture | Implementation | Status |".to_string(),
            "|-------------|-------------|--------------|----------------|--------|".to_string(),
        ];
        for row in &self.rows {
            let mark = |present: bool| if present { "yes" } else { "no" };
            lines.push(format!(
                "| {} | {} | {} | {} | {} |",
                row.id,
                row.description.replace('|', "\\|"),
                mark(row.in_architecture),
                mark(row.in_implementation),
                row.status()
            ));
        }
        lines.push(String::new());
        lines.push(format!(
            "Total: {} | Fully traced: {} | Coverage: {:.1}%",
            self.total(),
            self.fully_traced(),
            self.coverage_percent()
        ));
        lines.join("\n")
    }
}

/// Declared requirement IDs in document order, deduplicated.
pub(crate) fn requirement_ids(content: &str) -> Vec<String> {
    let pattern = Regex::new(r"([A-Z]+-\d+):").expect("static regex");
    let mut ids = Vec::new();
    for capture in pattern.captures_iter(content) {
        let id = capture[1].to_string();
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

fn description_for(content: &str, id: &str) -> String {
    let needle = format!("{id}:");
    content
        .lines()
        .find_map(|line| line.split_once(&needle).map(|(_, rest)| rest))
        .map(|rest| {
            let trimmed = rest.trim();
            if trimmed.chars().count() > 50 {
                format!("{}...", trimmed.chars().take(50).collect::<String>())
            } else {
                trimmed.to_string()
            }
        })
        .unwrap_or_default()
}

/// Build the matrix from document contents. Pure; file IO stays with the
/// caller.
pub fn build_matrix(requirements: &str, architecture: &str, implementation: &str) -> TraceMatrix {
    let rows = requirement_ids(requirements)
        .into_iter()
        .map(|id| TraceRow {
            description: description_for(requirements, &id),
            in_architecture: architecture.contains(&id),
            in_implementation: implementation.contains(&id),
            id,
        })
        .collect();
    TraceMatrix { rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIREMENTS: &str = "\
## Functional Requirements
FR-1: The system SHALL persist stage progress between invocations.
FR-2: The system MUST NOT complete a stage out of order.

## Non-Functional Requirements
NFR-1: The CLI SHALL exit non-zero on gating failures.
";

    #[test]
    fn test_requirement_ids_in_order_and_unique() {
        let doubled = format!("{REQUIREMENTS}\nFR-1: restated later.\n");
        assert_eq!(requirement_ids(&doubled), vec!["FR-1", "FR-2", "NFR-1"]);
    }

    #[test]
    fn test_matrix_statuses() {
        let architecture = "The state store addresses FR-1; ordering (FR-2) is a gate.";
        let implementation = "1. Persistence work item covers FR-1.";
        let matrix = build_matrix(REQUIREMENTS, architecture, implementation);

        assert_eq!(matrix.total(), 3);
        assert_eq!(matrix.fully_traced(), 1);
        assert_eq!(matrix.rows[0].status(), TraceStatus::Complete);
        assert_eq!(matrix.rows[1].status(), TraceStatus::Partial);
        assert_eq!(matrix.rows[2].status(), TraceStatus::Missing);
        assert!(!matrix.nothing_missing());
        assert!((matrix.coverage_percent() - 33.3).abs() < 0.1);
    }

    #[test]
    fn test_descriptions_are_trimmed_and_bounded() {
        let matrix = build_matrix(REQUIREMENTS, "", "");
        assert_eq!(
            matrix.rows[0].description,
            "The system SHALL persist stage progress between in..."
        );
        assert!(matrix.rows[0].description.chars().count() <= 53);
    }

    #[test]
    fn test_markdown_table_and_summary() {
        let matrix = build_matrix(REQUIREMENTS, "FR-1 FR-2 NFR-1", "FR-1 FR-2 NFR-1");
        let markdown = matrix.to_markdown();
        assert!(markdown.contains("| FR-1 |"));
        assert!(markdown.contains("| yes | yes | complete |"));
        assert!(markdown.contains("Coverage: 100.0%"));
    }

    #[test]
    fn test_no_ids_yields_empty_matrix() {
        let matrix = build_matrix("- The system SHALL work.\n", "x", "y");
        assert!(matrix.is_empty());
        assert_eq!(matrix.coverage_percent(), 0.0);
    }
}
