//! Implementation plan lint: work breakdown and test strategy coverage.

use super::{cross_reference_warnings, missing_sections, Findings};
use regex::Regex;

const REQUIRED_SECTIONS: &[&str] = &["Work Breakdown", "Testing Strategy", "Environment"];

const TEST_LEVELS: &[&str] = &["unit", "integration", "acceptance"];

pub(super) fn check(content: &str, requirements: Option<&str>) -> Findings {
    let mut findings = Findings::default();

    if content.trim().is_empty() {
        findings.issues.push("Document is empty".to_string());
        return findings;
    }

    findings.issues.extend(missing_sections(content, REQUIRED_SECTIONS));

    let work_item = Regex::new(r"^\s*\d+(\.\d+)*\.\s+\S").expect("static regex");
    let work_items = content.lines().filter(|l| work_item.is_match(l)).count() as u64;
    if work_items == 0 {
        findings
            .issues
            .push("Work breakdown has no numbered work items".to_string());
    }

    let lowered = content.to_lowercase();
    let levels_covered = TEST_LEVELS
        .iter()
        .filter(|level| lowered.contains(*level))
        .count() as u64;
    if levels_covered < 2 {
        findings.warnings.push(format!(
            "Testing strategy covers {levels_covered} of {} levels (unit, integration, acceptance); span at least two",
            TEST_LEVELS.len()
        ));
    }

    if let Some(requirements) = requirements {
        findings
            .warnings
            .extend(cross_reference_warnings(content, requirements, "implementation plan"));
    }

    findings.stats.insert("work_items".to_string(), work_items);
    findings
        .stats
        .insert("test_levels_covered".to_string(), levels_covered);
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_DOC: &str = "\
# Implementation Plan

## Work Breakdown
1. Build the stage catalog (requirement R1).
2. Build the state machine gates.
2.1. Ordering gate.
2.2. Readiness gate.

## Testing Strategy
Unit tests per module, integration tests for the CLI flow, and a final
acceptance pass against the approved scope.

## Environment
Stable Rust toolchain, no external services required.
";

    #[test]
    fn test_good_doc_passes() {
        let findings = check(GOOD_DOC, None);
        assert!(findings.issues.is_empty(), "{:?}", findings.issues);
        assert_eq!(findings.stats["work_items"], 4);
        assert_eq!(findings.stats["test_levels_covered"], 3);
    }

    #[test]
    fn test_no_numbered_items_is_an_issue() {
        let doc = "## Work Breakdown\njust prose\n\n## Testing Strategy\nunit and integration\n\n## Environment\nnone\n";
        let findings = check(doc, None);
        assert!(findings
            .issues
            .iter()
            .any(|i| i.contains("no numbered work items")));
    }

    #[test]
    fn test_single_test_level_warns() {
        let doc = GOOD_DOC.replace(
            "Unit tests per module, integration tests for the CLI flow, and a final\nacceptance pass against the approved scope.",
            "Some unit tests.",
        );
        let findings = check(&doc, None);
        assert!(findings
            .warnings
            .iter()
            .any(|w| w.contains("span at least two")));
    }

    #[test]
    fn test_requirements_cross_reference() {
        let doc = GOOD_DOC.replace("(requirement R1)", "");
        let findings = check(&doc, Some("- The system SHALL work.\n"));
        assert!(findings
            .warnings
            .iter()
            .any(|w| w.contains("No requirement references found")));
    }

    #[test]
    fn test_declared_ids_warn_individually() {
        let requirements = "FR-1: Persist progress.\nFR-2: Gate ordering.\n";
        let doc = GOOD_DOC.replace("(requirement R1)", "(FR-1)");
        let findings = check(&doc, Some(requirements));
        assert!(findings
            .warnings
            .iter()
            .any(|w| w.contains("Requirement FR-2 is never referenced")));
        assert!(!findings.warnings.iter().any(|w| w.contains("FR-1 is never")));
    }
}
