//! Architecture document lint: decisions, rationale, and the no-code rule.

use super::{cross_reference_warnings, missing_sections, Findings};

const REQUIRED_SECTIONS: &[&str] = &["Context", "Components", "Cross-Cutting Concerns"];

const RATIONALE_MARKERS: &[&str] = &["rationale", "alternative", "trade-off", "tradeoff"];

pub(super) fn check(content: &str, requirements: Option<&str>) -> Findings {
    let mut findings = Findings::default();

    if content.trim().is_empty() {
        findings.issues.push("Document is empty".to_string());
        return findings;
    }

    findings.issues.extend(missing_sections(content, REQUIRED_SECTIONS));

    // Architecture docs must not contain source code; text-based diagram
    // fences (mermaid, C4) are allowed.
    let mut code_fences = 0u64;
    let mut diagram_fences = 0u64;
    let mut inside_fence = false;
    for (line_no, line) in content.lines().enumerate() {
        let trimmed = line.trim_start();
        if !trimmed.starts_with("```") {
            continue;
        }
        if inside_fence {
            inside_fence = false;
            continue;
        }
        inside_fence = true;
        let info = trimmed.trim_start_matches('`').trim().to_lowercase();
        if info.is_empty() || info == "mermaid" || info.starts_with("c4") || info == "text" {
            diagram_fences += 1;
        } else {
            code_fences += 1;
            findings.issues.push(format!(
                "Line {}: code block ('{info}') found; the architecture document must not contain source code",
                line_no + 1
            ));
        }
    }

    let lowered = content.to_lowercase();
    if !RATIONALE_MARKERS.iter().any(|m| lowered.contains(m)) {
        findings.warnings.push(
            "No rationale or alternatives discussion found; document why each technology was chosen"
                .to_string(),
        );
    }

    if let Some(requirements) = requirements {
        findings
            .warnings
            .extend(cross_reference_warnings(content, requirements, "architecture document"));
    }

    findings.stats.insert(
        "heading_count".to_string(),
        content
            .lines()
            .filter(|l| l.trim_start().starts_with('#'))
            .count() as u64,
    );
    findings.stats.insert("code_fences".to_string(), code_fences);
    findings
        .stats
        .insert("diagram_fences".to_string(), diagram_fences);
    findings
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_DOC: &str = "\
# Architecture

## Context
A single-process CLI. Decisions below map to requirement R1 and R2.

## Components
State machine, persistence, GitHub sync. Rationale: flat files keep the
deployment footprint minimal; the alternative of an embedded database was
rejected as overkill.

```mermaid
flowchart LR
  cli --> state --> disk
```

## Cross-Cutting Concerns
Errors carry enough context for targeted CLI messages.
";

    #[test]
    fn test_good_doc_passes() {
        let findings = check(GOOD_DOC, None);
        assert!(findings.issues.is_empty(), "{:?}", findings.issues);
        assert_eq!(findings.stats["diagram_fences"], 1);
        assert_eq!(findings.stats["code_fences"], 0);
    }

    #[test]
    fn test_code_block_is_an_issue() {
        let doc = format!("{GOOD_DOC}\n```rust\nfn main() {{}}\n```\n");
        let findings = check(&doc, None);
        assert!(findings
            .issues
            .iter()
            .any(|i| i.contains("must not contain source code")));
    }

    #[test]
    fn test_missing_rationale_warns() {
        let doc = "## Context\nx\n\n## Components\ny\n\n## Cross-Cutting Concerns\nz\n";
        let findings = check(doc, None);
        assert!(findings.warnings.iter().any(|w| w.contains("rationale")));
    }

    #[test]
    fn test_cross_reference_warning_needs_requirements_input() {
        let doc = "## Context\nRationale given.\n\n## Components\ny\n\n## Cross-Cutting Concerns\nz\n";
        let without = check(doc, None);
        assert!(!without.warnings.iter().any(|w| w.contains("traceability")));
        let with = check(doc, Some("# Requirements\n- The system SHALL work.\n"));
        assert!(with.warnings.iter().any(|w| w.contains("traceability")));
    }

    #[test]
    fn test_declared_ids_warn_individually() {
        let requirements = "FR-1: The system SHALL work.\nFR-2: The system SHALL persist.\n";
        let doc = "## Context\nFR-1 drives the design. Rationale given.\n\n## Components\ny\n\n## Cross-Cutting Concerns\nz\n";
        let findings = check(doc, Some(requirements));
        assert!(findings
            .warnings
            .iter()
            .any(|w| w.contains("Requirement FR-2 is never referenced")));
        assert!(!findings.warnings.iter().any(|w| w.contains("FR-1 is never")));
    }
}
