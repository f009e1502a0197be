//! Requirements document lint: RFC 2119 language and structural checks.

use super::{missing_sections, Findings};
use regex::Regex;

const REQUIRED_SECTIONS: &[&str] = &[
    "Overview",
    "Functional Requirements",
    "Non-Functional Requirements",
    "Constraints",
    "Out of Scope",
    "Acceptance Criteria",
];

const RFC2119_KEYWORDS: &[&str] = &[
    "MUST NOT",
    "MUST",
    "SHALL NOT",
    "SHALL",
    "SHOULD NOT",
    "SHOULD",
    "REQUIRED",
    "RECOMMENDED",
    "MAY",
    "OPTIONAL",
];

const VAGUE_TERMS: &[&str] = &["fast", "user-friendly", "easy to use", "simple", "etc."];

pub(super) fn check(content: &str) -> Findings {
    let mut findings = Findings::default();

    if content.trim().is_empty() {
        findings.issues.push("Document is empty".to_string());
        return findings;
    }

    findings.issues.extend(missing_sections(content, REQUIRED_SECTIONS));

    let requirement_line = Regex::new(r"^\s*(-\s+|\d+\.\s+)").expect("static regex");
    let mut requirement_count = 0u64;
    let mut keyword_count = 0u64;

    for (line_no, line) in content.lines().enumerate() {
        let line_no = line_no + 1;
        if !requirement_line.is_match(line) {
            continue;
        }
        requirement_count += 1;
        let upper = line.to_uppercase();
        if RFC2119_KEYWORDS.iter().any(|kw| upper.contains(kw)) {
            keyword_count += 1;
            // Keywords present but lowercased lose their normative force.
            if !RFC2119_KEYWORDS.iter().any(|kw| line.contains(kw)) {
                findings.warnings.push(format!(
                    "Line {line_no}: RFC 2119 keyword should be uppercase: {}",
                    truncate(line)
                ));
            }
        } else {
            findings.warnings.push(format!(
                "Line {line_no}: requirement lacks an RFC 2119 keyword: {}",
                truncate(line)
            ));
        }

        let lowered = line.to_lowercase();
        for term in VAGUE_TERMS {
            if lowered.contains(term) {
                findings.warnings.push(format!(
                    "Line {line_no}: vague term '{term}' is not testable"
                ));
            }
        }
    }

    if requirement_count == 0 {
        findings
            .issues
            .push("No requirement list items found (expected '-' bullets or numbered lists)".to_string());
    }

    findings.stats.insert("requirement_lines".to_string(), requirement_count);
    findings.stats.insert("normative_lines".to_string(), keyword_count);
    findings
        .stats
        .insert("line_count".to_string(), content.lines().count() as u64);
    findings
}

fn truncate(line: &str) -> String {
    let trimmed = line.trim();
    if trimmed.chars().count() > 60 {
        format!("{}...", trimmed.chars().take(60).collect::<String>())
    } else {
        trimmed.to_string()
    }
}
