//! Built-in stage definitions for the standard delivery workflow.

use super::{Stage, StageCatalog};

struct StageSpec {
    key: &'static str,
    title: &'static str,
    description: &'static str,
    instructions: &'static str,
    system_prompt: Option<&'static str>,
    kickoff_prompt: Option<&'static str>,
    ready_checklist: Option<&'static [&'static str]>,
    artifact_path: Option<&'static str>,
}

impl From<&StageSpec> for Stage {
    fn from(spec: &StageSpec) -> Self {
        Stage {
            key: spec.key.to_string(),
            title: spec.title.to_string(),
            description: spec.description.to_string(),
            instructions: spec.instructions.to_string(),
            system_prompt: spec.system_prompt.map(str::to_string),
            kickoff_prompt: spec.kickoff_prompt.map(str::to_string),
            ready_checklist: spec
                .ready_checklist
                .map(|items| items.iter().map(|s| s.to_string()).collect()),
            artifact_path: spec.artifact_path.map(str::to_string),
        }
    }
}

pub(super) fn standard() -> StageCatalog {
    let mut catalog = StageCatalog::new();
    for spec in STANDARD_STAGES {
        // The built-in keys are unique by construction.
        catalog
            .register(spec.into())
            .unwrap_or_else(|err| panic!("standard catalog: {err}"));
    }
    catalog
}

const STANDARD_STAGES: &[StageSpec] = &[
    StageSpec {
        key: "requirements_loop",
        title: "Requirements Discovery Loop",
        description: "Use {{model_label}} to interrogate the concept until the ready checklist \
is satisfied.",
        instructions: "\
1. Open a new conversation with {{model_label}}.
2. Paste the system prompt into the conversation instructions panel.
3. Send the kickoff prompt as your first message and answer the follow-up questions.
4. Update your answers until every item in the ready checklist is satisfied.
5. Conclude the loop by typing READY CHECK PASSED.",
        system_prompt: Some(
            "\
You are {{model_label}}, an expert product requirements analyst.
Project name: {{project_name}}.

Your mission is to facilitate a discovery interview with the human builder.
Ask one focused question per turn, then update a running summary with the
following sections: Confirmed Facts, Assumptions (to be validated), Open
Questions, and Ready Checklist (show each item and mark it PASS or TODO).

Stay within the discovery scope: do not propose solutions or implementation
details yet. Keep iterating until the human explicitly types
\"READY CHECK PASSED\".

Ready checklist:
{{checklist}}",
        ),
        kickoff_prompt: Some(
            "\
Project concept: {{concept}}

Begin the discovery interview now. Ask your first clarification question,
maintain the running summary, and continue until I respond with
\"READY CHECK PASSED\".",
        ),
        ready_checklist: Some(&[
            "Primary user personas identified",
            "Business or mission outcomes captured",
            "Key functional capabilities outlined",
            "Non-functional and quality attributes enumerated",
            "Constraints and dependencies recorded",
            "Success metrics or acceptance tests drafted",
            "Out-of-scope boundaries acknowledged",
        ]),
        artifact_path: None,
    },
    StageSpec {
        key: "requirements_doc",
        title: "Generate requirements.md",
        description: "Draft the formal requirements artifact using normative language.",
        instructions: "\
1. In the same conversation (or a fresh one) with {{model_label}}, pin the system prompt.
2. Provide the discovery summary and instruct the model with the kickoff prompt.
3. Inspect the generated Markdown carefully and iterate until the ready checklist passes.
4. Store the approved document with 'stagecraft capture requirements_doc'.",
        system_prompt: Some(
            "\
You are {{model_label}}, acting as a senior requirements engineer for the
project \"{{project_name}}\".

Produce a Markdown document named `requirements.md` that uses only the modal
verbs \"shall\", \"shall not\", \"must\", and \"must not\" for all normative
statements. Structure the document with the following headings:
  1. Overview
  2. Functional Requirements
  3. Non-Functional Requirements
  4. Constraints
  5. Out of Scope
  6. Acceptance Criteria

Each section should contain numbered lists. Reconfirm the ready checklist at
the end with explicit PASS/FAIL markers. Do not include implementation
details.",
        ),
        kickoff_prompt: Some(
            "\
Using the final discovery notes below, draft `requirements.md` according to
the mandated structure and language rules. After the document, restate the
ready checklist with PASS or TODO for each item.

Discovery summary:
<paste the Confirmed Facts / Assumptions / Open Questions summary here>",
        ),
        ready_checklist: Some(&[
            "All required sections are present and numbered",
            "Normative statements only use shall/shall not/must/must not",
            "Acceptance criteria map to success metrics",
            "Out-of-scope items listed explicitly",
            "Ready checklist restated with PASS for every item",
        ]),
        artifact_path: Some("artifacts/requirements.md"),
    },
    StageSpec {
        key: "architecture_doc",
        title: "Generate architecture.md",
        description: "Capture technical decisions, components, and rationale with no code blocks.",
        instructions: "\
1. Start a fresh conversation with {{model_label}} to avoid stale context.
2. Pin the system prompt, then provide the final requirements.md along with the kickoff prompt.
3. Request revisions until the document covers decisions, alternatives, and trade-offs.
4. Save the approved artifact via 'stagecraft capture architecture_doc'.",
        system_prompt: Some(
            "\
You are {{model_label}}, working as the lead software architect for
\"{{project_name}}\". Produce an `architecture.md` document that:
  - Summarizes the solution context and core components.
  - Details technology selections with rationale and alternatives considered.
  - Describes data flows, integration points, and deployment topology.
  - Addresses cross-cutting concerns (security, observability, compliance).

Present decisions using Markdown with subsections per area and optional
text-based diagrams (Mermaid or C4 notation). Do not provide any source code.",
        ),
        kickoff_prompt: Some(
            "\
Reference the approved `requirements.md` content below to produce
`architecture.md` following the architect guidelines. Close with a table that
links each architectural decision to the requirements it satisfies.

Requirements:
<paste contents of artifacts/requirements.md here>",
        ),
        ready_checklist: Some(&[
            "Solution context and scope described",
            "Component and integration overview documented",
            "Technology choices include rationale and alternatives",
            "Cross-cutting concerns addressed",
            "Traceability table links decisions to requirements",
        ]),
        artifact_path: Some("artifacts/architecture.md"),
    },
    StageSpec {
        key: "implementation_doc",
        title: "Generate implementation.md",
        description: "Create an execution-ready build plan derived from the architecture.",
        instructions: "\
1. Open a new conversation with {{model_label}} and apply the system prompt.
2. Provide both requirements.md and architecture.md together with the kickoff message.
3. Ensure the document enumerates tasks, module boundaries, test strategy, and deployment notes.
4. Store the artifact using 'stagecraft capture implementation_doc' once approved.",
        system_prompt: Some(
            "\
You are {{model_label}}, the lead implementation strategist for
\"{{project_name}}\". Produce an `implementation.md` playbook that stands
alone for developers. Include:
  - A feature-by-feature work breakdown with suggested sequencing.
  - Interface contracts and data models referenced from the architecture.
  - Pseudocode only for complex logic, otherwise describe steps plainly.
  - Environment setup, tooling, and automation instructions.
  - Testing strategy spanning unit, integration, and acceptance levels.
  - A migration or rollout plan if relevant.

Ensure every work item maps back to architectural decisions or requirements.",
        ),
        kickoff_prompt: Some(
            "\
Using the finalized `requirements.md` and `architecture.md` documents provided
below, produce `implementation.md` per the guidelines. Finish with a checklist
of prerequisites the team must complete before coding starts.

Requirements:
<paste contents of artifacts/requirements.md here>

Architecture:
<paste contents of artifacts/architecture.md here>",
        ),
        ready_checklist: Some(&[
            "Work breakdown covers all major features",
            "Interfaces and data models trace back to architecture",
            "Testing strategy spans multiple levels",
            "Environment and tooling instructions included",
            "Pre-coding readiness checklist provided",
        ]),
        artifact_path: Some("artifacts/implementation.md"),
    },
    StageSpec {
        key: "code_build",
        title: "Implementation & Test Loop",
        description: "Coordinate coding sessions with {{model_label}} while keeping tests green.",
        instructions: "\
1. Keep implementation.md nearby and work feature by feature.
2. For each feature, prime {{model_label}} with the relevant implementation plan excerpt.
3. Ask for code in small, reviewable chunks; run local tests or linters after every change.
4. Paste any failures back into the chat to obtain fixes.
5. Summarize the completed work and test evidence via 'stagecraft capture code_build'.",
        system_prompt: Some(
            "\
You are {{model_label}} acting as a senior pair-programmer and TDD coach.
Collaborate iteratively: plan the next minimal change, propose code, and
adjust based on compiler or test feedback provided by the human. Never skip
writing or updating tests. Confirm when the current slice is green before
suggesting another.",
        ),
        kickoff_prompt: Some(
            "\
We are starting implementation guided by `implementation.md`. Help craft the
first development slice by outlining the plan, proposing code, and indicating
which tests to run.",
        ),
        ready_checklist: Some(&[
            "Every change accompanied by tests or validation",
            "Local automated checks pass",
            "Implementation plan updated if scope shifts",
            "Summary of work captured in the code log",
        ]),
        artifact_path: Some("artifacts/code_log.md"),
    },
    StageSpec {
        key: "review_loop",
        title: "Code Review & Remediation",
        description: "Leverage {{model_label}} as a reviewer until it issues a PASS verdict.",
        instructions: "\
1. Open a clean conversation with {{model_label}} acting as the reviewer.
2. Provide diffs or pull-request summaries along with test results.
3. Address any BLOCK or ACTION REQUIRED comments by iterating in the implementation loop.
4. Record the final review decision using 'stagecraft capture review_loop'.",
        system_prompt: Some(
            "\
You are {{model_label}}, an uncompromising software reviewer. Evaluate the
provided code diffs for correctness, completeness, testing, security, and
style. Respond with a structured review containing:
  - Verdict: PASS or BLOCK
  - Major Findings (required actions)
  - Suggestions (optional improvements)
  - Tests & Evidence summary
Refuse to issue PASS until every blocking issue is resolved.",
        ),
        kickoff_prompt: Some(
            "\
Review the following diff and context. Apply the review rubric and return a
PASS or BLOCK decision with actionable comments.

Context:
<describe the feature branch and link to implementation plan sections>

Diff:
<paste git diff or summary>

Test Results:
<paste latest test output>",
        ),
        ready_checklist: Some(&[
            "Reviewer provides explicit PASS verdict",
            "All blocking comments resolved",
            "Test evidence attached to review",
            "Review summary saved in the review log",
        ]),
        artifact_path: Some("artifacts/review_log.md"),
    },
    StageSpec {
        key: "ready_gate",
        title: "Release Readiness Summary",
        description: "Compile evidence that the work meets the ready threshold before closure.",
        instructions: "\
1. Once review passes, ask {{model_label}} to act as a release manager using the prompts below.
2. Provide links or excerpts from requirements.md, architecture.md, test results, and the final diff.
3. Capture the readiness report via 'stagecraft capture ready_gate'.",
        system_prompt: Some(
            "\
You are {{model_label}} serving as the release manager for
\"{{project_name}}\". Assess whether the increment is ready to ship by
verifying:
  - Requirements satisfied with evidence links
  - Architecture and implementation documents updated if scope changed
  - Test suite coverage and results
  - Outstanding risks, mitigations, and follow-up actions

Produce a Markdown readiness report summarizing the evidence and a final
READY / NOT READY decision.",
        ),
        kickoff_prompt: Some(
            "\
Using the supplied artifacts and test evidence, create the release readiness
report. Explicitly cite the supporting documents and conclude with READY or
NOT READY plus next steps.",
        ),
        ready_checklist: Some(&[
            "Requirements traced to implemented work",
            "Test evidence documented",
            "Risks and mitigations listed",
            "Final READY/NOT READY decision recorded",
        ]),
        artifact_path: Some("artifacts/ready_report.md"),
    },
];
