//! Stage catalog: the fixed, ordered definition of the delivery workflow.
//!
//! The catalog is explicit immutable configuration. It is built once at
//! startup (normally via [`StageCatalog::standard`]) and passed by reference
//! into the state machine and the CLI; there is no global mutable registry.

mod stages;

use crate::error::PipelineError;
use std::collections::HashMap;

/// One named step in the workflow.
#[derive(Debug, Clone)]
pub struct Stage {
    /// Unique key, used as the mapping key everywhere.
    pub key: String,
    /// Human-readable label.
    pub title: String,
    /// One-paragraph summary shown in `status` and `prompt` output.
    pub description: String,
    /// Step-by-step instructions for driving the stage.
    pub instructions: String,
    /// System prompt template to pin into the LLM conversation.
    pub system_prompt: Option<String>,
    /// First message template to send in the conversation.
    pub kickoff_prompt: Option<String>,
    /// Ordered readiness criteria; every item must reach `pass` before the
    /// stage can be marked complete. `None` means the stage is vacuously ready.
    pub ready_checklist: Option<Vec<String>>,
    /// Relative path of the document this stage produces, if any.
    pub artifact_path: Option<String>,
}

impl Stage {
    /// The declared checklist, or an empty slice for stages without one.
    pub fn checklist(&self) -> &[String] {
        self.ready_checklist.as_deref().unwrap_or(&[])
    }

    pub fn render_description(&self, ctx: &PromptContext) -> String {
        self.substitute(&self.description, ctx)
    }

    pub fn render_instructions(&self, ctx: &PromptContext) -> String {
        self.substitute(&self.instructions, ctx)
    }

    pub fn render_system_prompt(&self, ctx: &PromptContext) -> Option<String> {
        self.system_prompt.as_deref().map(|t| self.substitute(t, ctx))
    }

    pub fn render_kickoff_prompt(&self, ctx: &PromptContext) -> Option<String> {
        self.kickoff_prompt.as_deref().map(|t| self.substitute(t, ctx))
    }

    fn substitute(&self, template: &str, ctx: &PromptContext) -> String {
        template
            .replace("{{project_name}}", ctx.project_name)
            .replace("{{model_label}}", ctx.model_label)
            .replace("{{concept}}", ctx.concept)
            .replace("{{checklist}}", &checklist_block(self.checklist()))
            .trim()
            .to_string()
    }
}

/// Values substituted into stage prompt templates.
pub struct PromptContext<'a> {
    pub project_name: &'a str,
    pub model_label: &'a str,
    pub concept: &'a str,
}

fn checklist_block(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Immutable, ordered collection of stages.
///
/// Registration happens only while the catalog is being built; afterwards the
/// catalog is read-only shared configuration.
#[derive(Debug, Default)]
pub struct StageCatalog {
    stages: Vec<Stage>,
    index: HashMap<String, usize>,
}

impl StageCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in seven-stage delivery workflow.
    pub fn standard() -> Self {
        stages::standard()
    }

    /// Add a stage at the end of the pipeline order.
    pub fn register(&mut self, stage: Stage) -> Result<(), PipelineError> {
        if self.index.contains_key(&stage.key) {
            return Err(PipelineError::DuplicateStage(stage.key.clone()));
        }
        self.index.insert(stage.key.clone(), self.stages.len());
        self.stages.push(stage);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<&Stage, PipelineError> {
        self.index
            .get(key)
            .map(|&i| &self.stages[i])
            .ok_or_else(|| PipelineError::UnknownStage(key.to_string()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Zero-based position of a stage in the pipeline order.
    pub fn position(&self, key: &str) -> Result<usize, PipelineError> {
        self.index
            .get(key)
            .copied()
            .ok_or_else(|| PipelineError::UnknownStage(key.to_string()))
    }

    /// Keys in fixed pipeline order.
    pub fn order(&self) -> impl Iterator<Item = &str> {
        self.stages.iter().map(|s| s.key.as_str())
    }

    /// Keys of stages that produce an artifact document.
    pub fn artifact_stages(&self) -> Vec<&str> {
        self.stages
            .iter()
            .filter(|s| s.artifact_path.is_some())
            .map(|s| s.key.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }
}

/// Display label for a supported model id.
pub fn model_label(model: &str) -> Result<&'static str, PipelineError> {
    match model {
        "gpt-5-codex" => Ok("GPT-5 Codex"),
        "gpt-5-pro" => Ok("GPT-5 Pro"),
        other => Err(PipelineError::UnsupportedModel(other.to_string())),
    }
}

/// Model ids accepted by `init --model`.
pub const SUPPORTED_MODELS: &[&str] = &["gpt-5-codex", "gpt-5-pro"];

#[cfg(test)]
pub(crate) fn test_stage(key: &str, checklist: Option<&[&str]>, artifact: Option<&str>) -> Stage {
    Stage {
        key: key.to_string(),
        title: key.to_uppercase(),
        description: String::new(),
        instructions: String::new(),
        system_prompt: None,
        kickoff_prompt: None,
        ready_checklist: checklist.map(|items| items.iter().map(|s| s.to_string()).collect()),
        artifact_path: artifact.map(str::to_string),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_rejects_duplicate_key() {
        let mut catalog = StageCatalog::new();
        catalog.register(test_stage("a", None, None)).unwrap();
        let err = catalog.register(test_stage("a", None, None)).unwrap_err();
        assert_eq!(err, PipelineError::DuplicateStage("a".to_string()));
    }

    #[test]
    fn test_get_unknown_stage() {
        let catalog = StageCatalog::standard();
        let err = catalog.get("nope").unwrap_err();
        assert_eq!(err, PipelineError::UnknownStage("nope".to_string()));
    }

    #[test]
    fn test_order_is_registration_order() {
        let mut catalog = StageCatalog::new();
        catalog.register(test_stage("first", None, None)).unwrap();
        catalog.register(test_stage("second", None, None)).unwrap();
        catalog.register(test_stage("third", None, None)).unwrap();
        let order: Vec<&str> = catalog.order().collect();
        assert_eq!(order, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_artifact_stages_subset() {
        let mut catalog = StageCatalog::new();
        catalog.register(test_stage("loop", None, None)).unwrap();
        catalog
            .register(test_stage("doc", None, Some("artifacts/doc.md")))
            .unwrap();
        assert_eq!(catalog.artifact_stages(), vec!["doc"]);
    }

    #[test]
    fn test_standard_catalog_shape() {
        let catalog = StageCatalog::standard();
        assert_eq!(catalog.len(), 7);
        let order: Vec<&str> = catalog.order().collect();
        assert_eq!(order[0], "requirements_loop");
        assert_eq!(order[6], "ready_gate");
        // Every stage after the discovery loop that produces a document
        // declares its artifact path.
        assert!(catalog.artifact_stages().contains(&"requirements_doc"));
        assert!(!catalog.artifact_stages().contains(&"requirements_loop"));
    }

    #[test]
    fn test_prompt_rendering_substitutes_placeholders() {
        let catalog = StageCatalog::standard();
        let stage = catalog.get("requirements_loop").unwrap();
        let ctx = PromptContext {
            project_name: "demo",
            model_label: "GPT-5 Codex",
            concept: "a tiny notes app",
        };
        let prompt = stage.render_system_prompt(&ctx).unwrap();
        assert!(prompt.contains("GPT-5 Codex"));
        assert!(prompt.contains("demo"));
        assert!(!prompt.contains("{{"));
        // Checklist items are inlined as bullets.
        assert!(prompt.contains("- Primary user personas identified"));
    }

    #[test]
    fn test_model_label() {
        assert_eq!(model_label("gpt-5-pro").unwrap(), "GPT-5 Pro");
        assert_eq!(
            model_label("gpt-4").unwrap_err(),
            PipelineError::UnsupportedModel("gpt-4".to_string())
        );
    }
}
