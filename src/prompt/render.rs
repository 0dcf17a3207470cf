//! Prompt Renderer - Render fix prompts with Handlebars
//!
//! Two templates are registered at construction: the build prompt sent with
//! the first dispatch of a run, and the debug prompt sent with every later one.

use handlebars::Handlebars;
use serde::Serialize;

use crate::error::{AutoTddError, Result};

/// Name of the first-dispatch template
pub const BUILD_TEMPLATE: &str = "build";

/// Name of the retry template
pub const DEBUG_TEMPLATE: &str = "debug";

const BUILD_PROMPT: &str = r#"AUTONOMOUS MODE: Implement the following requirements using TDD.
{{#if system_instructions}}

SYSTEM INSTRUCTIONS:
{{system_instructions}}
{{/if}}

PROJECT REQUIREMENTS:
{{requirements}}

INSTRUCTIONS:
1. Write tests FIRST in {{tests_dir}}/ (import from {{source_dir}}/, NO hardcoding)
2. Implement code in {{source_dir}}/
3. Make tests pass
4. Report completion
{{#if failure_output}}

Current test results:
{{failure_output}}
{{/if}}

Begin implementation now."#;

const DEBUG_PROMPT: &str = r#"AUTONOMOUS DEBUGGING - Iteration {{iteration}}

Test results:
{{failure_output}}

PROJECT REQUIREMENTS:
{{requirements}}

INSTRUCTIONS:
1. Analyze the error
2. Identify the bug in {{source_dir}}/ code
3. Fix the code (DO NOT modify tests)
4. The tests will run automatically next

Fix the issue now."#;

/// Values available to the fix prompt templates
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    pub iteration: u32,
    pub requirements: String,
    pub system_instructions: Option<String>,
    pub failure_output: Option<String>,
    pub source_dir: String,
    pub tests_dir: String,
}

/// Renders fix prompts using Handlebars templating
pub struct PromptRenderer {
    handlebars: Handlebars<'static>,
}

impl PromptRenderer {
    /// Create a renderer with the built-in build and debug templates registered
    pub fn new() -> Result<Self> {
        let mut handlebars = Handlebars::new();
        handlebars.set_strict_mode(false);
        // Test output is code, never HTML
        handlebars.register_escape_fn(handlebars::no_escape);

        let mut renderer = Self { handlebars };
        renderer.register_template(BUILD_TEMPLATE, BUILD_PROMPT)?;
        renderer.register_template(DEBUG_TEMPLATE, DEBUG_PROMPT)?;
        Ok(renderer)
    }

    /// Register (or replace) a named template
    pub fn register_template(&mut self, name: &str, template: &str) -> Result<()> {
        self.handlebars
            .register_template_string(name, template)
            .map_err(|e| AutoTddError::Prompt(format!("Failed to register template '{}': {}", name, e)))
    }

    /// Render a registered template with any serializable context
    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        self.handlebars
            .render(name, context)
            .map_err(|e| AutoTddError::Prompt(format!("Failed to render template '{}': {}", name, e)))
    }

    /// Check if a named template is registered
    pub fn has_template(&self, name: &str) -> bool {
        self.handlebars.get_template(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> PromptContext {
        PromptContext {
            iteration: 1,
            requirements: "Add two numbers".to_string(),
            system_instructions: None,
            failure_output: None,
            source_dir: "src".to_string(),
            tests_dir: "tests".to_string(),
        }
    }

    #[test]
    fn test_builtin_templates_registered() {
        let renderer = PromptRenderer::new().unwrap();
        assert!(renderer.has_template(BUILD_TEMPLATE));
        assert!(renderer.has_template(DEBUG_TEMPLATE));
        assert!(!renderer.has_template("nonexistent"));
    }

    #[test]
    fn test_build_prompt_without_optional_sections() {
        let renderer = PromptRenderer::new().unwrap();
        let prompt = renderer.render(BUILD_TEMPLATE, &context()).unwrap();
        assert!(prompt.starts_with("AUTONOMOUS MODE"));
        assert!(prompt.contains("Add two numbers"));
        assert!(prompt.contains("Write tests FIRST in tests/"));
        assert!(!prompt.contains("SYSTEM INSTRUCTIONS"));
        assert!(!prompt.contains("Current test results"));
    }

    #[test]
    fn test_build_prompt_with_instructions_and_output() {
        let renderer = PromptRenderer::new().unwrap();
        let mut ctx = context();
        ctx.system_instructions = Some("Never hardcode".to_string());
        ctx.failure_output = Some("E   ModuleNotFoundError".to_string());

        let prompt = renderer.render(BUILD_TEMPLATE, &ctx).unwrap();
        assert!(prompt.contains("SYSTEM INSTRUCTIONS:\nNever hardcode"));
        assert!(prompt.contains("Current test results:\nE   ModuleNotFoundError"));
    }

    #[test]
    fn test_debug_prompt() {
        let renderer = PromptRenderer::new().unwrap();
        let mut ctx = context();
        ctx.iteration = 4;
        ctx.failure_output = Some("assert add(1, 2) == 3".to_string());

        let prompt = renderer.render(DEBUG_TEMPLATE, &ctx).unwrap();
        assert!(prompt.starts_with("AUTONOMOUS DEBUGGING - Iteration 4"));
        assert!(prompt.contains("assert add(1, 2) == 3"));
        assert!(prompt.contains("DO NOT modify tests"));
    }

    #[test]
    fn test_no_escape_of_test_output() {
        let renderer = PromptRenderer::new().unwrap();
        let mut ctx = context();
        ctx.failure_output = Some("expected <list> & got 'None'".to_string());

        let prompt = renderer.render(DEBUG_TEMPLATE, &ctx).unwrap();
        assert!(prompt.contains("expected <list> & got 'None'"));
    }

    #[test]
    fn test_register_override() {
        let mut renderer = PromptRenderer::new().unwrap();
        renderer.register_template(DEBUG_TEMPLATE, "fix {{iteration}}").unwrap();
        let prompt = renderer.render(DEBUG_TEMPLATE, &context()).unwrap();
        assert_eq!(prompt, "fix 1");
    }

    #[test]
    fn test_render_unknown_template_errors() {
        let renderer = PromptRenderer::new().unwrap();
        let err = renderer.render("missing", &context()).unwrap_err();
        assert!(matches!(err, AutoTddError::Prompt(_)));
    }
}
