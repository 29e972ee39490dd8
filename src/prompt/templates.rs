//! Built-in prompts and the set of compiled templates used by a run

use std::path::Path;

use serde::Serialize;

use super::{PromptLoader, PromptRenderer};
use crate::error::Result;

pub const PLAN_SYSTEM: &str = "plan_system";
pub const PLAN_USER: &str = "plan_user";
pub const RESOLVE_SYSTEM: &str = "resolve_system";
pub const RESOLVE_USER: &str = "resolve_user";
pub const SYNTHESIS_SYSTEM: &str = "synthesis_system";

const BUILTIN: &[(&str, &str)] = &[
    (
        PLAN_SYSTEM,
        r#"You are a helpful assistant that breaks down complex queries into separate tasks.

These are the ONLY tools available to you:
{{tools}}

For each task, you MUST specify a tool_name that EXACTLY matches one of the available tool names listed above.
Format your response as a JSON array of task objects, where each task has 'tool_name' and 'parameters' fields.
The tool_name MUST be one of the exact tool names provided.
DO NOT invent or hallucinate tool names that aren't in the list.

When a task needs the output of an earlier task, add a 'depends_on' field listing the 1-based positions of those earlier tasks, and put a placeholder such as {{placeholder}} in the parameter that should receive the earlier result."#,
    ),
    (PLAN_USER, "Break down this query into separate subtasks: '{{query}}'"),
    (
        RESOLVE_SYSTEM,
        "You complete tool parameters using the results of tasks that already ran. \
         Respond with ONLY a JSON object holding the complete parameters for the tool, with no commentary.",
    ),
    (
        RESOLVE_USER,
        r#"Original request: '{{query}}'

Tool to call:
{{tool_definition}}

Current parameters:
{{parameters}}

Results of earlier tasks:
{{prior_results}}

Replace every placeholder or missing required value with concrete content taken from the results above. Keep parameters that are already concrete."#,
    ),
    (
        SYNTHESIS_SYSTEM,
        "You are a helpful assistant that responds to user queries by sequentially executing appropriate tools and providing a comprehensive final answer.",
    ),
];

/// The templates a run renders, compiled once
pub struct PromptSet {
    renderer: PromptRenderer,
}

impl PromptSet {
    /// Built-in templates only
    pub fn builtin() -> Result<Self> {
        let mut renderer = PromptRenderer::new();
        for (name, template) in BUILTIN {
            renderer.register_template(name, template)?;
        }
        Ok(Self { renderer })
    }

    /// Built-in templates, replaced by `<dir>/<name>.md` where present
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        let loader = PromptLoader::new(dir);
        let mut renderer = PromptRenderer::new();
        for (name, template) in BUILTIN {
            let source = loader.load_or(name, template)?;
            renderer.register_template(name, &source)?;
        }
        Ok(Self { renderer })
    }

    /// Built-ins, or overrides when a prompts directory is configured
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        match dir {
            Some(dir) => Self::with_overrides(dir),
            None => Self::builtin(),
        }
    }

    pub fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String> {
        self.renderer.render_named(name, context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_plan_prompts() {
        let prompts = PromptSet::builtin().unwrap();

        let system = prompts
            .render(PLAN_SYSTEM, &json!({"tools": "[\"web_search\"]", "placeholder": "{{task_1}}"}))
            .unwrap();
        assert!(system.contains("These are the ONLY tools available to you:\n[\"web_search\"]"));
        assert!(system.contains("such as {{task_1}} in the parameter"));

        let user = prompts.render(PLAN_USER, &json!({"query": "Weather in Ontario?"})).unwrap();
        assert_eq!(user, "Break down this query into separate subtasks: 'Weather in Ontario?'");
    }

    #[test]
    fn test_every_builtin_is_registered() {
        let prompts = PromptSet::builtin().unwrap();
        for (name, _) in BUILTIN {
            assert!(prompts.render(name, &json!({})).is_ok(), "{} failed to render", name);
        }
    }

    #[test]
    fn test_overrides_replace_builtins() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("synthesis_system.md"), "Answer in one sentence.").unwrap();

        let prompts = PromptSet::load(Some(dir.path())).unwrap();
        assert_eq!(
            prompts.render(SYNTHESIS_SYSTEM, &json!({})).unwrap(),
            "Answer in one sentence."
        );
        assert!(
            prompts
                .render(PLAN_USER, &json!({"query": "x"}))
                .unwrap()
                .starts_with("Break down")
        );
    }

    #[test]
    fn test_broken_override_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("plan_user.md"), "{{#each}}").unwrap();

        assert!(PromptSet::with_overrides(dir.path()).is_err());
    }
}
