//! Orchestrator - plan, resolve, execute, synthesize
//!
//! A query runs once through the pipeline:
//! 1. The planner turns the query into a JSON task list
//! 2. The list is parsed and validated against the registry
//! 3. Each task has its parameters resolved from earlier results if needed
//! 4. Each task runs through the registry; failures become error results
//! 5. The conversation trace goes to the model for the final answer

use std::sync::Arc;

use serde_json::{Map, Value, json};

use super::outcome::{QueryOutcome, TaskResult};
use super::resolver::{condense_result, needs_resolution, select_prior, unwrap_parameters};
use super::trace::build_trace;
use crate::config::OrchestratorConfig;
use crate::error::{Result, TaskpilotError};
use crate::llm::{CompletionRequest, LlmClient, Usage};
use crate::plan::{Task, ValidatedPlan, extract_json_object, parse_plan, validate_plan};
use crate::prompt::{
    PLAN_SYSTEM, PLAN_USER, PromptSet, RESOLVE_SYSTEM, RESOLVE_USER, SYNTHESIS_SYSTEM,
};
use crate::tools::{ToolContext, ToolRegistry};

/// Runs queries through the plan/execute/synthesize pipeline
pub struct Orchestrator<L: LlmClient> {
    llm: Arc<L>,
    registry: Arc<ToolRegistry>,
    ctx: ToolContext,
    prompts: PromptSet,
    config: OrchestratorConfig,
}

impl<L: LlmClient> Orchestrator<L> {
    pub fn new(
        llm: Arc<L>,
        registry: Arc<ToolRegistry>,
        ctx: ToolContext,
        prompts: PromptSet,
    ) -> Self {
        Self::with_config(llm, registry, ctx, prompts, OrchestratorConfig::default())
    }

    pub fn with_config(
        llm: Arc<L>,
        registry: Arc<ToolRegistry>,
        ctx: ToolContext,
        prompts: PromptSet,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            llm,
            registry,
            ctx,
            prompts,
            config,
        }
    }

    /// Process a query end to end
    ///
    /// LLM failures while planning or synthesizing are returned as errors.
    /// Tool failures are recorded in the results and never abort the run.
    pub async fn process_query(&self, query: &str) -> Result<QueryOutcome> {
        let query = query.trim();
        if query.is_empty() {
            return Err(TaskpilotError::Plan("query is empty".to_string()));
        }

        let mut usage = Usage::default();

        log::info!("Planning query: {}", query);
        let plan = self.plan(query, &mut usage).await?;
        log::info!(
            "Plan ({}) has {} task(s): {}",
            plan.source,
            plan.len(),
            plan.tasks
                .iter()
                .map(|t| t.tool_name.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        );
        for warning in &plan.warnings {
            log::debug!("Plan: {}", warning);
        }

        let mut results: Vec<TaskResult> = Vec::with_capacity(plan.len());
        for (idx, task) in plan.tasks.iter().enumerate() {
            let task_number = idx + 1;
            let (parameters, resolved) = self
                .resolve_parameters(query, task, &results, &mut usage)
                .await?;

            log::info!(
                "Task {}: executing {} with {}",
                task_number,
                task.tool_name,
                Value::Object(parameters.clone())
            );
            let output = self
                .registry
                .execute(&task.tool_name, Value::Object(parameters.clone()), &self.ctx)
                .await;

            results.push(TaskResult {
                task_number,
                task_id: task.id,
                tool_name: task.tool_name.clone(),
                parameters,
                result: output.content,
                is_error: output.is_error,
                resolved,
            });
        }

        log::info!("Synthesizing answer from {} result(s)", results.len());
        let final_answer = self.synthesize(query, &results, &mut usage).await?;

        Ok(QueryOutcome {
            query: query.to_string(),
            plan_source: plan.source,
            rejected_tools: plan.rejected,
            warnings: plan.warnings,
            results,
            final_answer,
            usage,
        })
    }

    /// Ask the planner for tasks, then parse and validate its reply
    pub async fn plan(&self, query: &str, usage: &mut Usage) -> Result<ValidatedPlan> {
        let system = self.prompts.render(
            PLAN_SYSTEM,
            &json!({
                "tools": self.registry.describe_for_planner(),
                "placeholder": "{{task_1}}",
            }),
        )?;
        let user = self.prompts.render(PLAN_USER, &json!({ "query": query }))?;

        let response = self
            .llm
            .complete(CompletionRequest::new(system).with_user_message(user))
            .await?;
        usage.add(&response.usage);
        log::debug!("Planner reply:\n{}", response.content);

        let plan = parse_plan(&response.content, query, &self.config.fallback_tool);
        Ok(validate_plan(plan, &self.registry, self.config.max_tasks))
    }

    /// Rewrite a task's parameters from earlier results
    ///
    /// Returns the parameters to run with and whether they were rewritten. Any
    /// resolver failure keeps the planner's parameters.
    async fn resolve_parameters(
        &self,
        query: &str,
        task: &Task,
        prior: &[TaskResult],
        usage: &mut Usage,
    ) -> Result<(Map<String, Value>, bool)> {
        if !self.config.resolve_dependencies || prior.is_empty() || !needs_resolution(task) {
            return Ok((task.parameters.clone(), false));
        }

        let Some(tool) = self.registry.get(&task.tool_name) else {
            return Ok((task.parameters.clone(), false));
        };

        let condensed: Vec<String> = select_prior(task, prior)
            .into_iter()
            .map(|r| condense_result(r, self.config.result_preview_chars))
            .collect();

        let definition = json!({
            "name": tool.name(),
            "description": tool.description(),
            "parameters": tool.input_schema(),
        });
        let user = self.prompts.render(
            RESOLVE_USER,
            &json!({
                "query": query,
                "tool_definition": serde_json::to_string_pretty(&definition)?,
                "parameters": serde_json::to_string_pretty(&task.parameters)?,
                "prior_results": condensed.join("\n"),
            }),
        )?;
        let system = self.prompts.render(RESOLVE_SYSTEM, &json!({}))?;

        log::info!("Resolving parameters for task {} ({})", task.id, task.tool_name);
        let response = match self
            .llm
            .complete(CompletionRequest::new(system).with_user_message(user))
            .await
        {
            Ok(response) => response,
            Err(e) => {
                log::warn!(
                    "Resolver call failed for task {}, keeping planner parameters: {}",
                    task.id,
                    e
                );
                return Ok((task.parameters.clone(), false));
            }
        };
        usage.add(&response.usage);
        log::debug!("Resolver reply for task {}:\n{}", task.id, response.content);

        match extract_json_object(&response.content).map(unwrap_parameters) {
            Some(parameters) if !parameters.is_empty() => Ok((parameters, true)),
            _ => {
                log::warn!(
                    "Resolver reply for task {} held no parameters, keeping planner parameters",
                    task.id
                );
                Ok((task.parameters.clone(), false))
            }
        }
    }

    /// Final call over the full conversation trace
    async fn synthesize(
        &self,
        query: &str,
        results: &[TaskResult],
        usage: &mut Usage,
    ) -> Result<String> {
        let system = self.prompts.render(SYNTHESIS_SYSTEM, &json!({}))?;
        let trace = build_trace(&system, query, results);

        let response = self.llm.complete(CompletionRequest::from_messages(trace)).await?;
        usage.add(&response.usage);

        Ok(response.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ToolsConfig;
    use crate::llm::{MockLlmClient, Role};
    use crate::plan::PlanSource;
    use crate::tools::{Tool, ToolError};
    use async_trait::async_trait;

    struct StubTool {
        name: &'static str,
        required: &'static str,
    }

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &'static str {
            self.name
        }

        fn description(&self) -> &'static str {
            "stub"
        }

        fn input_schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {self.required: {"type": "string", "description": "input"}},
                "required": [self.required]
            })
        }

        async fn execute(
            &self,
            params: Value,
            _ctx: &ToolContext,
        ) -> std::result::Result<Value, ToolError> {
            let value = crate::tools::require_str(&params, self.required)?;
            Ok(json!(format!("{} ran with {}", self.name, value)))
        }
    }

    fn orchestrator(mock: Arc<MockLlmClient>) -> Orchestrator<MockLlmClient> {
        let mut registry = ToolRegistry::new();
        registry.register(Box::new(StubTool {
            name: "lookup",
            required: "location",
        }));
        registry.register(Box::new(StubTool {
            name: "notify",
            required: "message",
        }));

        Orchestrator::new(
            mock,
            Arc::new(registry),
            ToolContext::new(ToolsConfig::default()).unwrap(),
            PromptSet::builtin().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected() {
        let mock = Arc::new(MockLlmClient::new());
        let err = orchestrator(mock.clone()).process_query("   ").await.unwrap_err();
        assert!(matches!(err, TaskpilotError::Plan(_)));
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_plan_prompt_lists_registry() {
        let mock = Arc::new(MockLlmClient::with_replies([
            r#"[{"tool_name": "lookup", "parameters": {"location": "Oslo"}}]"#,
        ]));
        let orch = orchestrator(mock.clone());

        let mut usage = Usage::default();
        let plan = orch.plan("Weather in Oslo", &mut usage).await.unwrap();
        assert_eq!(plan.source, PlanSource::Parsed);

        let request = &mock.requests()[0];
        let system = request.messages[0].content.clone().unwrap();
        assert!(system.contains("\"lookup\""));
        assert!(system.contains("\"notify\""));
        assert_eq!(request.messages[1].role, Role::User);
        assert_eq!(
            request.messages[1].content.as_deref(),
            Some("Break down this query into separate subtasks: 'Weather in Oslo'")
        );
    }

    #[tokio::test]
    async fn test_tool_failure_does_not_abort() {
        let mock = Arc::new(MockLlmClient::with_replies([
            r#"[{"tool_name": "lookup", "parameters": {}}]"#,
            "Sorry, the lookup failed.",
        ]));

        let outcome = orchestrator(mock).process_query("where?").await.unwrap();
        assert_eq!(outcome.results.len(), 1);
        assert!(outcome.results[0].is_error);
        assert!(outcome.results[0].result_text().contains("missing 'location' parameter"));
        assert_eq!(outcome.final_answer, "Sorry, the lookup failed.");
    }

    #[tokio::test]
    async fn test_resolver_failure_keeps_parameters() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push_reply(
            r#"[{"tool_name": "lookup", "parameters": {"location": "Oslo"}},
                {"tool_name": "notify", "parameters": {"message": "{{task_1}}"}, "depends_on": [1]}]"#,
        );
        mock.push_error("resolver overloaded");
        mock.push_reply("done");

        let outcome = orchestrator(mock.clone()).process_query("q").await.unwrap();
        assert_eq!(mock.call_count(), 3);
        assert!(!outcome.results[1].resolved);
        assert_eq!(outcome.results[1].parameters["message"], "{{task_1}}");
    }

    #[tokio::test]
    async fn test_resolution_disabled() {
        let mock = Arc::new(MockLlmClient::with_replies([
            r#"[{"tool_name": "lookup", "parameters": {"location": "Oslo"}},
                {"tool_name": "notify", "parameters": {"message": "{{task_1}}"}, "depends_on": [1]}]"#,
            "done",
        ]));
        let mut orch = orchestrator(mock.clone());
        orch.config.resolve_dependencies = false;

        let outcome = orch.process_query("q").await.unwrap();
        assert_eq!(mock.call_count(), 2);
        assert_eq!(outcome.results.len(), 2);
    }

    #[tokio::test]
    async fn test_planner_error_propagates() {
        let mock = Arc::new(MockLlmClient::new());
        mock.push_error("planner down");

        let err = orchestrator(mock).process_query("q").await.unwrap_err();
        assert!(err.to_string().contains("planner down"));
    }
}
