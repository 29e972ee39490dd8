//! Terminal rendering of a query outcome

use colored::*;

use taskpilot::orchestrator::{QueryOutcome, TaskResult};
use taskpilot::plan::PlanSource;
use taskpilot::tools::ToolRegistry;

/// Characters of each tool result shown before eliding
pub const RESULT_PREVIEW_CHARS: usize = 150;

/// First `limit` characters of `text`, with `...` when cut
pub fn preview(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

fn render_task(result: &TaskResult) -> String {
    let label = if result.is_error {
        result.tool_name.red()
    } else {
        result.tool_name.green()
    };
    let resolved = if result.resolved {
        " (resolved)".dimmed().to_string()
    } else {
        String::new()
    };

    format!(
        "{} {}{}\n{} {}\n{} {}\n",
        format!("Task {}:", result.task_number).bold(),
        label,
        resolved,
        "Parameters:".cyan(),
        result.params_value(),
        "Result:".cyan(),
        preview(&result.result_text(), RESULT_PREVIEW_CHARS)
    )
}

/// Per-task results followed by the final answer
pub fn render_outcome(outcome: &QueryOutcome, verbose: bool) -> String {
    let mut out = String::new();

    if outcome.plan_source == PlanSource::Fallback {
        out.push_str(&format!(
            "{}\n",
            "Planner reply was unusable; ran a single fallback task".yellow()
        ));
    }
    for tool in &outcome.rejected_tools {
        out.push_str(&format!("{} {}\n", "Skipped unknown tool:".yellow(), tool));
    }
    if verbose {
        for warning in &outcome.warnings {
            out.push_str(&format!("{} {}\n", "Warning:".yellow(), warning));
        }
    }

    out.push_str(&format!("\n{}\n", "--- Results from Each Tool ---".bold()));
    for result in &outcome.results {
        out.push_str(&render_task(result));
        out.push('\n');
    }

    out.push_str(&format!("\n{}\n{}\n", "--- Final Answer ---".bold(), outcome.final_answer));

    if verbose {
        out.push_str(&format!(
            "\n{}\n",
            format!(
                "tokens: {} prompt + {} completion",
                outcome.usage.prompt_tokens, outcome.usage.completion_tokens
            )
            .dimmed()
        ));
    }

    out
}

/// One line per registered tool with its parameters
pub fn render_tools(registry: &ToolRegistry) -> String {
    let mut out = String::new();
    for definition in registry.definitions() {
        let params: Vec<String> = definition
            .input_schema
            .get("properties")
            .and_then(|p| p.as_object())
            .map(|props| {
                let required = definition.required_params();
                props
                    .keys()
                    .map(|k| {
                        if required.contains(&k.as_str()) {
                            k.clone()
                        } else {
                            format!("{}?", k)
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        out.push_str(&format!(
            "{} ({})\n    {}\n",
            definition.name.green().bold(),
            params.join(", "),
            definition.description
        ));
    }
    out
}
