//! Dependency resolution helpers
//!
//! Decides which tasks need their parameters rewritten from earlier results,
//! which earlier results they refer to, and how those results are condensed
//! for the resolver prompt.

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use super::outcome::TaskResult;
use crate::plan::Task;

/// `{{task_2}}`, `<result of task 2>`, `[task 2]`, `$task_2`, `{{ task-2.output }}`
static TASK_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\{\{|\[|<|\$)\s*(?:(?:the\s+)?(?:results?|output)\s+(?:of|from)\s+)?task[_\s-]?(\d+)")
        .expect("valid regex")
});

/// Placeholders that do not name a task: `{{weather}}`, `<insert weather here>`, `[result]`
static GENERIC_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\{\{[^{}]*\}\}|<[^<>]*\b(?:insert|result|output|previous)\b[^<>]*>|\[[^\[\]]*\b(?:insert|result|output|previous)\b[^\[\]]*\]")
        .expect("valid regex")
});

fn for_each_string<'a>(value: &'a Value, visit: &mut impl FnMut(&'a str)) {
    match value {
        Value::String(s) => visit(s),
        Value::Array(items) => {
            for item in items {
                for_each_string(item, visit);
            }
        }
        Value::Object(map) => {
            for item in map.values() {
                for_each_string(item, visit);
            }
        }
        _ => {}
    }
}

/// Task ids named by placeholders anywhere in `parameters`
pub fn referenced_task_ids(parameters: &Map<String, Value>) -> BTreeSet<usize> {
    let mut ids = BTreeSet::new();
    for value in parameters.values() {
        for_each_string(value, &mut |s| {
            ids.extend(
                TASK_REFERENCE
                    .captures_iter(s)
                    .filter_map(|c| c.get(1))
                    .filter_map(|m| m.as_str().parse::<usize>().ok()),
            );
        });
    }
    ids
}

/// Whether any string parameter holds a placeholder
pub fn has_placeholder(parameters: &Map<String, Value>) -> bool {
    let mut found = false;
    for value in parameters.values() {
        for_each_string(value, &mut |s| {
            found |= TASK_REFERENCE.is_match(s) || GENERIC_PLACEHOLDER.is_match(s);
        });
    }
    found
}

/// A task needs resolving when it declares dependencies or carries placeholders
pub fn needs_resolution(task: &Task) -> bool {
    !task.depends_on.is_empty() || has_placeholder(&task.parameters)
}

/// Earlier results a task refers to; all of them when nothing can be attributed
pub fn select_prior<'a>(task: &Task, prior: &'a [TaskResult]) -> Vec<&'a TaskResult> {
    let mut wanted: BTreeSet<usize> = task.depends_on.iter().copied().collect();
    wanted.extend(referenced_task_ids(&task.parameters));

    let selected: Vec<&TaskResult> = prior.iter().filter(|r| wanted.contains(&r.task_id)).collect();
    if selected.is_empty() {
        prior.iter().collect()
    } else {
        selected
    }
}

/// Cut `text` to at most `limit` characters on a char boundary
fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// One line per earlier result, long results cut to `limit` characters
pub fn condense_result(result: &TaskResult, limit: usize) -> String {
    let text = result.result_text();
    let total = text.chars().count();
    let summary = if limit == 0 || total <= limit {
        text
    } else {
        format!("{}... ({} chars total)", truncate_chars(&text, limit), total)
    };

    let outcome = if result.is_error { "failed" } else { "succeeded" };
    format!(
        "Task {} ({}) {}: {}",
        result.task_id, result.tool_name, outcome, summary
    )
}

/// Keys a reply may carry next to `parameters` when it echoes a tool definition
const ENVELOPE_KEYS: &[&str] = &["parameters", "name", "tool_name", "description"];

/// Parameters from a resolver reply, unwrapping `{"parameters": {...}}` and
/// echoed `{name, description, parameters}` envelopes
pub fn unwrap_parameters(mut reply: Map<String, Value>) -> Map<String, Value> {
    let is_envelope = reply.keys().all(|k| ENVELOPE_KEYS.contains(&k.as_str()));
    if is_envelope
        && matches!(reply.get("parameters"), Some(Value::Object(_)))
        && let Some(Value::Object(inner)) = reply.remove("parameters")
    {
        return inner;
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    fn prior(task_id: usize, tool: &str, result: Value) -> TaskResult {
        TaskResult {
            task_number: task_id,
            task_id,
            tool_name: tool.to_string(),
            parameters: Map::new(),
            result,
            is_error: false,
            resolved: false,
        }
    }

    #[test]
    fn test_referenced_task_ids() {
        let p = params(json!({
            "body": "Weather: {{task_1}} and time <result of task 3>",
            "subject": "[task 2]",
            "extra": ["$task_4", {"nested": "{{ task-5.output }}"}]
        }));
        let ids: Vec<usize> = referenced_task_ids(&p).into_iter().collect();
        assert_eq!(ids, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_plain_text_is_not_a_reference() {
        let p = params(json!({"query": "task 3 of the project plan", "to": "task2@example.com"}));
        assert!(referenced_task_ids(&p).is_empty());
        assert!(!has_placeholder(&p));
    }

    #[test]
    fn test_generic_placeholders() {
        assert!(has_placeholder(&params(json!({"body": "{{weather_info}}"}))));
        assert!(has_placeholder(&params(json!({"body": "<insert weather here>"}))));
        assert!(has_placeholder(&params(json!({"text": "[result from search]"}))));
        assert!(!has_placeholder(&params(json!({"to": "Bob <bob@example.com>"}))));
    }

    #[test]
    fn test_needs_resolution() {
        let plain = Task::new(1, "get_weather", params(json!({"location": "Ontario"})));
        assert!(!needs_resolution(&plain));

        let dependent = plain.clone().with_depends_on(vec![2]);
        assert!(needs_resolution(&dependent));

        let templated = Task::new(2, "send_email", params(json!({"body": "{{task_1}}"})));
        assert!(needs_resolution(&templated));
    }

    #[test]
    fn test_select_prior() {
        let results = vec![
            prior(1, "get_weather", json!({"temp": 21})),
            prior(2, "findDateTime", json!({"time": "10:00"})),
        ];

        let task = Task::new(3, "send_email", params(json!({"body": "{{task_2}}"})));
        let selected = select_prior(&task, &results);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].task_id, 2);

        let unattributed = Task::new(3, "send_email", params(json!({"body": "{{weather}}"})));
        assert_eq!(select_prior(&unattributed, &results).len(), 2);
    }

    #[test]
    fn test_condense_result() {
        let short = prior(1, "get_weather", json!("Sunny"));
        assert_eq!(condense_result(&short, 100), "Task 1 (get_weather) succeeded: Sunny");

        let long = prior(2, "web_search", json!("é".repeat(50)));
        let condensed = condense_result(&long, 10);
        assert_eq!(
            condensed,
            format!(
                "Task 2 (web_search) succeeded: {}... (50 chars total)",
                "é".repeat(10)
            )
        );

        let mut failed = prior(3, "send_email", json!("SMTP_SERVER is not configured"));
        failed.is_error = true;
        assert!(condense_result(&failed, 100).contains("failed: SMTP_SERVER"));
    }

    #[test]
    fn test_unwrap_parameters() {
        let wrapped = params(json!({"parameters": {"to": "a@example.com"}}));
        assert_eq!(unwrap_parameters(wrapped), params(json!({"to": "a@example.com"})));

        let flat = params(json!({"to": "a@example.com", "parameters": "x"}));
        assert_eq!(unwrap_parameters(flat.clone()), flat);
    }

    #[test]
    fn test_unwrap_echoed_tool_definition() {
        let echoed = params(json!({
            "name": "send_email",
            "description": "Send an email",
            "parameters": {"to": "a@example.com", "body": "Sunny"}
        }));
        assert_eq!(
            unwrap_parameters(echoed),
            params(json!({"to": "a@example.com", "body": "Sunny"}))
        );

        let tool_named =
            params(json!({"tool_name": "get_weather", "parameters": {"location": "Pune"}}));
        assert_eq!(unwrap_parameters(tool_named), params(json!({"location": "Pune"})));

        // A real parameter next to `parameters` means the object is the parameter set
        let mixed = params(json!({"name": "x", "to": "a@example.com", "parameters": {"a": 1}}));
        assert_eq!(unwrap_parameters(mixed.clone()), mixed);
    }
}
