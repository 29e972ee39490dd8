//! Planner reply parsing
//!
//! Models wrap their JSON in prose and code fences, so the task list is dug
//! out of the widest bracketed span before decoding. Anything unusable falls
//! back to a single default task.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Deserializer, Map, Value};

use super::task::{Task, TaskPlan};

static ARRAY_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[.*\]").expect("valid regex"));
static OBJECT_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));

/// Turn a planner reply into a task plan
///
/// Element ids follow their position in the reply, so skipped elements leave
/// gaps that `depends_on` references still line up with.
pub fn parse_plan(response: &str, query: &str, fallback_tool: &str) -> TaskPlan {
    let Some(elements) = extract_task_list(response) else {
        log::warn!("No JSON task list in planner reply, falling back to {}", fallback_tool);
        return TaskPlan::fallback(query, fallback_tool);
    };

    let mut tasks = Vec::with_capacity(elements.len());
    for (idx, element) in elements.iter().enumerate() {
        match Task::from_value(idx + 1, element) {
            Ok(task) => tasks.push(task),
            Err(e) => log::warn!("Skipping malformed planner task: {}", e),
        }
    }

    if tasks.is_empty() {
        log::warn!("Planner reply held no usable tasks, falling back to {}", fallback_tool);
        return TaskPlan::fallback(query, fallback_tool);
    }

    TaskPlan::parsed(tasks)
}

/// The raw task elements in a reply: a JSON array, a `{"tasks": [...]}`
/// wrapper, or a single task object
///
/// When both an array and an object decode, the one that starts first is the
/// reply's outer value; the other is nested inside it.
fn extract_task_list(response: &str) -> Option<Vec<Value>> {
    let array = find_json(response, &ARRAY_SPAN, '[', is_task_array);
    let object = find_json(response, &OBJECT_SPAN, '{', Value::is_object);

    let value = match (array, object) {
        (Some((array_start, array)), Some((object_start, object))) => {
            if array_start < object_start {
                array
            } else {
                object
            }
        }
        (Some((_, array)), None) => array,
        (None, Some((object_start, object))) => {
            // An object from inside a task array that failed to decode would
            // be only part of the plan
            if opens_task_array(&response[..=object_start]) {
                log::warn!("Planner task list did not decode as a whole");
                return None;
            }
            object
        }
        (None, None) => return None,
    };

    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut obj) => match obj.remove("tasks") {
            Some(Value::Array(items)) => Some(items),
            Some(other) => {
                obj.insert("tasks".to_string(), other);
                Some(vec![Value::Object(obj)])
            }
            None => Some(vec![Value::Object(obj)]),
        },
        _ => None,
    }
}

fn is_task_array(value: &Value) -> bool {
    match value {
        Value::Array(items) => items.is_empty() || items.iter().any(Value::is_object),
        _ => false,
    }
}

/// Whether `text` holds a `[` directly followed by an object
fn opens_task_array(text: &str) -> bool {
    text.match_indices('[')
        .any(|(idx, _)| text[idx + 1..].trim_start().starts_with('{'))
}

/// First JSON object in `text`, used for resolver replies
pub fn extract_json_object(text: &str) -> Option<Map<String, Value>> {
    match find_json(text, &OBJECT_SPAN, '{', Value::is_object)?.1 {
        Value::Object(obj) => Some(obj),
        _ => None,
    }
}

/// Decode the widest span matching `span`; if that fails or is not `usable`
/// (prose with stray brackets), decode a value at each `open` in turn and keep
/// the first usable one. Returns the byte offset the value starts at.
fn find_json(
    text: &str,
    span: &Regex,
    open: char,
    usable: fn(&Value) -> bool,
) -> Option<(usize, Value)> {
    if let Some(found) = span.find(text)
        && let Ok(value) = serde_json::from_str::<Value>(found.as_str())
        && usable(&value)
    {
        return Some((found.start(), value));
    }

    text.match_indices(open).find_map(|(start, _)| {
        let value = Deserializer::from_str(&text[start..])
            .into_iter::<Value>()
            .next()?
            .ok()?;
        usable(&value).then_some((start, value))
    })
}
