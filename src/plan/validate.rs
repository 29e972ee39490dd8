//! Plan validation - registry filtering and dependency ordering

use std::collections::{BTreeSet, HashMap, HashSet};

use super::task::{PlanSource, Task, TaskPlan};
use crate::tools::ToolRegistry;

/// A plan that only names registered tools, in an order where every
/// dependency runs before its dependents
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedPlan {
    pub tasks: Vec<Task>,
    pub source: PlanSource,
    /// Tool names the planner asked for that the registry does not have
    pub rejected: Vec<String>,
    /// Non-fatal findings (missing parameters, cycles, truncation)
    pub warnings: Vec<String>,
}

impl ValidatedPlan {
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Filter a plan against the registry and order it by `depends_on`
///
/// `max_tasks` of 0 means no limit.
pub fn validate_plan(plan: TaskPlan, registry: &ToolRegistry, max_tasks: usize) -> ValidatedPlan {
    let mut rejected = Vec::new();
    let mut warnings = Vec::new();

    let mut kept: Vec<Task> = Vec::with_capacity(plan.tasks.len());
    for task in plan.tasks {
        if registry.has_tool(&task.tool_name) {
            kept.push(task);
        } else {
            log::warn!("Invalid tool name: {}. Skipping this task.", task.tool_name);
            rejected.push(task.tool_name);
        }
    }

    prune_dependencies(&mut kept, &mut warnings);
    let mut ordered = topological_order(kept, &mut warnings);

    if max_tasks > 0 && ordered.len() > max_tasks {
        let dropped: Vec<String> = ordered[max_tasks..]
            .iter()
            .map(|t| t.tool_name.clone())
            .collect();
        log::warn!("Plan has {} tasks, keeping the first {}", ordered.len(), max_tasks);
        warnings.push(format!(
            "plan truncated to {} tasks, dropped: {}",
            max_tasks,
            dropped.join(", ")
        ));
        ordered.truncate(max_tasks);
    }

    for task in &ordered {
        let missing = registry.missing_required(&task.tool_name, &task.params_value());
        if !missing.is_empty() {
            warnings.push(format!(
                "task {} ({}) is missing required parameters: {}",
                task.id,
                task.tool_name,
                missing.join(", ")
            ));
        }
    }

    ValidatedPlan {
        tasks: ordered,
        source: plan.source,
        rejected,
        warnings,
    }
}

/// Drop self references and references to ids that are not in the plan
fn prune_dependencies(tasks: &mut [Task], warnings: &mut Vec<String>) {
    let known: HashSet<usize> = tasks.iter().map(|t| t.id).collect();

    for task in tasks.iter_mut() {
        let before = task.depends_on.len();
        let id = task.id;
        task.depends_on.retain(|dep| *dep != id && known.contains(dep));

        if task.depends_on.len() != before {
            warnings.push(format!(
                "task {} ({}) referenced unknown or rejected tasks",
                task.id, task.tool_name
            ));
        }
    }
}

/// Kahn's algorithm with ties broken by planner order; tasks stuck in a cycle
/// are appended afterwards with their unsatisfiable edges removed
fn topological_order(tasks: Vec<Task>, warnings: &mut Vec<String>) -> Vec<Task> {
    let index_of: HashMap<usize, usize> = tasks
        .iter()
        .enumerate()
        .map(|(idx, t)| (t.id, idx))
        .collect();

    let mut indegree = vec![0usize; tasks.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tasks.len()];
    for (idx, task) in tasks.iter().enumerate() {
        for dep in &task.depends_on {
            if let Some(&dep_idx) = index_of.get(dep) {
                indegree[idx] += 1;
                dependents[dep_idx].push(idx);
            }
        }
    }

    let mut ready: BTreeSet<usize> = (0..tasks.len()).filter(|idx| indegree[*idx] == 0).collect();
    let mut order = Vec::with_capacity(tasks.len());
    while let Some(idx) = ready.pop_first() {
        order.push(idx);
        for &next in &dependents[idx] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                ready.insert(next);
            }
        }
    }

    let placed: HashSet<usize> = order.iter().copied().collect();
    let stuck: Vec<usize> = (0..tasks.len()).filter(|idx| !placed.contains(idx)).collect();
    if !stuck.is_empty() {
        let ids: Vec<String> = stuck.iter().map(|idx| tasks[*idx].id.to_string()).collect();
        log::warn!(
            "Dependency cycle between tasks {}, running them in planner order",
            ids.join(", ")
        );
        warnings.push(format!("dependency cycle between tasks {}", ids.join(", ")));
        order.extend(stuck);
    }

    let mut slots: Vec<Option<Task>> = tasks.into_iter().map(Some).collect();
    let mut ordered = Vec::with_capacity(slots.len());
    let mut seen: HashSet<usize> = HashSet::new();
    for idx in order {
        if let Some(mut task) = slots[idx].take() {
            task.depends_on.retain(|dep| seen.contains(dep));
            seen.insert(task.id);
            ordered.push(task);
        }
    }
    ordered
}
