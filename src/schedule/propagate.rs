//! Earliest-start propagation.
//!
//! Propagation is single-pass: a task's start is derived from the stored
//! finish of its direct dependencies at the moment it is added or edited.
//! Moving a dependency later does not shift tasks that were placed before
//! the move; callers wanting full consistency use [`recompute_all`].

use std::collections::HashMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;
use tracing::debug;
use uuid::Uuid;

use crate::error::ScheduleError;
use crate::model::Task;

/// Latest finish among the dependencies that still exist in `tasks`.
/// Stale ids are skipped. `None` when no dependency resolves.
pub fn latest_dependency_finish(dependencies: &[Uuid], tasks: &[Task]) -> Option<f64> {
    dependencies
        .iter()
        .filter_map(|dep| tasks.iter().find(|t| t.id == *dep))
        .map(Task::finish)
        .fold(None, |acc, end| Some(acc.map_or(end, |a: f64| a.max(end))))
}

/// Earliest feasible start for a task declaring `own_start` and waiting on
/// `dependencies`.
pub fn earliest_start(own_start: Option<f64>, dependencies: &[Uuid], tasks: &[Task]) -> f64 {
    let own = own_start.unwrap_or(0.0);
    if dependencies.is_empty() {
        return own;
    }
    let max_end = latest_dependency_finish(dependencies, tasks).unwrap_or(0.0);
    own.max(max_end)
}

/// Earliest feasible start for `task` given the stored schedule.
pub fn compute_start(task: &Task, tasks: &[Task]) -> f64 {
    earliest_start(Some(task.start), &task.dependencies, tasks)
}

/// Re-apply [`compute_start`] to every task in dependency order.
///
/// Returns the number of tasks whose start moved.
pub fn recompute_all(tasks: &mut [Task]) -> Result<usize, ScheduleError> {
    let mut graph: DiGraphMap<Uuid, ()> = DiGraphMap::new();
    for task in tasks.iter() {
        graph.add_node(task.id);
    }
    for task in tasks.iter() {
        for dep in &task.dependencies {
            if graph.contains_node(*dep) {
                graph.add_edge(*dep, task.id, ());
            }
        }
    }

    let order = toposort(&graph, None).map_err(|cycle| {
        let id = cycle.node_id();
        let task = tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| id.to_string());
        ScheduleError::CycleDetected { task }
    })?;

    let index: HashMap<Uuid, usize> = tasks.iter().enumerate().map(|(i, t)| (t.id, i)).collect();
    let mut moved = 0usize;
    for id in order {
        let Some(&i) = index.get(&id) else { continue };
        let start = compute_start(&tasks[i], tasks);
        if start != tasks[i].start {
            debug!(task = %tasks[i].name, from = tasks[i].start, to = start, "shifted start");
            tasks[i].start = start;
            moved += 1;
        }
    }
    Ok(moved)
}
