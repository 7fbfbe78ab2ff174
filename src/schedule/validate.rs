//! Input validation and dependency-cycle detection.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;
use crate::model::{Task, TaskDraft, DEFAULT_CATEGORY};

/// Limits and defaults applied to task drafts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rules {
    #[serde(default = "default_min_name_len")]
    pub min_name_len: usize,
    #[serde(default = "default_max_duration")]
    pub max_duration: f64,
    #[serde(default = "default_category")]
    pub default_category: String,
}

fn default_min_name_len() -> usize {
    2
}

fn default_max_duration() -> f64 {
    365.0
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Default for Rules {
    fn default() -> Self {
        Self {
            min_name_len: default_min_name_len(),
            max_duration: default_max_duration(),
            default_category: default_category(),
        }
    }
}

/// Check a draft's own fields and its name against `tasks`.
///
/// `exclude` names a task whose name may be reused, i.e. the task being edited.
pub fn validate_draft(
    draft: &TaskDraft,
    tasks: &[Task],
    rules: &Rules,
    exclude: Option<Uuid>,
) -> Result<(), ValidationError> {
    let name = draft.name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    if name.chars().count() < rules.min_name_len {
        return Err(ValidationError::NameTooShort {
            min: rules.min_name_len,
        });
    }
    if name_taken(name, tasks, exclude) {
        return Err(ValidationError::DuplicateName(name.to_string()));
    }

    if !draft.duration.is_finite() || draft.duration <= 0.0 {
        return Err(ValidationError::NonPositiveDuration(draft.duration));
    }
    if draft.duration > rules.max_duration {
        return Err(ValidationError::DurationTooLong {
            got: draft.duration,
            max: rules.max_duration,
        });
    }

    if let Some(start) = draft.start {
        if !start.is_finite() || start < 0.0 {
            return Err(ValidationError::NegativeStart(start));
        }
    }

    Ok(())
}

/// Case-insensitive name lookup, skipping `exclude`.
pub fn name_taken(name: &str, tasks: &[Task], exclude: Option<Uuid>) -> bool {
    let wanted = name.trim().to_lowercase();
    tasks
        .iter()
        .filter(|t| Some(t.id) != exclude)
        .any(|t| t.name.to_lowercase() == wanted)
}

/// Project names may be left empty, otherwise they need two characters.
pub fn validate_project_name(name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if len > 0 && len < 2 {
        return Err(ValidationError::ProjectNameTooShort { min: 2 });
    }
    Ok(())
}

/// Returns `true` when adding `candidate` to `tasks` keeps the dependency
/// graph acyclic.
///
/// The search runs over the would-be graph: the candidate's id resolves to the
/// candidate itself (replacing any stored task with the same id), every other
/// id resolves through `tasks`. Ids that resolve to nothing contribute no
/// edges.
pub fn is_acyclic(candidate: &Task, tasks: &[Task]) -> bool {
    let mut graph: HashMap<Uuid, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
    graph.insert(candidate.id, candidate);

    let mut visited = HashSet::new();
    let mut on_stack = HashSet::new();
    !reaches_cycle(candidate.id, &graph, &mut visited, &mut on_stack)
}

fn reaches_cycle(
    id: Uuid,
    graph: &HashMap<Uuid, &Task>,
    visited: &mut HashSet<Uuid>,
    on_stack: &mut HashSet<Uuid>,
) -> bool {
    if on_stack.contains(&id) {
        return true;
    }
    if !visited.insert(id) {
        return false;
    }
    on_stack.insert(id);

    if let Some(task) = graph.get(&id) {
        for dep in &task.dependencies {
            if reaches_cycle(*dep, graph, visited, on_stack) {
                return true;
            }
        }
    }

    on_stack.remove(&id);
    false
}

/// Whole-graph acyclicity check, used when a batch of tasks arrives at once.
/// Returns the name of a task found on a cycle.
pub fn find_cycle(tasks: &[Task]) -> Option<String> {
    let graph: HashMap<Uuid, &Task> = tasks.iter().map(|t| (t.id, t)).collect();
    let mut visited = HashSet::new();
    for task in tasks {
        let mut on_stack = HashSet::new();
        if reaches_cycle(task.id, &graph, &mut visited, &mut on_stack) {
            return Some(task.name.clone());
        }
    }
    None
}
