//! Structural edits on a project's task list.
//!
//! Every operation either succeeds completely or leaves the project
//! untouched.

use tracing::debug;
use uuid::Uuid;

use crate::error::{ScheduleError, ValidationError};
use crate::model::task::task_color;
use crate::model::{Priority, Project, Task, TaskDraft, TimeUnit, DEFAULT_PROJECT_NAME};

use super::propagate::{compute_start, recompute_all};
use super::validate::{is_acyclic, name_taken, validate_draft, validate_project_name, Rules};

/// Suffix appended to the names of duplicated tasks.
const COPY_SUFFIX: &str = " (Copy)";

impl Project {
    /// Validate `draft`, place it after its dependencies and append it.
    pub fn add_task(&mut self, draft: TaskDraft, rules: &Rules) -> Result<Task, ScheduleError> {
        validate_draft(&draft, &self.tasks, rules, None)?;

        let id = match draft.id {
            Some(id) if self.task(id).is_some() => return Err(ScheduleError::DuplicateId(id)),
            Some(id) => id,
            None => Uuid::new_v4(),
        };
        let color = task_color(self.tasks.len());
        let mut task = draft.into_task(id, &rules.default_category, color);

        if !is_acyclic(&task, &self.tasks) {
            debug!(task = %task.name, "rejected: dependency cycle");
            return Err(ScheduleError::CycleDetected { task: task.name });
        }

        task.start = compute_start(&task, &self.tasks);
        debug!(task = %task.name, start = task.start, duration = task.duration, "added task");
        self.tasks.push(task.clone());
        self.touch();
        Ok(task)
    }

    /// Replace the task `id` in place, keeping its id, position and
    /// completion flag. Tasks depending on it are not shifted.
    pub fn edit_task(
        &mut self,
        id: Uuid,
        draft: TaskDraft,
        rules: &Rules,
    ) -> Result<Task, ScheduleError> {
        let index = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or(ScheduleError::NotFound(id))?;
        validate_draft(&draft, &self.tasks, rules, Some(id))?;

        let previous = &self.tasks[index];
        let color = previous.color.clone();
        let completed = previous.completed;
        let mut task = draft.into_task(id, &rules.default_category, color);
        task.completed = completed;

        if !is_acyclic(&task, &self.tasks) {
            debug!(task = %task.name, "rejected edit: dependency cycle");
            return Err(ScheduleError::CycleDetected { task: task.name });
        }

        task.start = compute_start(&task, &self.tasks);
        debug!(task = %task.name, start = task.start, "edited task");
        self.tasks[index] = task.clone();
        self.touch();
        Ok(task)
    }

    /// Remove a task and prune it from every dependency list.
    ///
    /// Unknown ids are a no-op and return `None`.
    pub fn remove_task(&mut self, id: Uuid) -> Option<Task> {
        let index = self.tasks.iter().position(|t| t.id == id)?;
        let removed = self.tasks.remove(index);
        for task in &mut self.tasks {
            task.dependencies.retain(|dep| *dep != id);
        }
        debug!(task = %removed.name, "removed task");
        self.touch();
        Some(removed)
    }

    /// Copy a task so it starts where the original finishes.
    ///
    /// The copy has no dependencies.
    pub fn duplicate_task(&mut self, id: Uuid) -> Result<Task, ScheduleError> {
        let original = self.task(id).ok_or(ScheduleError::NotFound(id))?;

        let copy = Task {
            id: Uuid::new_v4(),
            name: self.copy_name(&original.name),
            start: original.finish(),
            dependencies: Vec::new(),
            ..original.clone()
        };

        debug!(task = %copy.name, start = copy.start, "duplicated task");
        self.tasks.push(copy.clone());
        self.touch();
        Ok(copy)
    }

    fn copy_name(&self, name: &str) -> String {
        let base = format!("{name}{COPY_SUFFIX}");
        if !name_taken(&base, &self.tasks, None) {
            return base;
        }
        (2..)
            .map(|n| format!("{name} (Copy {n})"))
            .find(|candidate| !name_taken(candidate, &self.tasks, None))
            .unwrap_or(base)
    }

    pub fn set_completed(&mut self, id: Uuid, completed: bool) -> Result<(), ScheduleError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or(ScheduleError::NotFound(id))?;
        task.completed = completed;
        self.touch();
        Ok(())
    }

    /// Swap in a whole task list. Cross-task invariants are the caller's
    /// responsibility.
    pub fn replace_all(&mut self, tasks: Vec<Task>) {
        debug!(count = tasks.len(), "replaced task list");
        self.tasks = tasks;
        self.touch();
    }

    /// Replace all tasks with a linear chain built from `drafts`.
    ///
    /// The first task starts at 0; each later task depends solely on the one
    /// before it and starts at its finish. Draft starts and dependencies are
    /// ignored.
    pub fn apply_template(
        &mut self,
        drafts: Vec<TaskDraft>,
        rules: &Rules,
    ) -> Result<&[Task], ScheduleError> {
        let mut chain: Vec<Task> = Vec::with_capacity(drafts.len());
        for (index, mut draft) in drafts.into_iter().enumerate() {
            draft.start = None;
            draft.dependencies.clear();
            validate_draft(&draft, &chain, rules, None)?;

            let mut task = draft.into_task(Uuid::new_v4(), &rules.default_category, task_color(index));
            if let Some(previous) = chain.last() {
                task.dependencies = vec![previous.id];
                task.start = previous.finish();
            }
            chain.push(task);
        }

        self.replace_all(chain);
        Ok(self.tasks.as_slice())
    }

    /// Re-propagate every start in dependency order.
    pub fn recompute_all(&mut self) -> Result<usize, ScheduleError> {
        let mut tasks = self.tasks.clone();
        let moved = recompute_all(&mut tasks)?;
        if moved > 0 {
            self.tasks = tasks;
            self.touch();
        }
        Ok(moved)
    }

    /// Tasks whose name or category contains `query` (case-insensitive),
    /// optionally restricted to one priority.
    pub fn filter_tasks(&self, query: &str, priority: Option<Priority>) -> Vec<&Task> {
        let query = query.trim().to_lowercase();
        self.tasks
            .iter()
            .filter(|t| {
                query.is_empty()
                    || t.name.to_lowercase().contains(&query)
                    || t.category.to_lowercase().contains(&query)
            })
            .filter(|t| priority.map_or(true, |p| t.priority == p))
            .collect()
    }

    /// Names of the dependencies of `task`, with stale ids skipped.
    pub fn dependency_names(&self, task: &Task) -> Vec<&str> {
        task.dependencies
            .iter()
            .filter_map(|dep| self.task(*dep))
            .map(|t| t.name.as_str())
            .collect()
    }

    /// Change the time unit. Values are relabelled, not converted.
    pub fn set_unit(&mut self, unit: TimeUnit) {
        self.unit = unit;
        self.touch();
    }

    pub fn rename(&mut self, name: &str) -> Result<(), ValidationError> {
        validate_project_name(name)?;
        let name = name.trim();
        self.name = if name.is_empty() {
            DEFAULT_PROJECT_NAME.to_string()
        } else {
            name.to_string()
        };
        self.touch();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> Rules {
        Rules::default()
    }

    #[test]
    fn add_pushes_start_past_dependencies() {
        let mut project = Project::default();
        let a = project.add_task(TaskDraft::new("Alpha", 3.0), &rules()).unwrap();
        let b = project
            .add_task(TaskDraft::new("Beta", 5.0).after(a.id), &rules())
            .unwrap();
        assert_eq!(b.start, 3.0);
        assert_eq!(project.tasks.len(), 2);
        assert_eq!(project.tasks[1].color, task_color(1));
    }

    #[test]
    fn add_rejects_duplicate_names_case_insensitively() {
        let mut project = Project::default();
        project.add_task(TaskDraft::new("Design", 3.0), &rules()).unwrap();
        let err = project.add_task(TaskDraft::new("DESIGN", 1.0), &rules());
        assert_eq!(
            err,
            Err(ScheduleError::Validation(ValidationError::DuplicateName(
                "DESIGN".into()
            )))
        );
        assert_eq!(project.tasks.len(), 1);
    }

    #[test]
    fn self_dependency_is_rejected_without_mutation() {
        let mut project = Project::default();
        let before = project.clone();
        let id = Uuid::new_v4();
        let err = project.add_task(TaskDraft::new("Delta", 1.0).with_id(id).after(id), &rules());
        assert_eq!(
            err,
            Err(ScheduleError::CycleDetected {
                task: "Delta".into()
            })
        );
        assert_eq!(project, before);
    }

    #[test]
    fn preassigned_id_must_be_free() {
        let mut project = Project::default();
        let a = project.add_task(TaskDraft::new("Alpha", 1.0), &rules()).unwrap();
        let err = project.add_task(TaskDraft::new("Beta", 1.0).with_id(a.id), &rules());
        assert_eq!(err, Err(ScheduleError::DuplicateId(a.id)));
    }

    #[test]
    fn edit_rejects_cycle_and_keeps_store() {
        let mut project = Project::default();
        let a = project.add_task(TaskDraft::new("Alpha", 1.0), &rules()).unwrap();
        let b = project
            .add_task(TaskDraft::new("Beta", 1.0).after(a.id), &rules())
            .unwrap();
        let before = project.clone();

        let draft = TaskDraft::new("Alpha", 1.0).after(b.id);
        let err = project.edit_task(a.id, draft, &rules());
        assert!(matches!(err, Err(ScheduleError::CycleDetected { .. })));
        assert_eq!(project, before);
    }

    #[test]
    fn edit_keeps_identity_and_does_not_cascade() {
        let mut project = Project::default();
        let a = project.add_task(TaskDraft::new("Alpha", 2.0), &rules()).unwrap();
        let b = project
            .add_task(TaskDraft::new("Beta", 1.0).after(a.id), &rules())
            .unwrap();
        project.set_completed(a.id, true).unwrap();

        let edited = project
            .edit_task(a.id, TaskDraft::new("Alpha", 6.0), &rules())
            .unwrap();
        assert_eq!(edited.id, a.id);
        assert!(edited.completed);
        assert_eq!(project.tasks[0].duration, 6.0);
        // Beta was placed when Alpha was shorter and stays where it was.
        assert_eq!(project.task(b.id).unwrap().start, 2.0);

        assert_eq!(project.recompute_all(), Ok(1));
        assert_eq!(project.task(b.id).unwrap().start, 6.0);
    }

    #[test]
    fn edit_unknown_task_is_not_found() {
        let mut project = Project::default();
        let id = Uuid::new_v4();
        assert_eq!(
            project.edit_task(id, TaskDraft::new("Ghost", 1.0), &rules()),
            Err(ScheduleError::NotFound(id))
        );
    }

    #[test]
    fn remove_prunes_dependencies_and_is_idempotent() {
        let mut project = Project::default();
        let a = project.add_task(TaskDraft::new("Alpha", 2.0), &rules()).unwrap();
        let b = project
            .add_task(TaskDraft::new("Beta", 1.0).after(a.id), &rules())
            .unwrap();

        assert!(project.remove_task(a.id).is_some());
        let pruned = project.task(b.id).unwrap();
        assert!(pruned.dependencies.is_empty());
        assert_eq!(pruned.start, 2.0);

        let once = project.tasks.clone();
        assert!(project.remove_task(a.id).is_none());
        assert!(project.remove_task(Uuid::new_v4()).is_none());
        assert_eq!(project.tasks, once);
    }

    #[test]
    fn duplicate_severs_dependencies_and_chains_after_original() {
        let mut project = Project::default();
        let a = project.add_task(TaskDraft::new("Alpha", 2.0), &rules()).unwrap();
        let b = project
            .add_task(TaskDraft::new("Beta", 4.0).after(a.id), &rules())
            .unwrap();

        let copy = project.duplicate_task(b.id).unwrap();
        assert_ne!(copy.id, b.id);
        assert_eq!(copy.name, "Beta (Copy)");
        assert!(copy.dependencies.is_empty());
        assert_eq!(copy.start, b.start + b.duration);

        let second = project.duplicate_task(b.id).unwrap();
        assert_eq!(second.name, "Beta (Copy 2)");

        let missing = Uuid::new_v4();
        assert_eq!(
            project.duplicate_task(missing),
            Err(ScheduleError::NotFound(missing))
        );
    }

    #[test]
    fn template_builds_a_chain() {
        let mut project = Project::default();
        project.add_task(TaskDraft::new("Old task", 1.0), &rules()).unwrap();

        let drafts = vec![
            TaskDraft::new("Planning", 3.0).starting_at(9.0),
            TaskDraft::new("Build", 10.0),
            TaskDraft::new("Deploy", 2.0).with_priority(Priority::High),
        ];
        let tasks = project.apply_template(drafts, &rules()).unwrap().to_vec();

        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[0].start, 0.0);
        assert!(tasks[0].dependencies.is_empty());
        assert_eq!(tasks[1].start, 3.0);
        assert_eq!(tasks[1].dependencies, vec![tasks[0].id]);
        assert_eq!(tasks[2].start, 13.0);
        assert_eq!(tasks[2].dependencies, vec![tasks[1].id]);
        assert_eq!(tasks[2].priority, Priority::High);
    }

    #[test]
    fn invalid_template_leaves_project_alone() {
        let mut project = Project::default();
        project.add_task(TaskDraft::new("Keep me", 1.0), &rules()).unwrap();
        let before = project.clone();

        let drafts = vec![TaskDraft::new("Plan", 1.0), TaskDraft::new("plan", 2.0)];
        assert!(project.apply_template(drafts, &rules()).is_err());
        assert_eq!(project, before);
    }

    #[test]
    fn filter_matches_name_or_category_and_priority() {
        let mut project = Project::default();
        project
            .add_task(TaskDraft::new("API layer", 3.0).with_category("Backend"), &rules())
            .unwrap();
        project
            .add_task(
                TaskDraft::new("Landing page", 2.0)
                    .with_category("Frontend")
                    .with_priority(Priority::High),
                &rules(),
            )
            .unwrap();

        assert_eq!(project.filter_tasks("back", None).len(), 1);
        assert_eq!(project.filter_tasks("PAGE", None).len(), 1);
        assert_eq!(project.filter_tasks("", Some(Priority::High)).len(), 1);
        assert_eq!(project.filter_tasks("api", Some(Priority::High)).len(), 0);
        assert_eq!(project.filter_tasks("", None).len(), 2);
    }

    #[test]
    fn rename_validates_and_defaults() {
        let mut project = Project::new("Web");
        assert!(project.rename("X").is_err());
        assert_eq!(project.name, "Web");
        project.rename("  ").unwrap();
        assert_eq!(project.name, DEFAULT_PROJECT_NAME);
        project.rename(" Mobile app ").unwrap();
        assert_eq!(project.name, "Mobile app");
    }
}
