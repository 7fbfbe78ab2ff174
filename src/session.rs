//! The active project and its history, driven one command at a time.
//!
//! Each mutating command snapshots the project, runs the engine, and only
//! records history when the engine call succeeds.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result, ScheduleError};
use crate::history::History;
use crate::model::{Priority, Project, Task, TaskDraft, TimeUnit};
use crate::schedule::{overview, Overview, Rules};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Session {
    pub project: Project,
    #[serde(default)]
    pub history: History,
}

impl Session {
    pub fn new(project: Project, history_limit: usize) -> Self {
        Self {
            project,
            history: History::new(history_limit),
        }
    }

    /// Run `op` against the project; history is recorded only on success.
    fn mutate<T, E>(
        &mut self,
        op: impl FnOnce(&mut Project) -> std::result::Result<T, E>,
    ) -> std::result::Result<T, E> {
        let before = self.project.clone();
        let out = op(&mut self.project)?;
        self.history.record(before);
        Ok(out)
    }

    pub fn add_task(
        &mut self,
        draft: TaskDraft,
        rules: &Rules,
    ) -> std::result::Result<Task, ScheduleError> {
        self.mutate(|p| p.add_task(draft, rules))
    }

    pub fn edit_task(
        &mut self,
        id: Uuid,
        draft: TaskDraft,
        rules: &Rules,
    ) -> std::result::Result<Task, ScheduleError> {
        self.mutate(|p| p.edit_task(id, draft, rules))
    }

    /// Idempotent. History is only touched when something was removed.
    pub fn remove_task(&mut self, id: Uuid) -> Option<Task> {
        self.mutate(|p| p.remove_task(id).ok_or(())).ok()
    }

    pub fn duplicate_task(&mut self, id: Uuid) -> std::result::Result<Task, ScheduleError> {
        self.mutate(|p| p.duplicate_task(id))
    }

    pub fn set_completed(
        &mut self,
        id: Uuid,
        completed: bool,
    ) -> std::result::Result<(), ScheduleError> {
        self.mutate(|p| p.set_completed(id, completed))
    }

    pub fn apply_template(
        &mut self,
        drafts: Vec<TaskDraft>,
        rules: &Rules,
    ) -> std::result::Result<usize, ScheduleError> {
        self.mutate(|p| p.apply_template(drafts, rules).map(|tasks| tasks.len()))
    }

    /// Bulk replacement, optionally switching unit in the same undo step.
    pub fn replace_all(&mut self, tasks: Vec<Task>, unit: Option<TimeUnit>) {
        let _ = self.mutate(|p| {
            p.replace_all(tasks);
            if let Some(unit) = unit {
                p.set_unit(unit);
            }
            Ok::<_, ()>(())
        });
    }

    pub fn recompute_all(&mut self) -> std::result::Result<usize, ScheduleError> {
        self.mutate(|p| p.recompute_all())
    }

    pub fn set_unit(&mut self, unit: TimeUnit) {
        let _ = self.mutate(|p| {
            p.set_unit(unit);
            Ok::<_, ()>(())
        });
    }

    pub fn rename(&mut self, name: &str) -> Result<()> {
        self.mutate(|p| p.rename(name)).map_err(Error::from)
    }

    pub fn undo(&mut self) -> Result<()> {
        let previous = self
            .history
            .undo(&self.project)
            .ok_or(Error::NothingTo("undo"))?;
        self.project = previous;
        Ok(())
    }

    pub fn redo(&mut self) -> Result<()> {
        let next = self
            .history
            .redo(&self.project)
            .ok_or(Error::NothingTo("redo"))?;
        self.project = next;
        Ok(())
    }

    /// Swap in a different project; history starts over.
    pub fn load(&mut self, project: Project) {
        self.project = project;
        self.history.clear();
    }

    pub fn overview(&self) -> Overview {
        overview(&self.project.tasks, self.project.unit)
    }

    pub fn filter(&self, query: &str, priority: Option<Priority>) -> Vec<&Task> {
        self.project.filter_tasks(query, priority)
    }

    /// Find a task by full id, unambiguous id prefix, or case-insensitive name.
    pub fn resolve(&self, reference: &str) -> Result<Uuid> {
        let reference = reference.trim();
        if let Ok(id) = Uuid::parse_str(reference) {
            if self.project.task(id).is_some() {
                return Ok(id);
            }
        }

        let lowered = reference.to_lowercase();
        if let Some(task) = self
            .project
            .tasks
            .iter()
            .find(|t| t.name.to_lowercase() == lowered)
        {
            return Ok(task.id);
        }

        let matches: Vec<Uuid> = self
            .project
            .tasks
            .iter()
            .filter(|t| !lowered.is_empty() && t.id.to_string().starts_with(&lowered))
            .map(|t| t.id)
            .collect();
        match matches.as_slice() {
            [id] => Ok(*id),
            [] => Err(Error::UnknownTask(reference.to_string())),
            _ => Err(Error::AmbiguousTask(reference.to_string())),
        }
    }
}
