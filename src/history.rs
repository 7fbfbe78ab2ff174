//! Bounded undo/redo of whole-project snapshots.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::model::Project;

pub const DEFAULT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct History {
    limit: usize,
    undo: VecDeque<Project>,
    redo: VecDeque<Project>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl History {
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
            undo: VecDeque::new(),
            redo: VecDeque::new(),
        }
    }

    /// Remember the state a successful mutation started from.
    /// Any redo states are discarded.
    pub fn record(&mut self, before: Project) {
        push_bounded(&mut self.undo, before, self.limit);
        self.redo.clear();
    }

    /// Step back. `current` becomes redoable; returns the state to restore.
    pub fn undo(&mut self, current: &Project) -> Option<Project> {
        let previous = self.undo.pop_back()?;
        push_bounded(&mut self.redo, current.clone(), self.limit);
        Some(previous)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: &Project) -> Option<Project> {
        let next = self.redo.pop_back()?;
        push_bounded(&mut self.undo, current.clone(), self.limit);
        Some(next)
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    /// Change the bound, dropping the oldest entries if needed.
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        while self.redo.len() > self.limit {
            self.redo.pop_front();
        }
    }
}

fn push_bounded(stack: &mut VecDeque<Project>, project: Project, limit: usize) {
    stack.push_back(project);
    while stack.len() > limit {
        stack.pop_front();
    }
}
