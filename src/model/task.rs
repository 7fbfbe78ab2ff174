use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Category assigned to a task when none is given.
pub const DEFAULT_CATEGORY: &str = "general";

/// Colours cycled through as tasks are created.
pub const TASK_PALETTE: [&str; 8] = [
    "#ef4444", "#f59e0b", "#10b981", "#3b82f6", "#8b5cf6", "#d946ef", "#f472b6", "#06b6d4",
];

/// Pick a palette colour for the task at `index`.
pub fn task_color(index: usize) -> String {
    TASK_PALETTE[index % TASK_PALETTE.len()].to_string()
}

/// How urgent a task is. Purely informational for the scheduler.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn label(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" | "med" | "normal" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("unknown priority '{other}'")),
        }
    }
}

/// A single unit of scheduled work.
///
/// `start` and `duration` are offsets in the owning project's time unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub start: f64,
    pub duration: f64,
    /// Tasks that must finish before this one may start. Set semantics.
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub color: String,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Task {
    /// Create a new task with sensible defaults.
    pub fn new(name: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start,
            duration,
            dependencies: Vec::new(),
            priority: Priority::default(),
            category: default_category(),
            completed: false,
            color: task_color(0),
        }
    }

    /// Offset at which this task finishes.
    pub fn finish(&self) -> f64 {
        self.start + self.duration
    }

    pub fn depends_on(&self, id: Uuid) -> bool {
        self.dependencies.contains(&id)
    }
}

/// Caller-supplied description of a task to add or edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskDraft {
    /// Pre-assigned id. A fresh one is generated when absent.
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default)]
    pub start: Option<f64>,
    pub duration: f64,
    #[serde(default)]
    pub dependencies: Vec<Uuid>,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl TaskDraft {
    pub fn new(name: impl Into<String>, duration: f64) -> Self {
        Self {
            id: None,
            name: name.into(),
            start: None,
            duration,
            dependencies: Vec::new(),
            priority: Priority::default(),
            category: None,
            color: None,
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    pub fn starting_at(mut self, start: f64) -> Self {
        self.start = Some(start);
        self
    }

    pub fn after(mut self, id: Uuid) -> Self {
        self.dependencies.push(id);
        self
    }

    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Build a task with the given id. Dependencies are de-duplicated keeping
    /// first-seen order; a blank category falls back to `default_category`.
    pub fn into_task(self, id: Uuid, default_category: &str, color: String) -> Task {
        let mut dependencies: Vec<Uuid> = Vec::with_capacity(self.dependencies.len());
        for dep in self.dependencies {
            if !dependencies.contains(&dep) {
                dependencies.push(dep);
            }
        }

        let category = self
            .category
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| default_category.to_string());

        Task {
            id,
            name: self.name.trim().to_string(),
            start: self.start.unwrap_or(0.0),
            duration: self.duration,
            dependencies,
            priority: self.priority,
            category,
            completed: false,
            color: self.color.unwrap_or(color),
        }
    }
}

impl From<&Task> for TaskDraft {
    fn from(task: &Task) -> Self {
        Self {
            id: Some(task.id),
            name: task.name.clone(),
            start: Some(task.start),
            duration: task.duration,
            dependencies: task.dependencies.clone(),
            priority: task.priority,
            category: Some(task.category.clone()),
            color: Some(task.color.clone()),
        }
    }
}
