use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::task::Task;
use super::timeline::TimeUnit;

/// Name given to projects the user has not named yet.
pub const DEFAULT_PROJECT_NAME: &str = "Untitled Project";

/// Per-project switches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectSettings {
    #[serde(default = "default_auto_save")]
    pub auto_save: bool,
}

fn default_auto_save() -> bool {
    true
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            auto_save: default_auto_save(),
        }
    }
}

/// A sizing project: an ordered list of tasks plus metadata.
///
/// Task order is creation order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
    #[serde(default)]
    pub unit: TimeUnit,
    #[serde(default)]
    pub settings: ProjectSettings,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Default for Project {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: DEFAULT_PROJECT_NAME.to_string(),
            created: now,
            modified: now,
            unit: TimeUnit::default(),
            settings: ProjectSettings::default(),
            tasks: Vec::new(),
        }
    }
}

impl Project {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Touch the modified timestamp.
    pub fn touch(&mut self) {
        self.modified = Utc::now();
    }

    pub fn task(&self, id: Uuid) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn has_default_name(&self) -> bool {
        self.name.trim().is_empty() || self.name == DEFAULT_PROJECT_NAME
    }
}
