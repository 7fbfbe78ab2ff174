//! Saved projects and the autosave slot, kept as JSON files in a data dir.
//!
//! Layout:
//! ```text
//! <data_dir>/projects/<project id>.json
//! <data_dir>/autosave.json
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{Error, Result, ValidationError};
use crate::model::{Project, TimeUnit};
use crate::schedule::total_elapsed_duration;
use crate::session::Session;

use super::file::{load_project, save_project, write_file};

const PROJECTS_DIR: &str = "projects";
const AUTOSAVE_FILE: &str = "autosave.json";

/// One line of the saved-projects listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectSummary {
    pub id: Uuid,
    pub name: String,
    pub unit: TimeUnit,
    pub task_count: usize,
    pub elapsed: f64,
    pub modified: DateTime<Utc>,
}

impl From<&Project> for ProjectSummary {
    fn from(project: &Project) -> Self {
        Self {
            id: project.id,
            name: project.name.clone(),
            unit: project.unit,
            task_count: project.tasks.len(),
            elapsed: total_elapsed_duration(&project.tasks),
            modified: project.modified,
        }
    }
}

/// The session as last written by autosave.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Autosave {
    pub session: Session,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ProjectLibrary {
    root: PathBuf,
}

impl ProjectLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn projects_dir(&self) -> PathBuf {
        self.root.join(PROJECTS_DIR)
    }

    fn project_path(&self, id: Uuid) -> PathBuf {
        self.projects_dir().join(format!("{id}.json"))
    }

    fn autosave_path(&self) -> PathBuf {
        self.root.join(AUTOSAVE_FILE)
    }

    /// Insert or overwrite the saved copy of `project`.
    pub fn save(&self, project: &Project) -> Result<()> {
        if project.has_default_name() {
            return Err(ValidationError::UnnamedProject.into());
        }
        save_project(project, &self.project_path(project.id))
    }

    /// All saved projects, most recently modified first.
    /// Files that fail to parse are skipped.
    pub fn list(&self) -> Result<Vec<ProjectSummary>> {
        let dir = self.projects_dir();
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut summaries = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| Error::io(&dir, e))? {
            let path = entry.map_err(|e| Error::io(&dir, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match load_project(&path) {
                Ok(project) => summaries.push(ProjectSummary::from(&project)),
                Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable project"),
            }
        }
        summaries.sort_by(|a, b| b.modified.cmp(&a.modified));
        Ok(summaries)
    }

    /// Find a saved project by id, id prefix, or case-insensitive name.
    pub fn resolve(&self, reference: &str) -> Result<Uuid> {
        let wanted = reference.trim().to_lowercase();
        let summaries = self.list()?;
        summaries
            .iter()
            .find(|s| s.id.to_string() == wanted || s.name.to_lowercase() == wanted)
            .or_else(|| {
                let mut prefixed = summaries
                    .iter()
                    .filter(|s| !wanted.is_empty() && s.id.to_string().starts_with(&wanted));
                match (prefixed.next(), prefixed.next()) {
                    (Some(only), None) => Some(only),
                    _ => None,
                }
            })
            .map(|s| s.id)
            .ok_or_else(|| Error::ProjectNotFound(reference.to_string()))
    }

    pub fn load(&self, id: Uuid) -> Result<Project> {
        let path = self.project_path(id);
        if !path.is_file() {
            return Err(Error::ProjectNotFound(id.to_string()));
        }
        load_project(&path)
    }

    /// Save a copy under a fresh id with " (Copy)" appended to its name,
    /// or " (Copy N)" when that name is already saved.
    pub fn duplicate(&self, id: Uuid) -> Result<Project> {
        let original = self.load(id)?;
        let taken: Vec<String> = self
            .list()?
            .into_iter()
            .map(|s| s.name.to_lowercase())
            .collect();
        let is_free = |name: &String| !taken.contains(&name.to_lowercase());
        let base = format!("{} (Copy)", original.name);
        let name = if is_free(&base) {
            base
        } else {
            (2..)
                .map(|n| format!("{} (Copy {n})", original.name))
                .find(is_free)
                .unwrap_or(base)
        };

        let now = Utc::now();
        let copy = Project {
            id: Uuid::new_v4(),
            name,
            created: now,
            modified: now,
            ..original
        };
        self.save(&copy)?;
        info!(from = %id, to = %copy.id, "duplicated saved project");
        Ok(copy)
    }

    pub fn delete(&self, id: Uuid) -> Result<()> {
        let path = self.project_path(id);
        if !path.is_file() {
            return Err(Error::ProjectNotFound(id.to_string()));
        }
        fs::remove_file(&path).map_err(|e| Error::io(&path, e))?;
        info!(project = %id, "deleted saved project");
        Ok(())
    }

    /// Remove every saved project. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let summaries = self.list()?;
        for summary in &summaries {
            self.delete(summary.id)?;
        }
        Ok(summaries.len())
    }

    pub fn write_autosave(&self, session: &Session) -> Result<()> {
        let autosave = Autosave {
            session: session.clone(),
            timestamp: Utc::now(),
        };
        let path = self.autosave_path();
        write_file(&path, &serde_json::to_string(&autosave)?)
    }

    /// The autosaved session, if one exists and can be read.
    ///
    /// An unreadable slot is moved aside to `autosave.json.bad` so the next
    /// write starts clean.
    pub fn read_autosave(&self) -> Option<Autosave> {
        let path = self.autosave_path();
        if !path.is_file() {
            return None;
        }
        let parsed = fs::read_to_string(&path)
            .map_err(|e| Error::io(&path, e))
            .and_then(|json| serde_json::from_str::<Autosave>(&json).map_err(Error::from));
        match parsed {
            Ok(autosave) => Some(autosave),
            Err(e) => {
                let aside = path.with_extension("json.bad");
                warn!(path = %path.display(), error = %e, "discarding unreadable autosave");
                if let Err(e) = fs::rename(&path, &aside) {
                    warn!(path = %aside.display(), error = %e, "could not move autosave aside");
                }
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskDraft;
    use crate::schedule::Rules;

    fn library() -> (tempfile::TempDir, ProjectLibrary) {
        let dir = tempfile::tempdir().unwrap();
        let library = ProjectLibrary::new(dir.path());
        (dir, library)
    }

    #[test]
    fn unnamed_projects_are_not_saved() {
        let (_dir, library) = library();
        let err = library.save(&Project::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Schedule(crate::error::ScheduleError::Validation(
                ValidationError::UnnamedProject
            ))
        ));
        assert!(library.list().unwrap().is_empty());
    }

    #[test]
    fn save_is_an_upsert_by_id() {
        let (_dir, library) = library();
        let mut project = Project::new("Web");
        library.save(&project).unwrap();
        project
            .add_task(TaskDraft::new("Planning", 3.0), &Rules::default())
            .unwrap();
        library.save(&project).unwrap();

        let list = library.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].task_count, 1);
        assert_eq!(library.load(project.id).unwrap(), project);
    }

    #[test]
    fn duplicate_delete_and_clear() {
        let (_dir, library) = library();
        let project = Project::new("Web");
        library.save(&project).unwrap();

        let copy = library.duplicate(project.id).unwrap();
        assert_eq!(copy.name, "Web (Copy)");
        assert_ne!(copy.id, project.id);
        assert_eq!(library.resolve("web (copy)").unwrap(), copy.id);

        let second = library.duplicate(project.id).unwrap();
        assert_eq!(second.name, "Web (Copy 2)");
        assert_eq!(library.resolve("web (copy 2)").unwrap(), second.id);
        assert_eq!(library.list().unwrap().len(), 3);

        library.delete(project.id).unwrap();
        assert!(matches!(
            library.delete(project.id),
            Err(Error::ProjectNotFound(_))
        ));
        assert_eq!(library.clear().unwrap(), 2);
        assert!(library.list().unwrap().is_empty());
    }

    #[test]
    fn autosave_round_trips_session() {
        let (_dir, library) = library();
        assert!(library.read_autosave().is_none());

        let mut session = Session::default();
        session
            .add_task(TaskDraft::new("Planning", 3.0), &Rules::default())
            .unwrap();
        library.write_autosave(&session).unwrap();

        let restored = library.read_autosave().unwrap();
        assert_eq!(restored.session, session);
    }

    #[test]
    fn corrupt_autosave_is_moved_aside() {
        let (dir, library) = library();
        fs::write(dir.path().join(AUTOSAVE_FILE), "garbage").unwrap();

        assert!(library.read_autosave().is_none());
        assert!(!dir.path().join(AUTOSAVE_FILE).exists());
        assert!(dir.path().join("autosave.json.bad").is_file());

        library.write_autosave(&Session::default()).unwrap();
        assert!(library.read_autosave().is_some());
    }
}
