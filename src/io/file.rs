use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::model::Project;

/// Format version written into exported files.
pub const EXPORT_VERSION: &str = "1.0";

/// Save a project to a JSON file.
pub fn save_project(project: &Project, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(project)?;
    write_file(path, &json)?;
    info!(path = %path.display(), tasks = project.tasks.len(), "saved project");
    Ok(())
}

/// Load a project from a JSON file. Accepts plain saves and exports.
pub fn load_project(path: &Path) -> Result<Project> {
    let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let project: Project = serde_json::from_str(&json)?;
    info!(path = %path.display(), tasks = project.tasks.len(), "loaded project");
    Ok(project)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Export<'a> {
    #[serde(flatten)]
    project: &'a Project,
    exported_at: DateTime<Utc>,
    version: &'static str,
}

/// Export a project as JSON, stamped with the export time and format version.
pub fn export_json(project: &Project, path: &Path) -> Result<()> {
    let export = Export {
        project,
        exported_at: Utc::now(),
        version: EXPORT_VERSION,
    };
    let json = serde_json::to_string_pretty(&export)?;
    write_file(path, &json)?;
    info!(path = %path.display(), "exported project JSON");
    Ok(())
}

pub(crate) fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    std::fs::write(path, contents).map_err(|e| Error::io(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Priority, TaskDraft, TimeUnit};
    use crate::schedule::Rules;

    fn sample() -> Project {
        let rules = Rules::default();
        let mut project = Project::new("Mobile app");
        project.unit = TimeUnit::Hours;
        let a = project
            .add_task(TaskDraft::new("Research", 2.0).with_category("Research"), &rules)
            .unwrap();
        project
            .add_task(
                TaskDraft::new("Wireframes", 3.0)
                    .after(a.id)
                    .with_priority(Priority::High),
                &rules,
            )
            .unwrap();
        project.set_completed(a.id, true).unwrap();
        project
    }

    #[test]
    fn save_then_load_is_lossless() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("mobile.json");
        let project = sample();

        save_project(&project, &path).unwrap();
        assert_eq!(load_project(&path).unwrap(), project);
    }

    #[test]
    fn exported_file_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.json");
        let project = sample();

        export_json(&project, &path).unwrap();
        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["version"], EXPORT_VERSION);
        assert!(raw["exportedAt"].is_string());
        assert_eq!(load_project(&path).unwrap(), project);
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_project(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}
