use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::{Error, Result};
use crate::model::Project;

pub const HEADER: [&str; 7] = [
    "Name",
    "Start",
    "Duration",
    "Unit",
    "Priority",
    "Category",
    "Dependencies",
];

/// Separator between dependency names inside the Dependencies column.
pub const DEPENDENCY_SEPARATOR: &str = "; ";

/// Write the task table as comma-separated values.
///
/// Dependencies are written by name; links to removed tasks are dropped.
/// Returns the number of tasks written.
pub fn write_csv<W: Write>(project: &Project, writer: W) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    wtr.write_record(HEADER)?;

    for task in &project.tasks {
        let start = task.start.to_string();
        let duration = task.duration.to_string();
        let dependencies = project.dependency_names(task).join(DEPENDENCY_SEPARATOR);
        wtr.write_record([
            task.name.as_str(),
            start.as_str(),
            duration.as_str(),
            project.unit.label(),
            task.priority.label(),
            task.category.as_str(),
            dependencies.as_str(),
        ])?;
    }

    wtr.flush().map_err(csv::Error::from)?;
    Ok(project.tasks.len())
}

/// Export tasks to a CSV file. Returns the number of tasks written.
pub fn export_csv(project: &Project, path: &Path) -> Result<usize> {
    let file = std::fs::File::create(path).map_err(|e| Error::io(path, e))?;
    let count = write_csv(project, file)?;
    info!(path = %path.display(), tasks = count, "exported CSV");
    Ok(count)
}
