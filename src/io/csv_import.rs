use std::collections::HashMap;
use std::path::Path;

use tracing::warn;
use uuid::Uuid;

use crate::error::{Error, Result, ScheduleError};
use crate::model::task::task_color;
use crate::model::{Task, TaskDraft, TimeUnit};
use crate::schedule::validate::{find_cycle, validate_draft, Rules};

/// Tasks read from a CSV file, ready for `replace_all`.
#[derive(Debug, Clone)]
pub struct CsvImport {
    pub tasks: Vec<Task>,
    pub skipped: usize,
    /// Unit named in the file, if any.
    pub unit: Option<TimeUnit>,
}

/// Detect delimiter by checking the first line for common separators.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if commas >= semicolons && commas >= tabs {
        b','
    } else if tabs >= semicolons {
        b'\t'
    } else {
        b';'
    }
}

/// Normalize a header string to a canonical column key.
fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-', '_'], "")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Name,
    Start,
    Duration,
    Priority,
    Category,
    Dependencies,
    Completed,
    Unit,
}

fn header_to_col(normalized: &str) -> Option<Column> {
    match normalized {
        "name" | "task" | "taskname" | "label" | "title" | "activity" => Some(Column::Name),
        "start" | "startat" | "offset" | "begin" => Some(Column::Start),
        "duration" | "length" | "effort" | "estimate" => Some(Column::Duration),
        "priority" | "pri" | "importance" => Some(Column::Priority),
        "category" | "group" | "area" | "team" => Some(Column::Category),
        "dependencies" | "dependson" | "after" | "predecessors" | "deps" => {
            Some(Column::Dependencies)
        }
        "completed" | "done" | "status" => Some(Column::Completed),
        "unit" | "units" => Some(Column::Unit),
        _ => None,
    }
}

fn parse_number(s: &str) -> Option<f64> {
    s.trim().replace(',', ".").parse::<f64>().ok()
}

fn parse_completed(s: &str) -> bool {
    matches!(
        s.trim().to_lowercase().as_str(),
        "true" | "yes" | "1" | "done" | "completed" | "finished"
    )
}

/// Split a Dependencies cell into task ids.
///
/// Names are separated by `;` but may themselves contain `;` or `,`, so the
/// longest run of pieces naming a known task wins. A piece that matches
/// nothing is retried as a comma-separated list. Returns the resolved ids and
/// the names that matched no task.
fn resolve_dependencies(raw: &str, known: &HashMap<String, Uuid>) -> (Vec<Uuid>, Vec<String>) {
    let pieces: Vec<&str> = raw.split(';').collect();
    let lookup = |name: &str| known.get(&name.trim().to_lowercase()).copied();

    let mut ids = Vec::new();
    let mut missing = Vec::new();
    let mut i = 0;
    while i < pieces.len() {
        let matched = (i + 1..=pieces.len())
            .rev()
            .find_map(|j| lookup(&pieces[i..j].join(";")).map(|id| (id, j)));
        match matched {
            Some((id, next)) => {
                ids.push(id);
                i = next;
            }
            None => {
                for name in pieces[i].split(',').map(str::trim).filter(|n| !n.is_empty()) {
                    match lookup(name) {
                        Some(id) => ids.push(id),
                        None => missing.push(name.to_string()),
                    }
                }
                i += 1;
            }
        }
    }
    (ids, missing)
}

/// Import tasks from a CSV file.
pub fn import_csv(path: &Path, rules: &Rules) -> Result<CsvImport> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    read_csv(&content, rules)
}

/// Parse CSV text into tasks.
///
/// Auto-detects the delimiter and matches column headers loosely. Rows that
/// fail validation are skipped and counted. Dependencies are resolved by
/// name after all rows are read.
pub fn read_csv(content: &str, rules: &Rules) -> Result<CsvImport> {
    let first_line = content.lines().next().unwrap_or("");
    let delimiter = detect_delimiter(first_line);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let col_map: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_col(&normalize_header(h)))
        .collect();

    let has = |col: Column| col_map.iter().any(|c| *c == Some(col));
    if !has(Column::Name) || !has(Column::Duration) {
        let found: Vec<&str> = headers.iter().collect();
        return Err(Error::InvalidCsv(format!(
            "missing required columns. Found headers: {found:?}. \
             Need columns for: task name, duration."
        )));
    }

    let mut tasks: Vec<Task> = Vec::new();
    let mut dependency_fields: Vec<String> = Vec::new();
    let mut unit = None;
    let mut skipped = 0usize;

    for (i, result) in reader.records().enumerate() {
        let row = i + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!(row, error = %e, "skipping unreadable CSV row");
                skipped += 1;
                continue;
            }
        };

        let mut fields: HashMap<Column, &str> = HashMap::new();
        for (field, col) in record.iter().zip(col_map.iter()) {
            if let Some(col) = col {
                fields.insert(*col, field);
            }
        }
        let field = |col: Column| fields.get(&col).copied().unwrap_or("");

        let Some(duration) = parse_number(field(Column::Duration)) else {
            warn!(row, value = field(Column::Duration), "skipping row: invalid duration");
            skipped += 1;
            continue;
        };

        let mut draft = TaskDraft::new(field(Column::Name), duration);
        let start = field(Column::Start);
        if !start.is_empty() {
            match parse_number(start) {
                Some(s) => draft.start = Some(s),
                None => {
                    warn!(row, value = start, "skipping row: invalid start");
                    skipped += 1;
                    continue;
                }
            }
        }
        draft.priority = field(Column::Priority).parse().unwrap_or_default();
        draft.category = Some(field(Column::Category).to_string());

        if let Err(e) = validate_draft(&draft, &tasks, rules, None) {
            warn!(row, error = %e, "skipping invalid CSV row");
            skipped += 1;
            continue;
        }

        if unit.is_none() {
            unit = field(Column::Unit).parse().ok();
        }

        let color = task_color(tasks.len());
        let mut task = draft.into_task(Uuid::new_v4(), &rules.default_category, color);
        task.completed = parse_completed(field(Column::Completed));

        dependency_fields.push(field(Column::Dependencies).to_string());
        tasks.push(task);
    }

    if tasks.is_empty() && skipped > 0 {
        return Err(Error::InvalidCsv(format!(
            "no valid tasks found ({skipped} rows skipped)"
        )));
    }

    // Second pass: resolve dependency names to ids.
    let name_to_id: HashMap<String, Uuid> = tasks
        .iter()
        .map(|t| (t.name.to_lowercase(), t.id))
        .collect();

    for (task, raw) in tasks.iter_mut().zip(dependency_fields.iter()) {
        let (ids, missing) = resolve_dependencies(raw, &name_to_id);
        for id in ids {
            if !task.dependencies.contains(&id) {
                task.dependencies.push(id);
            }
        }
        for name in missing {
            warn!(task = %task.name, dependency = %name, "dependency not found");
        }
    }

    if let Some(task) = find_cycle(&tasks) {
        return Err(ScheduleError::CycleDetected { task }.into());
    }

    Ok(CsvImport {
        tasks,
        skipped,
        unit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::csv_export::write_csv;
    use crate::model::{Priority, Project};

    #[test]
    fn reads_semicolon_file_with_loose_headers() {
        let csv = "Task Name;Start;Effort;Priority;Team;Depends On;Done\n\
                   Planning;0;3;high;Management;;yes\n\
                   Build;3;10,5;;Backend;planning;no\n";
        let import = read_csv(csv, &Rules::default()).unwrap();

        assert_eq!(import.skipped, 0);
        assert_eq!(import.tasks.len(), 2);
        let planning = &import.tasks[0];
        let build = &import.tasks[1];
        assert_eq!(planning.priority, Priority::High);
        assert!(planning.completed);
        assert_eq!(build.duration, 10.5);
        assert_eq!(build.priority, Priority::Medium);
        assert_eq!(build.category, "Backend");
        assert_eq!(build.dependencies, vec![planning.id]);
    }

    #[test]
    fn invalid_rows_are_skipped() {
        let csv = "name,duration,start\nGood,2,0\nZero,0,0\nNeg,2,-1\ngood,1,0\nBad,x,0\n";
        let import = read_csv(csv, &Rules::default()).unwrap();
        assert_eq!(import.tasks.len(), 1);
        assert_eq!(import.skipped, 4);
    }

    #[test]
    fn missing_duration_column_is_rejected() {
        let err = read_csv("name,start\nA,1\n", &Rules::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidCsv(_)));
    }

    #[test]
    fn cyclic_dependencies_are_rejected() {
        let csv = "name,duration,dependencies\nAlpha,1,Beta\nBeta,1,Alpha\n";
        let err = read_csv(csv, &Rules::default()).unwrap_err();
        assert!(matches!(
            err,
            Error::Schedule(ScheduleError::CycleDetected { .. })
        ));
    }

    #[test]
    fn dependency_names_with_separators_resolve() {
        let csv = "name,duration,dependencies\n\
                   \"Build, test\",1,\n\
                   Review; sign-off,1,\n\
                   Alpha,1,\n\
                   Beta,1,\n\
                   Deploy,2,\"Build, test; Review; sign-off\"\n\
                   Wrap up,1,\"Alpha, Beta; Ghost\"\n";
        let import = read_csv(csv, &Rules::default()).unwrap();
        let ids: Vec<Uuid> = import.tasks.iter().map(|t| t.id).collect();

        assert_eq!(import.tasks[4].dependencies, vec![ids[0], ids[1]]);
        assert_eq!(import.tasks[5].dependencies, vec![ids[2], ids[3]]);
    }

    #[test]
    fn export_reads_back() {
        let rules = Rules::default();
        let mut project = Project::new("Web");
        project.unit = TimeUnit::Hours;
        let a = project.add_task(TaskDraft::new("Planning", 3.0), &rules).unwrap();
        let b = project.add_task(TaskDraft::new("Design", 5.0), &rules).unwrap();
        let c = project
            .add_task(TaskDraft::new("Build, test", 10.0).after(a.id).after(b.id), &rules)
            .unwrap();
        project
            .add_task(TaskDraft::new("Deploy", 1.0).after(c.id), &rules)
            .unwrap();

        let mut out = Vec::new();
        write_csv(&project, &mut out).unwrap();
        let import = read_csv(&String::from_utf8(out).unwrap(), &rules).unwrap();

        assert_eq!(import.unit, Some(TimeUnit::Hours));
        assert_eq!(import.tasks.len(), 4);
        let build = &import.tasks[2];
        assert_eq!(build.name, "Build, test");
        assert_eq!(build.start, 5.0);
        assert_eq!(
            build.dependencies,
            vec![import.tasks[0].id, import.tasks[1].id]
        );
        assert_eq!(import.tasks[3].dependencies, vec![build.id]);
    }
}
