//! Command-line front end.
//!
//! Each subcommand maps to one session or library call. The working session
//! (project plus undo history) lives in the data dir's autosave slot and is
//! written back after every command that changes it.

use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::io::{self, csv_export, csv_import, ProjectLibrary};
use crate::model::{Priority, Project, Task, TaskDraft, TimeUnit, Timeline};
use crate::schedule::Overview;
use crate::session::Session;

/// sizing - estimate project effort from tasks and their dependencies
#[derive(Parser, Debug)]
#[command(name = "sizing")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to config.toml
    #[arg(long, global = true, env = "SIZING_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding saved projects and the working session
    #[arg(long, global = true, env = "SIZING_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "sizing=trace"
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a new, empty project (clears undo history)
    New {
        /// Project name
        name: Option<String>,

        /// Time unit for starts and durations
        #[arg(long)]
        unit: Option<TimeUnit>,
    },

    /// Rename the current project
    Rename { name: String },

    /// Switch the time unit (values are relabelled, not converted)
    Unit { unit: TimeUnit },

    /// Add a task
    Add(AddArgs),

    /// Change an existing task in place
    Edit(EditArgs),

    /// Remove a task and unlink it from its dependents
    Remove {
        /// Task name, id or id prefix
        task: String,
    },

    /// Copy a task so it starts when the original finishes
    Duplicate { task: String },

    /// Mark a task as completed
    Complete {
        task: String,

        /// Mark as not completed instead
        #[arg(long)]
        reopen: bool,
    },

    /// List tasks
    List {
        /// Only tasks whose name or category contains this text
        #[arg(long)]
        filter: Option<String>,

        #[arg(long)]
        priority: Option<Priority>,
    },

    /// Show task count, effort, elapsed duration and completion estimate
    Overview,

    /// Re-place every task after its dependencies
    Recompute,

    /// Replace all tasks with a chained template read from a TOML file
    Template { file: PathBuf },

    /// Undo the last change
    Undo,

    /// Redo the last undone change
    Redo,

    /// Save the current project to the library
    Save,

    /// List saved projects
    Projects,

    /// Open a saved project (clears undo history)
    Open { project: String },

    /// Save a copy of a saved project
    CopyProject { project: String },

    /// Delete a saved project
    DeleteProject { project: String },

    /// Delete every saved project
    ClearProjects,

    /// Export the current project
    Export {
        #[arg(value_enum)]
        format: ExportFormat,
        path: PathBuf,
    },

    /// Replace all tasks with the contents of a CSV file
    Import { path: PathBuf },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Args, Debug)]
pub struct AddArgs {
    /// Task name
    pub name: String,

    /// Duration in the project's unit
    #[arg(short, long)]
    pub duration: f64,

    /// Requested start offset (pushed later by dependencies)
    #[arg(short, long)]
    pub start: Option<f64>,

    /// Task that must finish first (repeatable)
    #[arg(short, long = "after")]
    pub after: Vec<String>,

    #[arg(short, long)]
    pub priority: Option<Priority>,

    #[arg(short, long)]
    pub category: Option<String>,
}

#[derive(Args, Debug)]
pub struct EditArgs {
    /// Task name, id or id prefix
    pub task: String,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    #[arg(short, long)]
    pub duration: Option<f64>,

    #[arg(short, long)]
    pub start: Option<f64>,

    /// Add a dependency (repeatable)
    #[arg(short, long = "after")]
    pub after: Vec<String>,

    /// Drop existing dependencies before adding `--after` ones
    #[arg(long)]
    pub clear_deps: bool,

    #[arg(short, long)]
    pub priority: Option<Priority>,

    #[arg(short, long)]
    pub category: Option<String>,
}

/// A template file: an ordered list of task drafts.
///
/// ```toml
/// name = "Basic web project"
///
/// [[task]]
/// name = "Planning"
/// duration = 3
/// priority = "high"
/// category = "Management"
/// ```
#[derive(Debug, Deserialize)]
struct TemplateFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default, rename = "task")]
    tasks: Vec<TaskDraft>,
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let config = Config::load(self.config.as_deref())?;
        let data_dir = self.data_dir.clone().unwrap_or_else(|| config.data_dir());
        let library = ProjectLibrary::new(data_dir);
        debug!(data_dir = %library.root().display(), "using data dir");

        let mut session = match library.read_autosave() {
            Some(saved) => {
                let age = Utc::now().signed_duration_since(saved.timestamp);
                debug!(
                    project = %saved.session.project.name,
                    age_secs = age.num_seconds(),
                    "restored autosaved session"
                );
                saved.session
            }
            None => Session::new(new_project(None, config.unit), config.history_limit),
        };
        session.history.set_limit(config.history_limit);

        let mut app = App {
            config,
            library,
            session,
            json: self.json,
        };
        if app.dispatch(self.command)? {
            app.persist()?;
        }
        Ok(())
    }
}

fn new_project(name: Option<&str>, unit: TimeUnit) -> Project {
    let mut project = Project {
        unit,
        ..Project::default()
    };
    if let Some(name) = name.map(str::trim).filter(|n| !n.is_empty()) {
        project.name = name.to_string();
    }
    project
}

struct App {
    config: Config,
    library: ProjectLibrary,
    session: Session,
    json: bool,
}

impl App {
    /// Run one command. Returns whether the session changed.
    fn dispatch(&mut self, command: Commands) -> Result<bool> {
        let rules = self.config.rules.clone();
        match command {
            Commands::New { name, unit } => {
                if let Some(name) = &name {
                    crate::schedule::validate::validate_project_name(name)?;
                }
                let project = new_project(name.as_deref(), unit.unwrap_or(self.config.unit));
                self.session.load(project);
                self.say(&self.session.project.name.clone(), |name| {
                    format!("Created project '{name}'")
                });
                Ok(true)
            }
            Commands::Rename { name } => {
                self.session.rename(&name)?;
                let name = self.session.project.name.clone();
                self.say(&name, |name| format!("Renamed project to '{name}'"));
                Ok(true)
            }
            Commands::Unit { unit } => {
                self.session.set_unit(unit);
                self.say(&unit, |unit| format!("Unit set to {unit}"));
                Ok(true)
            }
            Commands::Add(args) => {
                let draft = self.add_draft(args)?;
                let task = self.session.add_task(draft, &rules)?;
                self.show_task("Added", &task);
                Ok(true)
            }
            Commands::Edit(args) => {
                let id = self.session.resolve(&args.task)?;
                let draft = self.edit_draft(id, args)?;
                let task = self.session.edit_task(id, draft, &rules)?;
                self.show_task("Updated", &task);
                Ok(true)
            }
            Commands::Remove { task } => match self.session.resolve(&task) {
                Ok(id) => {
                    let removed = self.session.remove_task(id);
                    if let Some(removed) = removed {
                        self.show_task("Removed", &removed);
                    }
                    Ok(true)
                }
                Err(Error::UnknownTask(reference)) => {
                    self.say(&reference, |r| format!("No task matches '{r}'; nothing removed"));
                    Ok(false)
                }
                Err(err) => Err(err),
            },
            Commands::Duplicate { task } => {
                let id = self.session.resolve(&task)?;
                let copy = self.session.duplicate_task(id)?;
                self.show_task("Created", &copy);
                Ok(true)
            }
            Commands::Complete { task, reopen } => {
                let id = self.session.resolve(&task)?;
                self.session.set_completed(id, !reopen)?;
                let state = if reopen { "reopened" } else { "completed" };
                self.say(&state, |s| format!("Task {s}"));
                Ok(true)
            }
            Commands::List { filter, priority } => {
                self.list(filter.as_deref().unwrap_or(""), priority);
                Ok(false)
            }
            Commands::Overview => {
                self.overview();
                Ok(false)
            }
            Commands::Recompute => {
                let moved = self.session.recompute_all()?;
                self.say(&moved, |n| format!("Moved {n} task(s)"));
                Ok(moved > 0)
            }
            Commands::Template { file } => {
                let template = read_template(&file)?;
                let label = template
                    .name
                    .clone()
                    .unwrap_or_else(|| file.display().to_string());
                let count = self.session.apply_template(template.tasks, &rules)?;
                self.say(&count, |n| format!("Applied template '{label}' ({n} tasks)"));
                Ok(true)
            }
            Commands::Undo => {
                self.session.undo()?;
                self.say(&"undo", |_| "Undone".to_string());
                Ok(true)
            }
            Commands::Redo => {
                self.session.redo()?;
                self.say(&"redo", |_| "Redone".to_string());
                Ok(true)
            }
            Commands::Save => {
                self.library.save(&self.session.project)?;
                let name = self.session.project.name.clone();
                self.say(&name, |n| format!("Saved project '{n}'"));
                Ok(false)
            }
            Commands::Projects => {
                let projects = self.library.list()?;
                self.emit(&projects, || {
                    if projects.is_empty() {
                        return "No saved projects".to_string();
                    }
                    projects
                        .iter()
                        .map(|p| {
                            format!(
                                "{}  {:<24} {:>3} tasks  {:>6} {}  modified {}",
                                short_id(p.id),
                                p.name,
                                p.task_count,
                                p.elapsed,
                                p.unit,
                                p.modified.format("%Y-%m-%d %H:%M")
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                });
                Ok(false)
            }
            Commands::Open { project } => {
                let id = self.library.resolve(&project)?;
                let project = self.library.load(id)?;
                self.session.load(project);
                let name = self.session.project.name.clone();
                self.say(&name, |n| format!("Opened project '{n}'"));
                Ok(true)
            }
            Commands::CopyProject { project } => {
                let id = self.library.resolve(&project)?;
                let copy = self.library.duplicate(id)?;
                self.say(&copy.name, |n| format!("Saved copy '{n}'"));
                Ok(false)
            }
            Commands::DeleteProject { project } => {
                let id = self.library.resolve(&project)?;
                self.library.delete(id)?;
                self.say(&id, |id| format!("Deleted project {id}"));
                Ok(false)
            }
            Commands::ClearProjects => {
                let count = self.library.clear()?;
                self.say(&count, |n| format!("Deleted {n} saved project(s)"));
                Ok(false)
            }
            Commands::Export { format, path } => {
                self.export(format, &path)?;
                Ok(false)
            }
            Commands::Import { path } => {
                let import = csv_import::import_csv(&path, &rules)?;
                let count = import.tasks.len();
                let skipped = import.skipped;
                self.session.replace_all(import.tasks, import.unit);
                self.emit(&serde_json::json!({ "imported": count, "skipped": skipped }), || {
                    if skipped > 0 {
                        format!("Imported {count} tasks ({skipped} rows skipped)")
                    } else {
                        format!("Imported {count} tasks")
                    }
                });
                Ok(true)
            }
        }
    }

    /// Write the working session, and the library copy when auto-save is on.
    fn persist(&self) -> Result<()> {
        self.library.write_autosave(&self.session)?;
        let project = &self.session.project;
        if self.config.auto_save && project.settings.auto_save && !project.has_default_name() {
            self.library.save(project)?;
        }
        Ok(())
    }

    fn resolve_all(&self, references: &[String]) -> Result<Vec<Uuid>> {
        references.iter().map(|r| self.session.resolve(r)).collect()
    }

    fn add_draft(&self, args: AddArgs) -> Result<TaskDraft> {
        let mut draft = TaskDraft::new(args.name, args.duration);
        draft.start = args.start;
        draft.dependencies = self.resolve_all(&args.after)?;
        draft.priority = args.priority.unwrap_or_default();
        draft.category = args.category;
        Ok(draft)
    }

    fn edit_draft(&self, id: Uuid, args: EditArgs) -> Result<TaskDraft> {
        let current = self
            .session
            .project
            .task(id)
            .ok_or_else(|| Error::UnknownTask(args.task.clone()))?;
        let mut draft = TaskDraft::from(current);
        if let Some(name) = args.name {
            draft.name = name;
        }
        if let Some(duration) = args.duration {
            draft.duration = duration;
        }
        if args.start.is_some() {
            draft.start = args.start;
        }
        if let Some(priority) = args.priority {
            draft.priority = priority;
        }
        if args.category.is_some() {
            draft.category = args.category;
        }
        if args.clear_deps {
            draft.dependencies.clear();
        }
        draft.dependencies.extend(self.resolve_all(&args.after)?);
        Ok(draft)
    }

    fn list(&self, filter: &str, priority: Option<Priority>) {
        let project = &self.session.project;
        let tasks = self.session.filter(filter, priority);
        self.emit(&tasks, || {
            if tasks.is_empty() {
                return "No tasks".to_string();
            }
            let mut lines = vec![format!(
                "{:<8}  {:<24} {:>8} {:>8}  {:<8} {:<14} {}",
                "ID", "NAME", "START", "DURATION", "PRIORITY", "CATEGORY", "AFTER"
            )];
            for task in &tasks {
                let after = project.dependency_names(task).join(", ");
                lines.push(format!(
                    "{:<8}  {:<24} {:>8} {:>8}  {:<8} {:<14} {}{}",
                    short_id(task.id),
                    task.name,
                    task.start,
                    task.duration,
                    task.priority,
                    task.category,
                    if after.is_empty() { "-" } else { after.as_str() },
                    if task.completed { "  [done]" } else { "" },
                ));
            }
            lines.push(format!("Unit: {}", project.unit));
            lines.join("\n")
        });
    }

    fn overview(&self) {
        #[derive(Serialize)]
        struct Report<'a> {
            #[serde(flatten)]
            overview: &'a Overview,
            completion: Option<chrono::DateTime<Utc>>,
        }

        let overview = self.session.overview();
        let timeline = Timeline::new(Utc::now(), overview.unit);
        let completion = timeline.completion(overview.end);
        let report = Report {
            overview: &overview,
            completion,
        };
        self.emit(&report, || {
            let unit = overview.unit;
            let date_format = match unit {
                TimeUnit::Days => "%Y-%m-%d",
                TimeUnit::Hours => "%Y-%m-%d %H:%M",
            };
            [
                format!("Project:    {}", self.session.project.name),
                format!("Tasks:      {}", overview.task_count),
                format!("Effort:     {:.1} {unit}", overview.effort),
                format!("Elapsed:    {:.1} {unit}", overview.elapsed),
                format!(
                    "Completion: {}",
                    completion
                        .map(|d| d.format(date_format).to_string())
                        .unwrap_or_else(|| "-".to_string())
                ),
            ]
            .join("\n")
        });
    }

    fn export(&self, format: ExportFormat, path: &Path) -> Result<()> {
        let project = &self.session.project;
        match format {
            ExportFormat::Csv => {
                if project.tasks.is_empty() {
                    return Err(Error::NothingTo("export"));
                }
                let count = csv_export::export_csv(project, path)?;
                self.say(&count, |n| format!("Exported {n} tasks to {}", path.display()));
            }
            ExportFormat::Json => {
                io::export_json(project, path)?;
                self.say(&path, |p| format!("Exported project to {}", p.display()));
            }
        }
        Ok(())
    }

    fn show_task(&self, verb: &str, task: &Task) {
        self.emit(task, || {
            format!(
                "{verb} '{}' ({}) start {} for {} {}",
                task.name,
                short_id(task.id),
                task.start,
                task.duration,
                self.session.project.unit
            )
        });
    }

    fn say<T: Serialize>(&self, value: &T, text: impl FnOnce(&T) -> String) {
        self.emit(value, || text(value));
    }

    fn emit<T: Serialize + ?Sized>(&self, value: &T, text: impl FnOnce() -> String) {
        if self.json {
            match serde_json::to_string_pretty(value) {
                Ok(json) => println!("{json}"),
                Err(e) => eprintln!("error: failed to encode output: {e}"),
            }
        } else {
            println!("{}", text());
        }
    }
}

fn short_id(id: Uuid) -> String {
    id.to_string()[..8].to_string()
}

fn read_template(path: &Path) -> Result<TemplateFile> {
    let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(toml::from_str(&contents)?)
}
