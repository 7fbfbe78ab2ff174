//! Error types for the sizing engine and its collaborators.
//!
//! Engine errors are recoverable values returned to the caller; nothing here
//! aborts the process.
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (invalid input, cycle, unknown task or project)
//! - 4: Operation failed (I/O, serialization)

use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

pub mod exit_codes {
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// A task or project field the user needs to correct.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("task name is required")]
    EmptyName,

    #[error("name must be at least {min} characters")]
    NameTooShort { min: usize },

    #[error("a task named '{0}' already exists")]
    DuplicateName(String),

    #[error("duration must be greater than zero (got {0})")]
    NonPositiveDuration(f64),

    #[error("duration {got} exceeds the maximum of {max}")]
    DurationTooLong { got: f64, max: f64 },

    #[error("start cannot be negative (got {0})")]
    NegativeStart(f64),

    #[error("project name must be at least {min} characters")]
    ProjectNameTooShort { min: usize },

    #[error("name the project before saving it")]
    UnnamedProject,
}

/// Failures of the scheduling engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScheduleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("dependencies of '{task}' would create a cycle")]
    CycleDetected { task: String },

    #[error("task not found: {0}")]
    NotFound(Uuid),

    #[error("task id already in use: {0}")]
    DuplicateId(Uuid),
}

/// Crate-wide error, covering the engine plus persistence.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error("no task matches '{0}'")]
    UnknownTask(String),

    #[error("'{0}' matches more than one task")]
    AmbiguousTask(String),

    #[error("project not found: {0}")]
    ProjectNotFound(String),

    #[error("nothing to {0}")]
    NothingTo(&'static str),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid CSV: {0}")]
    InvalidCsv(String),

    #[error("IO error at {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Schedule(ScheduleError::Validation(err))
    }
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Schedule(_)
            | Error::UnknownTask(_)
            | Error::AmbiguousTask(_)
            | Error::ProjectNotFound(_)
            | Error::NothingTo(_)
            | Error::InvalidConfig(_)
            | Error::InvalidCsv(_) => exit_codes::USER_ERROR,

            Error::Io { .. } | Error::Json(_) | Error::Csv(_) | Error::TomlParse(_) => {
                exit_codes::OPERATION_FAILED
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
