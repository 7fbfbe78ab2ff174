//! Effort sizing for small projects.
//!
//! The [`schedule`] module is the engine: it keeps a project's dependency
//! graph acyclic, places each task after its dependencies, and totals
//! project duration both as plain effort and as merged elapsed time. The
//! [`session`], [`io`] and [`cli`] modules are the collaborators that drive
//! it from the command line and persist its results.

pub mod cli;
pub mod config;
pub mod error;
pub mod history;
pub mod io;
pub mod logging;
pub mod model;
pub mod schedule;
pub mod session;

pub use error::{Error, Result, ScheduleError, ValidationError};
pub use model::{Priority, Project, Task, TaskDraft, TimeUnit};
pub use session::Session;
