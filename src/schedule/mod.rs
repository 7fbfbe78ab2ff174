//! The scheduling engine: validation, start propagation, duration totals and
//! the task-list operations on [`Project`](crate::model::Project).

pub mod aggregate;
pub mod propagate;
pub mod store;
pub mod validate;

pub use aggregate::{
    merge_intervals, overview, project_end, total_effort_duration, total_elapsed_duration,
    Interval, Overview,
};
pub use propagate::{compute_start, earliest_start, recompute_all};
pub use validate::{find_cycle, is_acyclic, validate_draft, Rules};
