//! Project-level duration figures.
//!
//! Two totals are exposed and must not be confused: *effort* is the plain
//! sum of task durations, *elapsed* is the length of the union of task
//! intervals, so parallel work is counted once.

use serde::Serialize;

use crate::model::{Task, TimeUnit};

/// Half-open span `[start, end)` on the project timeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Interval {
    pub start: f64,
    pub end: f64,
}

impl Interval {
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// Sum of individual durations, ignoring overlap.
pub fn total_effort_duration(tasks: &[Task]) -> f64 {
    tasks.iter().map(|t| t.duration).sum()
}

/// Collapse task intervals into disjoint spans. Touching spans merge.
pub fn merge_intervals(tasks: &[Task]) -> Vec<Interval> {
    let mut spans: Vec<Interval> = tasks
        .iter()
        .map(|t| Interval {
            start: t.start,
            end: t.finish(),
        })
        .collect();
    spans.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<Interval> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => {
                last.end = last.end.max(span.end);
            }
            _ => merged.push(span),
        }
    }
    merged
}

/// Wall-clock span covered by at least one task.
pub fn total_elapsed_duration(tasks: &[Task]) -> f64 {
    merge_intervals(tasks).iter().map(Interval::len).sum()
}

/// Latest finish over all tasks, `None` for an empty project.
pub fn project_end(tasks: &[Task]) -> Option<f64> {
    tasks.iter().map(Task::finish).reduce(f64::max)
}

/// Summary figures shown alongside the task table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub task_count: usize,
    pub effort: f64,
    pub elapsed: f64,
    pub end: Option<f64>,
    pub unit: TimeUnit,
}

pub fn overview(tasks: &[Task], unit: TimeUnit) -> Overview {
    Overview {
        task_count: tasks.len(),
        effort: total_effort_duration(tasks),
        elapsed: total_elapsed_duration(tasks),
        end: project_end(tasks),
        unit,
    }
}
