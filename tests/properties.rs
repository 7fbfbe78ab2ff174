use std::collections::HashSet;

use proptest::prelude::*;
use sizing::schedule::{
    compute_start, find_cycle, total_effort_duration, total_elapsed_duration, Rules,
};
use sizing::{Project, ScheduleError, Task, TaskDraft};
use uuid::Uuid;

/// A plan for building a project: per task, a duration, a requested start and
/// raw dependency picks that get reduced to earlier tasks.
fn plan_strategy(max_tasks: usize) -> impl Strategy<Value = Vec<(u8, u8, Vec<usize>)>> {
    proptest::collection::vec(
        (1u8..20, 0u8..10, proptest::collection::vec(any::<usize>(), 0..4)),
        1..=max_tasks,
    )
}

fn build(plan: &[(u8, u8, Vec<usize>)]) -> Project {
    let rules = Rules::default();
    let mut project = Project::new("Props");
    let mut ids: Vec<Uuid> = Vec::new();
    for (i, (duration, start, picks)) in plan.iter().enumerate() {
        let mut draft =
            TaskDraft::new(format!("task {i}"), f64::from(*duration)).starting_at(f64::from(*start));
        if i > 0 {
            let deps: HashSet<usize> = picks.iter().map(|p| p % i).collect();
            for dep in deps {
                draft = draft.after(ids[dep]);
            }
        }
        let task = project.add_task(draft, &rules).unwrap();
        ids.push(task.id);
    }
    project
}

fn non_overlapping(spans: &[(u8, u8)]) -> Vec<Task> {
    let mut cursor = 0.0;
    spans
        .iter()
        .enumerate()
        .map(|(i, (gap, len))| {
            let start = cursor + f64::from(*gap);
            let duration = f64::from(*len);
            cursor = start + duration;
            Task::new(format!("span {i}"), start, duration)
        })
        .collect()
}

proptest! {
    #[test]
    fn added_tasks_never_form_a_cycle(plan in plan_strategy(12)) {
        let project = build(&plan);
        prop_assert_eq!(find_cycle(&project.tasks), None);
    }

    #[test]
    fn closing_a_loop_is_rejected_and_store_is_unchanged(
        plan in plan_strategy(8),
        pick in any::<usize>(),
    ) {
        let mut project = build(&plan);
        let before = project.clone();
        let rules = Rules::default();

        // Pointing a task at itself or at one of its dependents closes a loop.
        let target = project.tasks[pick % project.tasks.len()].clone();
        let dependent = project
            .tasks
            .iter()
            .find(|t| t.depends_on(target.id))
            .map_or(target.id, |t| t.id);
        let draft = TaskDraft::from(&target).after(dependent);
        let err = project.edit_task(target.id, draft, &rules).unwrap_err();

        prop_assert!(matches!(err, ScheduleError::CycleDetected { .. }), "expected CycleDetected");
        prop_assert_eq!(project, before);
    }

    #[test]
    fn fresh_self_reference_is_always_a_cycle(plan in plan_strategy(6), duration in 1u8..50) {
        let mut project = build(&plan);
        let before = project.clone();
        let id = Uuid::new_v4();
        let draft = TaskDraft::new("self", f64::from(duration)).with_id(id).after(id);

        let err = project.add_task(draft, &Rules::default()).unwrap_err();
        prop_assert!(matches!(err, ScheduleError::CycleDetected { .. }), "expected CycleDetected");
        prop_assert_eq!(project, before);
    }

    #[test]
    fn start_is_never_before_a_dependency_finishes(plan in plan_strategy(12)) {
        let project = build(&plan);
        for task in &project.tasks {
            let computed = compute_start(task, &project.tasks);
            for dep in &task.dependencies {
                let dep = project.task(*dep).unwrap();
                prop_assert!(task.start >= dep.finish());
                prop_assert!(computed >= dep.finish());
            }
        }
    }

    #[test]
    fn disjoint_intervals_elapsed_equals_effort(
        spans in proptest::collection::vec((0u8..5, 1u8..10), 0..20),
    ) {
        let tasks = non_overlapping(&spans);
        let effort = total_effort_duration(&tasks);
        let elapsed = total_elapsed_duration(&tasks);
        prop_assert!((effort - elapsed).abs() < 1e-9);
    }

    #[test]
    fn elapsed_never_exceeds_effort(plan in plan_strategy(12)) {
        let project = build(&plan);
        prop_assert!(
            total_elapsed_duration(&project.tasks) <= total_effort_duration(&project.tasks) + 1e-9
        );
    }

    #[test]
    fn removing_a_missing_id_twice_matches_once(plan in plan_strategy(8)) {
        let mut once = build(&plan);
        let mut twice = once.clone();
        let ghost = Uuid::new_v4();

        prop_assert!(once.remove_task(ghost).is_none());
        prop_assert!(twice.remove_task(ghost).is_none());
        prop_assert!(twice.remove_task(ghost).is_none());
        prop_assert_eq!(once, twice);
    }
}

#[test]
fn identical_intervals_collapse() {
    let tasks: Vec<Task> = (0..3)
        .map(|i| Task::new(format!("copy {i}"), 0.0, 5.0))
        .collect();
    assert_eq!(total_elapsed_duration(&tasks), 5.0);
    assert_eq!(total_effort_duration(&tasks), 15.0);
}
