//! Progress percentages, workload and status counts.
//!
//! `project_progress` is the only progress computation in the crate; every
//! view that shows a project percentage goes through it.

use std::collections::HashMap;

use crate::model::{Project, ProjectStatus, Task, TaskStatus};

/// `round(100 * completed / total)`, or 0 when `total` is 0.
///
/// Halves round away from zero (12.5 becomes 13).
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = (100.0 * completed.min(total) as f64 / total as f64).round();
    pct as u8
}

/// Completion percentage over all tasks referencing the project.
pub fn project_progress(tasks: &[Task], project_id: &str) -> u8 {
    let (completed, total) = tasks
        .iter()
        .filter(|t| t.project_id == project_id)
        .fold((0, 0), |(done, all), t| {
            (done + usize::from(t.is_completed()), all + 1)
        });
    progress_percent(completed, total)
}

/// Number of projects whose assignee snapshots include the employee.
pub fn employee_workload(projects: &[Project], employee_id: &str) -> usize {
    projects.iter().filter(|p| p.is_assigned(employee_id)).count()
}

/// Count per task status. Every status is present, possibly with 0.
pub fn task_status_counts(tasks: &[Task]) -> HashMap<TaskStatus, usize> {
    let mut counts: HashMap<TaskStatus, usize> =
        TaskStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for task in tasks {
        *counts.entry(task.status).or_default() += 1;
    }
    counts
}

/// Count per project status. Every status is present, possibly with 0.
pub fn project_status_counts(projects: &[Project]) -> HashMap<ProjectStatus, usize> {
    let mut counts: HashMap<ProjectStatus, usize> =
        ProjectStatus::ALL.iter().map(|s| (*s, 0)).collect();
    for project in projects {
        *counts.entry(project.status).or_default() += 1;
    }
    counts
}
