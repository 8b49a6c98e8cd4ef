//! Dashboard totals.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::filters::{overdue_projects, overdue_tasks};
use super::progress::progress_percent;
use crate::model::{Employee, Project, ProjectStatus, Task};

/// Headline numbers for the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_projects: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    /// Open projects past their due date.
    pub overdue_projects: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub overdue_tasks: usize,
    pub team_members: usize,
    /// Completed tasks as a rounded percentage of all tasks.
    pub completion_rate: u8,
}

pub fn dashboard_summary(
    projects: &[Project],
    tasks: &[Task],
    employees: &[Employee],
    now: DateTime<Utc>,
) -> DashboardSummary {
    let completed_tasks = tasks.iter().filter(|t| t.is_completed()).count();
    DashboardSummary {
        total_projects: projects.len(),
        active_projects: projects
            .iter()
            .filter(|p| p.status == ProjectStatus::InProgress)
            .count(),
        completed_projects: projects
            .iter()
            .filter(|p| p.status == ProjectStatus::Completed)
            .count(),
        overdue_projects: overdue_projects(projects, now).len(),
        total_tasks: tasks.len(),
        completed_tasks,
        overdue_tasks: overdue_tasks(tasks, now).len(),
        team_members: employees.len(),
        completion_rate: progress_percent(completed_tasks, tasks.len()),
    }
}
