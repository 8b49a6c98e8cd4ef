//! Read-only aggregate queries.
//!
//! Counts are recomputed by fetching the relevant documents and filtering in
//! memory. There is no server-side aggregation and no pagination, so this is
//! only suitable for small collections.

use serde::Serialize;

use super::data::DataGateway;
use super::error::GatewayError;
use crate::model::{Project, ProjectStatus, Task, TaskStatus};
use crate::views::progress::progress_percent;

/// Task counts for one project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectStats {
    pub total_tasks: usize,
    pub completed_tasks: usize,
    pub in_progress_tasks: usize,
    pub pending_tasks: usize,
    pub blocked_tasks: usize,
    /// Rounded completion percentage, 0 when there are no tasks.
    pub progress: u8,
}

impl ProjectStats {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let count = |status: TaskStatus| tasks.iter().filter(|t| t.status == status).count();
        let completed = count(TaskStatus::Completed);
        Self {
            total_tasks: tasks.len(),
            completed_tasks: completed,
            in_progress_tasks: count(TaskStatus::InProgress),
            pending_tasks: count(TaskStatus::Pending),
            blocked_tasks: count(TaskStatus::Blocked),
            progress: progress_percent(completed, tasks.len()),
        }
    }
}

/// Project and task counts for one user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_projects: usize,
    pub active_projects: usize,
    pub completed_projects: usize,
    pub total_tasks: usize,
    pub completed_tasks: usize,
}

impl UserStats {
    /// Counts over projects and tasks already scoped to the user.
    pub fn from_records(projects: &[Project], tasks: &[Task]) -> Self {
        Self {
            total_projects: projects.len(),
            active_projects: projects
                .iter()
                .filter(|p| p.status == ProjectStatus::InProgress)
                .count(),
            completed_projects: projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Completed)
                .count(),
            total_tasks: tasks.len(),
            completed_tasks: tasks.iter().filter(|t| t.is_completed()).count(),
        }
    }
}

impl DataGateway {
    /// Task counts and progress for a project.
    pub async fn project_stats(&self, project_id: &str) -> Result<ProjectStats, GatewayError> {
        let tasks: Vec<Task> = self.list().await?;
        let tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|t| t.project_id == project_id)
            .collect();
        Ok(ProjectStats::from_tasks(&tasks))
    }

    /// Counts over the projects and tasks a user created.
    pub async fn user_stats(&self, user_id: &str) -> Result<UserStats, GatewayError> {
        let projects: Vec<Project> = self.list().await?;
        let tasks: Vec<Task> = self.list().await?;

        let projects: Vec<Project> = projects
            .into_iter()
            .filter(|p| p.created_by.as_deref() == Some(user_id))
            .collect();
        let tasks: Vec<Task> = tasks
            .into_iter()
            .filter(|t| t.created_by.as_deref() == Some(user_id))
            .collect();

        Ok(UserStats::from_records(&projects, &tasks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(project_id: &str, status: TaskStatus) -> Task {
        Task {
            project_id: project_id.to_string(),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_project_stats_counts() {
        let tasks = vec![
            task("p1", TaskStatus::Completed),
            task("p1", TaskStatus::Completed),
            task("p1", TaskStatus::Blocked),
        ];
        let stats = ProjectStats::from_tasks(&tasks);
        assert_eq!(stats.total_tasks, 3);
        assert_eq!(stats.completed_tasks, 2);
        assert_eq!(stats.blocked_tasks, 1);
        assert_eq!(stats.pending_tasks, 0);
        assert_eq!(stats.progress, 67);
    }

    #[test]
    fn test_project_stats_empty() {
        let stats = ProjectStats::from_tasks(&[]);
        assert_eq!(stats, ProjectStats::default());
    }

    #[test]
    fn test_user_stats_counts() {
        let projects = vec![
            Project {
                status: ProjectStatus::InProgress,
                ..Default::default()
            },
            Project {
                status: ProjectStatus::Completed,
                ..Default::default()
            },
            Project::default(),
        ];
        let tasks = vec![task("p1", TaskStatus::Completed), task("p1", TaskStatus::Pending)];
        let stats = UserStats::from_records(&projects, &tasks);
        assert_eq!(stats.total_projects, 3);
        assert_eq!(stats.active_projects, 1);
        assert_eq!(stats.completed_projects, 1);
        assert_eq!(stats.total_tasks, 2);
        assert_eq!(stats.completed_tasks, 1);
    }
}
