//! Derived-view helpers.
//!
//! Pure functions over collection snapshots. Nothing here is cached or
//! memoized: callers recompute on every render, which is fine at the sizes
//! the store holds.

pub mod dashboard;
pub mod filters;
pub mod grouping;
pub mod progress;
pub mod search;

pub use dashboard::{dashboard_summary, DashboardSummary};
pub use filters::{
    is_project_overdue, is_task_overdue, overdue_projects, overdue_tasks, projects_by_status,
    recent_projects, resolve_assignee, sort_tasks_by_priority, tasks_by_employee,
    tasks_by_project, tasks_by_status, upcoming_deadlines,
};
pub use grouping::{employees_by_department, group_tasks_by_category, TaskBreakdown, GENERAL, UNCATEGORIZED};
pub use progress::{
    employee_workload, progress_percent, project_progress, project_status_counts,
    task_status_counts,
};
pub use search::{search_employees, search_projects, search_tasks};
