//! Linear filters over the store's collections.

use chrono::{DateTime, Duration, Utc};

use crate::model::{Employee, Project, ProjectStatus, Task, TaskStatus};

pub fn tasks_by_project<'a>(tasks: &'a [Task], project_id: &str) -> Vec<&'a Task> {
    tasks.iter().filter(|t| t.project_id == project_id).collect()
}

pub fn tasks_by_employee<'a>(tasks: &'a [Task], employee_id: &str) -> Vec<&'a Task> {
    tasks
        .iter()
        .filter(|t| t.assigned_to.as_deref() == Some(employee_id))
        .collect()
}

pub fn tasks_by_status(tasks: &[Task], status: TaskStatus) -> Vec<&Task> {
    tasks.iter().filter(|t| t.status == status).collect()
}

pub fn projects_by_status(projects: &[Project], status: ProjectStatus) -> Vec<&Project> {
    projects.iter().filter(|p| p.status == status).collect()
}

/// Past its due date and not completed.
pub fn is_project_overdue(project: &Project, now: DateTime<Utc>) -> bool {
    project.status != ProjectStatus::Completed && project.due_date.is_some_and(|due| due < now)
}

/// Past its due date and not completed.
pub fn is_task_overdue(task: &Task, now: DateTime<Utc>) -> bool {
    !task.is_completed() && task.due_date.is_some_and(|due| due < now)
}

pub fn overdue_projects(projects: &[Project], now: DateTime<Utc>) -> Vec<&Project> {
    projects
        .iter()
        .filter(|p| is_project_overdue(p, now))
        .collect()
}

pub fn overdue_tasks(tasks: &[Task], now: DateTime<Utc>) -> Vec<&Task> {
    tasks.iter().filter(|t| is_task_overdue(t, now)).collect()
}

/// Open tasks due within the next `days` days, soonest first.
pub fn upcoming_deadlines(tasks: &[Task], now: DateTime<Utc>, days: i64) -> Vec<&Task> {
    let horizon = now + Duration::days(days);
    let mut upcoming: Vec<&Task> = tasks
        .iter()
        .filter(|t| !t.is_completed())
        .filter(|t| t.due_date.is_some_and(|due| due >= now && due <= horizon))
        .collect();
    upcoming.sort_by_key(|t| t.due_date);
    upcoming
}

/// The `n` most recently created projects.
pub fn recent_projects(projects: &[Project], n: usize) -> Vec<&Project> {
    let mut recent: Vec<&Project> = projects.iter().collect();
    recent.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    recent.truncate(n);
    recent
}

/// Highest priority first, then earliest due date; undated tasks last.
pub fn sort_tasks_by_priority(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        b.priority.cmp(&a.priority).then_with(|| match (a.due_date, b.due_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        })
    });
}

/// Resolves a task's assignee id against the employee collection.
pub fn resolve_assignee<'a>(employees: &'a [Employee], task: &Task) -> Option<&'a Employee> {
    let id = task.assigned_to.as_deref()?;
    employees.iter().find(|e| e.id == id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Priority;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 15, 12, 0, 0).unwrap()
    }

    fn task(id: &str, project_id: &str, status: TaskStatus) -> Task {
        Task {
            id: id.to_string(),
            project_id: project_id.to_string(),
            status,
            ..Default::default()
        }
    }

    #[test]
    fn test_tasks_by_project_and_status() {
        let tasks = vec![
            task("t1", "p1", TaskStatus::Pending),
            task("t2", "p2", TaskStatus::Completed),
            task("t3", "p1", TaskStatus::Completed),
        ];
        let ids: Vec<&str> = tasks_by_project(&tasks, "p1").iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["t1", "t3"]);
        assert_eq!(tasks_by_status(&tasks, TaskStatus::Completed).len(), 2);
        assert!(tasks_by_project(&tasks, "p9").is_empty());
    }

    #[test]
    fn test_tasks_by_employee() {
        let mut assigned = task("t1", "p1", TaskStatus::Pending);
        assigned.assigned_to = Some("e1".to_string());
        let tasks = vec![assigned, task("t2", "p1", TaskStatus::Pending)];
        assert_eq!(tasks_by_employee(&tasks, "e1").len(), 1);
        assert!(tasks_by_employee(&tasks, "e2").is_empty());
    }

    #[test]
    fn test_project_overdue() {
        let mut project = Project {
            status: ProjectStatus::InProgress,
            due_date: Some(now() - Duration::days(1)),
            ..Default::default()
        };
        assert!(is_project_overdue(&project, now()));

        project.status = ProjectStatus::Completed;
        assert!(!is_project_overdue(&project, now()));

        project.status = ProjectStatus::InProgress;
        project.due_date = None;
        assert!(!is_project_overdue(&project, now()));
    }

    #[test]
    fn test_overdue_tasks() {
        let mut late = task("t1", "p1", TaskStatus::InProgress);
        late.due_date = Some(now() - Duration::hours(1));
        let mut done = task("t2", "p1", TaskStatus::Completed);
        done.due_date = Some(now() - Duration::days(3));
        let mut future = task("t3", "p1", TaskStatus::Pending);
        future.due_date = Some(now() + Duration::days(3));

        let tasks = vec![late, done, future];
        let overdue = overdue_tasks(&tasks, now());
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, "t1");
    }

    #[test]
    fn test_upcoming_deadlines_sorted() {
        let mut a = task("a", "p1", TaskStatus::Pending);
        a.due_date = Some(now() + Duration::days(5));
        let mut b = task("b", "p1", TaskStatus::Pending);
        b.due_date = Some(now() + Duration::days(1));
        let mut far = task("far", "p1", TaskStatus::Pending);
        far.due_date = Some(now() + Duration::days(30));

        let tasks = vec![a, b, far];
        let ids: Vec<&str> = upcoming_deadlines(&tasks, now(), 7)
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_recent_projects() {
        let projects: Vec<Project> = (0..5)
            .map(|i| Project {
                id: format!("p{}", i),
                created_at: now() + Duration::minutes(i),
                ..Default::default()
            })
            .collect();
        let ids: Vec<&str> = recent_projects(&projects, 2).iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["p4", "p3"]);
    }

    #[test]
    fn test_sort_tasks_by_priority() {
        let mut low = task("low", "p1", TaskStatus::Pending);
        low.priority = Priority::Low;
        let mut high_late = task("high_late", "p1", TaskStatus::Pending);
        high_late.priority = Priority::High;
        high_late.due_date = Some(now() + Duration::days(9));
        let mut high_soon = task("high_soon", "p1", TaskStatus::Pending);
        high_soon.priority = Priority::High;
        high_soon.due_date = Some(now() + Duration::days(1));
        let mut high_undated = task("high_undated", "p1", TaskStatus::Pending);
        high_undated.priority = Priority::High;

        let mut tasks = vec![low, high_undated, high_late, high_soon];
        sort_tasks_by_priority(&mut tasks);
        let ids: Vec<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["high_soon", "high_late", "high_undated", "low"]);
    }

    #[test]
    fn test_resolve_assignee() {
        let employees = vec![Employee {
            id: "e1".to_string(),
            name: "Ada".to_string(),
            ..Default::default()
        }];
        let mut t = task("t1", "p1", TaskStatus::Pending);
        assert!(resolve_assignee(&employees, &t).is_none());
        t.assigned_to = Some("e1".to_string());
        assert_eq!(resolve_assignee(&employees, &t).unwrap().name, "Ada");
        t.assigned_to = Some("gone".to_string());
        assert!(resolve_assignee(&employees, &t).is_none());
    }
}
