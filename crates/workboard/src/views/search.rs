//! Case-insensitive text search for list views.

use crate::model::{Employee, Project, Task};

fn matches(query: &str, fields: &[&str]) -> bool {
    fields.iter().any(|f| f.to_lowercase().contains(query))
}

/// Projects whose name or description contains the query. A blank query
/// matches everything.
pub fn search_projects<'a>(projects: &'a [Project], query: &str) -> Vec<&'a Project> {
    let query = query.trim().to_lowercase();
    projects
        .iter()
        .filter(|p| query.is_empty() || matches(&query, &[&p.name, &p.description]))
        .collect()
}

/// Tasks whose name, description, category or subcategory contains the query.
pub fn search_tasks<'a>(tasks: &'a [Task], query: &str) -> Vec<&'a Task> {
    let query = query.trim().to_lowercase();
    tasks
        .iter()
        .filter(|t| {
            query.is_empty()
                || matches(
                    &query,
                    &[
                        &t.name,
                        &t.description,
                        t.category.as_deref().unwrap_or_default(),
                        t.subcategory.as_deref().unwrap_or_default(),
                    ],
                )
        })
        .collect()
}

/// Employees matching by name, email, department or any skill.
pub fn search_employees<'a>(employees: &'a [Employee], query: &str) -> Vec<&'a Employee> {
    let query = query.trim().to_lowercase();
    employees
        .iter()
        .filter(|e| {
            query.is_empty()
                || matches(&query, &[&e.name, &e.email, &e.department])
                || e.skills.iter().any(|s| s.to_lowercase().contains(&query))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_projects() {
        let projects = vec![
            Project {
                name: "Website Redesign".to_string(),
                ..Default::default()
            },
            Project {
                name: "Mobile".to_string(),
                description: "New website companion app".to_string(),
                ..Default::default()
            },
            Project {
                name: "Payroll".to_string(),
                ..Default::default()
            },
        ];
        assert_eq!(search_projects(&projects, "WEBSITE").len(), 2);
        assert_eq!(search_projects(&projects, "  ").len(), 3);
        assert!(search_projects(&projects, "crm").is_empty());
    }

    #[test]
    fn test_search_tasks_includes_category() {
        let tasks = vec![Task {
            name: "Wireframes".to_string(),
            category: Some("Design".to_string()),
            ..Default::default()
        }];
        assert_eq!(search_tasks(&tasks, "design").len(), 1);
        assert!(search_tasks(&tasks, "backend").is_empty());
    }

    #[test]
    fn test_search_employees_by_skill() {
        let employees = vec![
            Employee {
                name: "Ada".to_string(),
                skills: vec!["Rust".to_string()],
                ..Default::default()
            },
            Employee {
                name: "Bob".to_string(),
                department: "Design".to_string(),
                ..Default::default()
            },
        ];
        assert_eq!(search_employees(&employees, "rust")[0].name, "Ada");
        assert_eq!(search_employees(&employees, "design")[0].name, "Bob");
    }
}
