//! Builder patterns for creating drafts without repetitive boilerplate.

#![allow(dead_code)]

use chrono::{DateTime, Utc};

use workboard::model::{
    AssigneeSnapshot, Category, EmployeeRole, NewCategory, NewEmployee, NewProject, NewTask,
    Priority, ProjectStatus, Subcategory, TaskStatus, TemplateTask,
};

/// Builder for `NewProject` drafts.
pub struct ProjectBuilder {
    draft: NewProject,
}

impl ProjectBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            draft: NewProject {
                name: name.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn status(mut self, status: ProjectStatus) -> Self {
        self.draft.status = status;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.draft.priority = priority;
        self
    }

    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        self.draft.due_date = Some(due);
        self
    }

    pub fn assign(mut self, member: AssigneeSnapshot) -> Self {
        self.draft.assigned_to.push(member);
        self
    }

    pub fn created_by(mut self, uid: &str) -> Self {
        self.draft.created_by = Some(uid.to_string());
        self
    }

    pub fn build(self) -> NewProject {
        self.draft
    }
}

/// Builder for `NewTask` drafts.
pub struct TaskBuilder {
    draft: NewTask,
}

impl TaskBuilder {
    pub fn new(name: &str, project_id: &str) -> Self {
        Self {
            draft: NewTask {
                name: name.to_string(),
                project_id: project_id.to_string(),
                ..Default::default()
            },
        }
    }

    pub fn status(mut self, status: TaskStatus) -> Self {
        self.draft.status = status;
        self
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.draft.priority = priority;
        self
    }

    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        self.draft.due_date = Some(due);
        self
    }

    pub fn assigned_to(mut self, employee_id: &str) -> Self {
        self.draft.assigned_to = Some(employee_id.to_string());
        self
    }

    pub fn build(self) -> NewTask {
        self.draft
    }
}

pub fn employee(name: &str, role: EmployeeRole, department: &str) -> NewEmployee {
    NewEmployee {
        name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase()),
        role,
        department: department.to_string(),
        ..Default::default()
    }
}

/// A "Design" category with one subcategory holding the given templates.
/// Template statuses are kept as given so tests can check they get reset.
pub fn design_category(templates: &[(&str, TaskStatus)]) -> NewCategory {
    NewCategory {
        name: "Design".to_string(),
        color: "#3366ff".to_string(),
        subcategories: vec![Subcategory {
            name: "UX".to_string(),
            tasks: templates
                .iter()
                .enumerate()
                .map(|(i, (name, status))| TemplateTask {
                    id: format!("tpl-{}", i),
                    name: name.to_string(),
                    status: *status,
                    priority: Priority::Medium,
                })
                .collect(),
        }],
        ..Default::default()
    }
}

pub fn find_category<'a>(categories: &'a [Category], name: &str) -> &'a Category {
    categories
        .iter()
        .find(|c| c.name == name)
        .unwrap_or_else(|| panic!("category '{}' not loaded", name))
}
