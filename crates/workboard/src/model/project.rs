//! Project entity, its draft and patch types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::employee::Employee;
use super::enums::{EmployeeRole, Priority, ProjectStatus, TaskStatus};

/// Copy of selected employee fields taken when the employee was assigned.
///
/// Snapshots are never refreshed: editing or deleting the employee leaves
/// every snapshot already stored on a project untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssigneeSnapshot {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: EmployeeRole,
    #[serde(default, rename = "photoURL", skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
}

impl AssigneeSnapshot {
    /// Captures the current state of an employee.
    pub fn from_employee(employee: &Employee) -> Self {
        Self {
            id: employee.id.clone(),
            name: employee.name.clone(),
            email: employee.email.clone(),
            role: employee.role,
            photo_url: employee.photo_url.clone(),
        }
    }
}

/// Task embedded in a project at creation time, copied from a category template.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectTask {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub subcategory: String,
}

/// A stored project document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_to: Vec<AssigneeSnapshot>,
    #[serde(default)]
    pub tasks: Vec<ProjectTask>,
    #[serde(default)]
    pub selected_categories: Vec<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub created_by_name: Option<String>,
    #[serde(default)]
    pub created_by_email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Returns true if the employee id appears among the assignee snapshots.
    pub fn is_assigned(&self, employee_id: &str) -> bool {
        self.assigned_to.iter().any(|a| a.id == employee_id)
    }
}

/// Fields supplied when creating a project.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Vec<AssigneeSnapshot>,
    pub tasks: Vec<ProjectTask>,
    pub selected_categories: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by_email: Option<String>,
}

/// Partial update of a project. Only fields set to `Some` are written.
///
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Vec<AssigneeSnapshot>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<ProjectTask>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected_categories: Option<Vec<String>>,
}
