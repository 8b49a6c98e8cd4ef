//! New-project wizard.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ValidationErrors, Wizard, WizardForm};
use crate::model::{
    AssigneeSnapshot, Category, Employee, NewProject, Priority, ProjectStatus,
};
use crate::store::{AppStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectStep {
    Details,
    Categories,
    Team,
    Review,
}

impl ProjectStep {
    pub fn label(&self) -> &'static str {
        match self {
            ProjectStep::Details => "Project details",
            ProjectStep::Categories => "Categories",
            ProjectStep::Team => "Team",
            ProjectStep::Review => "Review",
        }
    }
}

const PROJECT_STEPS: &[ProjectStep] = &[
    ProjectStep::Details,
    ProjectStep::Categories,
    ProjectStep::Team,
    ProjectStep::Review,
];

/// Form state for a new project. Category and employee lists are the
/// store snapshots taken when the wizard opened.
#[derive(Debug, Clone)]
pub struct ProjectForm {
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub selected_categories: Vec<String>,
    pub team: Vec<String>,
    categories: Arc<Vec<Category>>,
    employees: Arc<Vec<Employee>>,
    opened_at: DateTime<Utc>,
}

impl ProjectForm {
    pub fn new(categories: Arc<Vec<Category>>, employees: Arc<Vec<Employee>>) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            status: ProjectStatus::Planning,
            priority: Priority::Medium,
            due_date: None,
            selected_categories: Vec::new(),
            team: Vec::new(),
            categories,
            employees,
            opened_at: Utc::now(),
        }
    }

    /// Form seeded from the store's current snapshot.
    pub fn from_store(store: &AppStore) -> Self {
        Self::new(store.categories(), store.employees())
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    fn selected_category_docs(&self) -> impl Iterator<Item = &Category> {
        self.selected_categories
            .iter()
            .filter_map(|id| self.categories.iter().find(|c| &c.id == id))
    }

    /// Builds the draft: template tasks copied from every selected category
    /// and an assignee snapshot for every selected team member.
    pub fn to_draft(&self) -> NewProject {
        let tasks = self
            .selected_category_docs()
            .flat_map(Category::instantiate_tasks)
            .collect();
        let assigned_to = self
            .team
            .iter()
            .filter_map(|id| self.employees.iter().find(|e| &e.id == id))
            .map(AssigneeSnapshot::from_employee)
            .collect();

        NewProject {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            status: self.status,
            priority: self.priority,
            due_date: self.due_date,
            assigned_to,
            tasks,
            selected_categories: self.selected_categories.clone(),
            ..Default::default()
        }
    }
}

fn toggle(list: &mut Vec<String>, id: &str) {
    match list.iter().position(|x| x == id) {
        Some(pos) => {
            list.remove(pos);
        }
        None => list.push(id.to_string()),
    }
}

#[async_trait]
impl WizardForm for ProjectForm {
    type Step = ProjectStep;

    fn steps() -> &'static [ProjectStep] {
        PROJECT_STEPS
    }

    fn validate_step(&self, step: ProjectStep) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        match step {
            ProjectStep::Details => {
                if self.name.trim().is_empty() {
                    errors.add("name", "Project name is required.");
                }
                if let Some(due) = self.due_date {
                    if due.date_naive() < self.opened_at.date_naive() {
                        errors.add("dueDate", "Due date cannot be in the past.");
                    }
                }
            }
            ProjectStep::Categories => {
                let missing = self
                    .selected_categories
                    .iter()
                    .any(|id| !self.categories.iter().any(|c| &c.id == id));
                if missing {
                    errors.add("categories", "A selected category no longer exists.");
                }
            }
            ProjectStep::Team => {
                let missing = self
                    .team
                    .iter()
                    .any(|id| !self.employees.iter().any(|e| &e.id == id));
                if missing {
                    errors.add("team", "A selected team member no longer exists.");
                }
            }
            ProjectStep::Review => {}
        }
        errors
    }

    async fn create(&self, store: &AppStore) -> Result<String, StoreError> {
        store.create_project(self.to_draft()).await
    }
}

impl Wizard<ProjectForm> {
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.edit(|f| f.name = name);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        self.edit(|f| f.description = description);
    }

    pub fn set_status(&mut self, status: ProjectStatus) {
        self.edit(|f| f.status = status);
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.edit(|f| f.priority = priority);
    }

    pub fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>) {
        self.edit(|f| f.due_date = due_date);
    }

    pub fn toggle_category(&mut self, category_id: &str) {
        self.edit(|f| toggle(&mut f.selected_categories, category_id));
    }

    pub fn toggle_member(&mut self, employee_id: &str) {
        self.edit(|f| toggle(&mut f.team, employee_id));
    }
}
