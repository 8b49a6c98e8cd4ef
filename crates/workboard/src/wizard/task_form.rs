//! New-task wizard.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{ValidationErrors, Wizard, WizardForm};
use crate::model::{Category, ChecklistItem, NewTask, Priority, TaskStatus};
use crate::store::{AppStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStep {
    Details,
    Category,
    Schedule,
    Review,
}

impl TaskStep {
    pub fn label(&self) -> &'static str {
        match self {
            TaskStep::Details => "Task details",
            TaskStep::Category => "Category",
            TaskStep::Schedule => "Schedule",
            TaskStep::Review => "Review",
        }
    }
}

const TASK_STEPS: &[TaskStep] = &[
    TaskStep::Details,
    TaskStep::Category,
    TaskStep::Schedule,
    TaskStep::Review,
];

#[derive(Debug, Clone)]
pub struct TaskForm {
    pub name: String,
    pub description: String,
    pub project_id: Option<String>,
    pub milestone_id: Option<String>,
    pub priority: Priority,
    /// Template category id, when the task follows a template.
    pub category_id: Option<String>,
    /// Subcategory name within the template category.
    pub subcategory: Option<String>,
    pub assigned_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub estimated_hours: Option<f64>,
    pub checklist: Vec<ChecklistItem>,
    categories: Arc<Vec<Category>>,
}

impl TaskForm {
    pub fn new(categories: Arc<Vec<Category>>) -> Self {
        Self {
            name: String::new(),
            description: String::new(),
            project_id: None,
            milestone_id: None,
            priority: Priority::Medium,
            category_id: None,
            subcategory: None,
            assigned_to: None,
            due_date: None,
            estimated_hours: None,
            checklist: Vec::new(),
            categories,
        }
    }

    pub fn from_store(store: &AppStore) -> Self {
        Self::new(store.categories())
    }

    /// Form with the project already chosen, as when adding a task from a
    /// project page.
    pub fn for_project(categories: Arc<Vec<Category>>, project_id: &str) -> Self {
        Self {
            project_id: Some(project_id.to_string()),
            ..Self::new(categories)
        }
    }

    fn template(&self) -> Option<&Category> {
        let id = self.category_id.as_deref()?;
        self.categories.iter().find(|c| c.id == id)
    }

    /// Builds the draft. New tasks always start pending; category fields
    /// carry the template names.
    pub fn to_draft(&self) -> NewTask {
        let template = self.template();
        let subcategory = template.and(self.subcategory.clone());

        NewTask {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            project_id: self.project_id.clone().unwrap_or_default(),
            milestone_id: self.milestone_id.clone(),
            category: template.map(|c| c.name.clone()),
            subcategory,
            status: TaskStatus::Pending,
            priority: self.priority,
            assigned_to: self.assigned_to.clone(),
            due_date: self.due_date,
            estimated_hours: self.estimated_hours,
            checklist: self
                .checklist
                .iter()
                .map(|item| ChecklistItem {
                    text: item.text.trim().to_string(),
                    completed: item.completed,
                })
                .collect(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl WizardForm for TaskForm {
    type Step = TaskStep;

    fn steps() -> &'static [TaskStep] {
        TASK_STEPS
    }

    fn validate_step(&self, step: TaskStep) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        match step {
            TaskStep::Details => {
                if self.name.trim().is_empty() {
                    errors.add("name", "Task name is required.");
                }
                if self.project_id.as_deref().map_or(true, |p| p.trim().is_empty()) {
                    errors.add("projectId", "Please select a project.");
                }
            }
            TaskStep::Category => match (self.category_id.as_deref(), self.template()) {
                (Some(_), None) => {
                    errors.add("category", "The selected category no longer exists.");
                }
                (Some(_), Some(category)) => {
                    if let Some(sub) = self.subcategory.as_deref() {
                        if category.subcategory(sub).is_none() {
                            errors.add(
                                "subcategory",
                                "The selected subcategory does not belong to this category.",
                            );
                        }
                    }
                }
                (None, _) => {
                    if self.subcategory.is_some() {
                        errors.add("category", "Select a category before a subcategory.");
                    }
                }
            },
            TaskStep::Schedule => {
                if let Some(hours) = self.estimated_hours {
                    if !hours.is_finite() || hours < 0.0 {
                        errors.add("estimatedHours", "Estimated hours cannot be negative.");
                    }
                }
                if self.checklist.iter().any(|item| item.text.trim().is_empty()) {
                    errors.add("checklist", "Checklist items need text.");
                }
            }
            TaskStep::Review => {}
        }
        errors
    }

    async fn create(&self, store: &AppStore) -> Result<String, StoreError> {
        store.create_task(self.to_draft()).await
    }
}

impl Wizard<TaskForm> {
    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.edit(|f| f.name = name);
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        let description = description.into();
        self.edit(|f| f.description = description);
    }

    pub fn set_project(&mut self, project_id: Option<String>) {
        self.edit(|f| f.project_id = project_id);
    }

    pub fn set_priority(&mut self, priority: Priority) {
        self.edit(|f| f.priority = priority);
    }

    /// Choosing a different category resets the subcategory.
    pub fn set_category(&mut self, category_id: Option<String>) {
        self.edit(|f| {
            if f.category_id != category_id {
                f.subcategory = None;
            }
            f.category_id = category_id;
        });
    }

    pub fn set_subcategory(&mut self, subcategory: Option<String>) {
        self.edit(|f| f.subcategory = subcategory);
    }

    pub fn set_assignee(&mut self, employee_id: Option<String>) {
        self.edit(|f| f.assigned_to = employee_id);
    }

    pub fn set_due_date(&mut self, due_date: Option<DateTime<Utc>>) {
        self.edit(|f| f.due_date = due_date);
    }

    pub fn set_estimated_hours(&mut self, hours: Option<f64>) {
        self.edit(|f| f.estimated_hours = hours);
    }

    pub fn add_checklist_item(&mut self, text: impl Into<String>) {
        let text = text.into();
        self.edit(|f| {
            f.checklist.push(ChecklistItem {
                text,
                completed: false,
            })
        });
    }

    pub fn remove_checklist_item(&mut self, index: usize) {
        self.edit(|f| {
            if index < f.checklist.len() {
                f.checklist.remove(index);
            }
        });
    }
}
