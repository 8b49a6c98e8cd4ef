//! Category templates.
//!
//! A category groups subcategories, each listing template tasks. Selecting a
//! category while creating a project copies its template tasks into the
//! project; nothing links back afterwards except the stored category ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::enums::{Priority, TaskStatus};
use super::project::ProjectTask;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TemplateTask {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: Priority,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Subcategory {
    pub name: String,
    #[serde(default)]
    pub tasks: Vec<TemplateTask>,
}

/// A stored category document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub subcategories: Vec<Subcategory>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Category {
    pub fn subcategory(&self, name: &str) -> Option<&Subcategory> {
        self.subcategories.iter().find(|s| s.name == name)
    }

    /// Copies every template task into fresh project tasks.
    ///
    /// Copied tasks always start `pending`, keep the template priority and
    /// carry this category's and their subcategory's names.
    pub fn instantiate_tasks(&self) -> Vec<ProjectTask> {
        self.subcategories
            .iter()
            .flat_map(|sub| {
                sub.tasks.iter().map(move |template| ProjectTask {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: template.name.clone(),
                    status: TaskStatus::Pending,
                    priority: template.priority,
                    category: self.name.clone(),
                    subcategory: sub.name.clone(),
                })
            })
            .collect()
    }

    /// Number of template tasks across all subcategories.
    pub fn template_task_count(&self) -> usize {
        self.subcategories.iter().map(|s| s.tasks.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCategory {
    pub name: String,
    pub color: String,
    pub description: String,
    pub subcategories: Vec<Subcategory>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategories: Option<Vec<Subcategory>>,
}
