//! Collection identifiers and the typed document mapping.
//!
//! `Collection` is the single dispatch key for everything collection-specific:
//! table names, default ordering, reload routing in the store.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::filter::SortOrder;
use crate::model::{
    Category, CategoryPatch, Employee, EmployeePatch, NewCategory, NewEmployee, NewProject,
    NewTask, Project, ProjectPatch, Task, TaskPatch,
};

/// The four top-level document collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Projects,
    Tasks,
    Categories,
    Employees,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Projects,
        Collection::Tasks,
        Collection::Categories,
        Collection::Employees,
    ];

    /// Collection name as known to the document store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Projects => "projects",
            Collection::Tasks => "tasks",
            Collection::Categories => "categories",
            Collection::Employees => "employees",
        }
    }

    /// Ordering applied when a query does not specify one.
    pub fn default_order(&self) -> SortOrder {
        match self {
            Collection::Projects | Collection::Tasks => SortOrder::NewestFirst,
            Collection::Categories | Collection::Employees => SortOrder::NameAscending,
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An entity type stored in one collection.
///
/// `Draft` is what callers supply on create; `Patch` is a partial update that
/// serializes only the fields it sets.
pub trait Document: DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: Collection;
    type Draft: Serialize + Send + Sync;
    type Patch: Serialize + Default + Send + Sync;

    fn id(&self) -> &str;
}

impl Document for Project {
    const COLLECTION: Collection = Collection::Projects;
    type Draft = NewProject;
    type Patch = ProjectPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Task {
    const COLLECTION: Collection = Collection::Tasks;
    type Draft = NewTask;
    type Patch = TaskPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Category {
    const COLLECTION: Collection = Collection::Categories;
    type Draft = NewCategory;
    type Patch = CategoryPatch;

    fn id(&self) -> &str {
        &self.id
    }
}

impl Document for Employee {
    const COLLECTION: Collection = Collection::Employees;
    type Draft = NewEmployee;
    type Patch = EmployeePatch;

    fn id(&self) -> &str {
        &self.id
    }
}
