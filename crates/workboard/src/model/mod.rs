//! Entity types for the four document collections and the signed-in identity.

pub mod category;
pub mod employee;
pub mod enums;
pub mod identity;
pub mod project;
pub mod task;

pub use category::{Category, CategoryPatch, NewCategory, Subcategory, TemplateTask};
pub use employee::{Employee, EmployeePatch, NewEmployee};
pub use enums::{EmployeeRole, Priority, ProjectStatus, TaskStatus};
pub use identity::Identity;
pub use project::{AssigneeSnapshot, NewProject, Project, ProjectPatch, ProjectTask};
pub use task::{ChecklistItem, NewTask, Task, TaskPatch};
