//! Category / subcategory breakdown of a project's tasks.

use std::collections::BTreeMap;

use crate::model::{Employee, Task};

/// Bucket for tasks without a category.
pub const UNCATEGORIZED: &str = "Uncategorized";
/// Bucket for tasks without a subcategory.
pub const GENERAL: &str = "General";

/// `category -> subcategory -> tasks`, keys sorted, task order preserved.
pub type TaskBreakdown = BTreeMap<String, BTreeMap<String, Vec<Task>>>;

fn bucket(value: Option<&str>, fallback: &str) -> String {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => fallback.to_string(),
    }
}

/// Groups tasks by category and subcategory. Missing or blank values land
/// in [`UNCATEGORIZED`] / [`GENERAL`].
pub fn group_tasks_by_category<'a, I>(tasks: I) -> TaskBreakdown
where
    I: IntoIterator<Item = &'a Task>,
{
    let mut groups = TaskBreakdown::new();
    for task in tasks {
        groups
            .entry(bucket(task.category.as_deref(), UNCATEGORIZED))
            .or_default()
            .entry(bucket(task.subcategory.as_deref(), GENERAL))
            .or_default()
            .push(task.clone());
    }
    groups
}

/// Employees grouped by department; blank departments share one bucket.
pub fn employees_by_department(employees: &[Employee]) -> BTreeMap<String, Vec<&Employee>> {
    let mut groups: BTreeMap<String, Vec<&Employee>> = BTreeMap::new();
    for employee in employees {
        groups
            .entry(bucket(Some(&employee.department), "Unassigned"))
            .or_default()
            .push(employee);
    }
    groups
}
