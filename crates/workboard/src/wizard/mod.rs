//! Multi-step creation wizards.
//!
//! A [`Wizard`] walks a form through numbered steps. `next` is gated on the
//! current step validating; `back` never validates. Once a step has shown
//! errors, every edit revalidates it, so fixing a field clears its message
//! in place. Submission validates all steps again before writing through the
//! store.

pub mod project_form;
pub mod task_form;

use std::collections::BTreeMap;
use std::fmt;

use async_trait::async_trait;

use crate::error::WorkboardError;
use crate::store::{AppStore, StoreError};

pub use project_form::{ProjectForm, ProjectStep};
pub use task_form::{TaskForm, TaskStep};

/// Field name to message. Computed locally, never sent to the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message for a field. The first message per field wins.
    pub fn add(&mut self, field: &str, message: &str) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.to_string());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<&str> = self.errors.values().map(String::as_str).collect();
        f.write_str(&messages.join(" "))
    }
}

impl std::error::Error for ValidationErrors {}

/// A form driven by [`Wizard`].
#[async_trait]
pub trait WizardForm: Send + Sync {
    type Step: Copy + PartialEq + fmt::Debug + Send + Sync + 'static;

    /// Steps in order. Never empty.
    fn steps() -> &'static [Self::Step];

    fn validate_step(&self, step: Self::Step) -> ValidationErrors;

    /// Writes the form through the store and returns the new document id.
    async fn create(&self, store: &AppStore) -> Result<String, StoreError>;
}

pub struct Wizard<F: WizardForm> {
    form: F,
    step: usize,
    errors: ValidationErrors,
    submit_error: Option<String>,
}

impl<F: WizardForm> Wizard<F> {
    pub fn new(form: F) -> Self {
        Self {
            form,
            step: 0,
            errors: ValidationErrors::new(),
            submit_error: None,
        }
    }

    pub fn form(&self) -> &F {
        &self.form
    }

    /// Zero-based index of the current step.
    pub fn step_index(&self) -> usize {
        self.step
    }

    pub fn current_step(&self) -> F::Step {
        F::steps()[self.step]
    }

    pub fn step_count(&self) -> usize {
        F::steps().len()
    }

    pub fn is_last_step(&self) -> bool {
        self.step + 1 == self.step_count()
    }

    /// Errors shown on the current step.
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Message from the last failed submission.
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    /// Applies an edit. If the current step is showing errors they are
    /// recomputed.
    pub fn edit(&mut self, f: impl FnOnce(&mut F)) {
        f(&mut self.form);
        if !self.errors.is_empty() {
            self.errors = self.form.validate_step(self.current_step());
        }
    }

    /// Validates the current step and advances when it passes. Returns
    /// whether the step was valid. On the last step nothing moves.
    pub fn next(&mut self) -> bool {
        self.errors = self.form.validate_step(self.current_step());
        if !self.errors.is_empty() {
            log::debug!("Step {:?} blocked: {}", self.current_step(), self.errors);
            return false;
        }
        if !self.is_last_step() {
            self.step += 1;
        }
        true
    }

    /// Goes back one step without validating.
    pub fn back(&mut self) {
        if self.step > 0 {
            self.step -= 1;
            self.errors = ValidationErrors::new();
        }
    }

    /// Validates every step, then creates the document through the store.
    ///
    /// An invalid step becomes the current step with its errors shown. A
    /// store failure keeps the wizard where it is with `submit_error` set.
    pub async fn submit(&mut self, store: &AppStore) -> crate::Result<String> {
        for (index, step) in F::steps().iter().enumerate() {
            let errors = self.form.validate_step(*step);
            if !errors.is_empty() {
                self.step = index;
                self.errors = errors.clone();
                return Err(WorkboardError::Validation(errors));
            }
        }

        match self.form.create(store).await {
            Ok(id) => {
                self.submit_error = None;
                Ok(id)
            }
            Err(e) => {
                self.submit_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_first_message_wins() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());
        errors.add("name", "Project name is required.");
        errors.add("name", "ignored");
        errors.add("dueDate", "Due date cannot be in the past.");

        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("name"), Some("Project name is required."));
        assert!(errors.get("team").is_none());
        assert_eq!(
            errors.to_string(),
            "Due date cannot be in the past. Project name is required."
        );
    }
}
