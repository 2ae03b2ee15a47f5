//! One wizard run: the current step plus the form collected so far.

use std::time::{Duration, Instant};

use uuid::Uuid;

use crate::error::WizardError;

use super::model::OnboardingForm;
use super::step::Step;

/// In-memory state of a single wizard session.
///
/// Transitions only move forward along [`Step::next`]. Form edits are only
/// accepted on the step whose screen shows that input.
#[derive(Debug, Clone)]
pub struct WizardSession {
    id: Uuid,
    step: Step,
    form: OnboardingForm,
    last_active: Instant,
}

impl WizardSession {
    /// A session restored at `step` with an empty form.
    pub fn new(id: Uuid, step: Step) -> Self {
        Self {
            id,
            step,
            form: OnboardingForm::default(),
            last_active: Instant::now(),
        }
    }

    /// Mark the session as used now.
    pub fn touch(&mut self) {
        self.last_active = Instant::now();
    }

    /// Time since the session was last used.
    pub fn idle_for(&self) -> Duration {
        self.last_active.elapsed()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn form(&self) -> &OnboardingForm {
        &self.form
    }

    /// Move to the next step. Fails on the terminal step.
    pub fn advance(&mut self) -> Result<Step, WizardError> {
        let next = self.step.next().ok_or(WizardError::InvalidTransition {
            from: self.step,
            to: self.step,
        })?;
        self.transition(next)
    }

    /// Move to `next`, which must be the successor of the current step.
    pub fn transition(&mut self, next: Step) -> Result<Step, WizardError> {
        if !self.step.can_transition_to(next) {
            return Err(WizardError::InvalidTransition {
                from: self.step,
                to: next,
            });
        }
        self.step = next;
        Ok(next)
    }

    pub fn set_name(&mut self, name: String) -> Result<(), WizardError> {
        self.require(Step::Name, "set_name")?;
        self.form.name = name;
        Ok(())
    }

    pub fn set_request(&mut self, request: String) -> Result<(), WizardError> {
        self.require(Step::Request, "set_request")?;
        self.form.request = request;
        Ok(())
    }

    pub fn add_file(&mut self, url: String) -> Result<(), WizardError> {
        self.require(Step::Files, "add_file")?;
        self.form.files.push(url);
        Ok(())
    }

    /// Remove one entry matching `url` from the file list.
    pub fn remove_file(&mut self, url: &str) -> Result<bool, WizardError> {
        self.require(Step::Files, "remove_file")?;
        Ok(self.form.remove_file(url))
    }

    /// Fail unless the session is on `step`.
    pub fn require(&self, step: Step, action: &str) -> Result<(), WizardError> {
        if self.step == step {
            Ok(())
        } else {
            Err(WizardError::ActionNotAvailable {
                action: action.to_string(),
                step: self.step,
            })
        }
    }
}
