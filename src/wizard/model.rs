//! Form data collected by the wizard and the records sent to the gateway.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::WizardError;

/// Everything the user has entered so far. Lives only as long as the
/// session; a reload starts over with an empty form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingForm {
    pub name: String,
    pub request: String,
    /// Public URLs of uploaded files, in upload order.
    pub files: Vec<String>,
}

impl OnboardingForm {
    /// Whether every field is filled in, which gates the final write.
    pub fn is_complete(&self) -> bool {
        !self.name.is_empty() && !self.request.is_empty() && !self.files.is_empty()
    }

    /// Remove the first entry equal to `url`. Returns whether one was removed.
    ///
    /// Only the list changes; the stored blob stays where it is.
    pub fn remove_file(&mut self, url: &str) -> bool {
        match self.files.iter().position(|f| f == url) {
            Some(idx) => {
                self.files.remove(idx);
                true
            }
            None => false,
        }
    }
}

/// A row written to the `projects` collection.
///
/// The partial write after the name step carries only `name`; the final
/// write after the files step carries all three. `session_id` ties the two
/// rows of one wizard run together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub session_id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<String>>,
}

impl ProjectRecord {
    pub fn partial(session_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            session_id,
            name: name.into(),
            request: None,
            files: None,
        }
    }

    /// The final record, or `None` when the form is incomplete.
    pub fn full(session_id: Uuid, form: &OnboardingForm) -> Option<Self> {
        if !form.is_complete() {
            return None;
        }
        Some(Self {
            session_id,
            name: form.name.clone(),
            request: Some(form.request.clone()),
            files: Some(form.files.clone()),
        })
    }
}

/// Storage path for an uploaded file: `<prefix>/<file name>`.
///
/// Only the last path component of `file_name` is kept.
pub fn upload_path(prefix: &str, file_name: &str) -> Result<String, WizardError> {
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();
    if base.is_empty() || base == "." || base == ".." {
        return Err(WizardError::InvalidFileName(file_name.to_string()));
    }
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        Ok(base.to_string())
    } else {
        Ok(format!("{prefix}/{base}"))
    }
}

/// Settings keys used for step persistence.
pub mod settings_keys {
    /// Key holding the current step, scoped by session id.
    pub const STEP: &str = "step";
}
