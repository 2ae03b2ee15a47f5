//! Remote submission gateway: where project records and uploaded files go.
//!
//! The wizard writes twice: a partial record after the name step and a full
//! record after the files step. Uploads return a public URL that the form
//! keeps as its file reference.

pub mod local;
pub mod supabase;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::GatewayError;
use crate::wizard::model::{OnboardingForm, ProjectRecord};

pub use local::LocalGateway;
pub use supabase::SupabaseGateway;

/// Backend that stores project records and file blobs.
#[async_trait]
pub trait SubmissionGateway: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Insert one record into the projects collection.
    async fn insert_project(&self, record: &ProjectRecord) -> Result<(), GatewayError>;

    /// Store `bytes` at `path` and return a publicly resolvable URL for it.
    async fn upload_file(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, GatewayError>;

    /// Partial write: a record holding only the name.
    async fn submit_partial(&self, session_id: Uuid, name: &str) -> Result<(), GatewayError> {
        self.insert_project(&ProjectRecord::partial(session_id, name))
            .await
    }

    /// Final write. Returns `Ok(false)` without touching the backend when
    /// any of name, request or files is empty.
    async fn submit_final(
        &self,
        session_id: Uuid,
        form: &OnboardingForm,
    ) -> Result<bool, GatewayError> {
        match ProjectRecord::full(session_id, form) {
            Some(record) => {
                self.insert_project(&record).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Append `bucket` and the `/`-separated `path` to `base` as encoded path
/// segments.
pub(crate) fn object_url(base: &str, prefix: &[&str], path: &str) -> Result<String, String> {
    let mut url = reqwest::Url::parse(base).map_err(|e| format!("invalid base URL {base}: {e}"))?;
    url.path_segments_mut()
        .map_err(|()| format!("base URL {base} cannot carry a path"))?
        .pop_if_empty()
        .extend(prefix)
        .extend(path.split('/'));
    Ok(url.to_string())
}
