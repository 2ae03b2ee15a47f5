//! `Database` trait: single async interface for all persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::wizard::model::ProjectRecord;

/// A project row as stored by the local gateway.
#[derive(Debug, Clone)]
pub struct StoredProject {
    pub id: Uuid,
    pub session_id: Uuid,
    pub name: String,
    pub request: Option<String>,
    pub files: Option<Vec<String>>,
    pub created_at: DateTime<Utc>,
}

/// Backend-agnostic database trait covering settings and project records.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn init_schema(&self) -> Result<(), DatabaseError>;

    // ── Settings ────────────────────────────────────────────────────

    /// Read a setting value, `None` if the key is absent.
    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError>;

    /// Insert or overwrite a setting value.
    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError>;

    /// Delete a setting. Returns whether a row was removed.
    async fn delete_setting(&self, user_id: &str, key: &str) -> Result<bool, DatabaseError>;

    // ── Projects ────────────────────────────────────────────────────

    /// Insert a project record. Every call creates a new row.
    async fn insert_project(&self, record: &ProjectRecord) -> Result<Uuid, DatabaseError>;

    /// List project rows written for a session, oldest first.
    async fn list_projects_for_session(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<StoredProject>, DatabaseError>;
}
