//! Persisted step store: the `"step"` slot that survives reloads.

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::Database;

use super::model::settings_keys;
use super::step::Step;

/// Reads and writes the current step of a session in the settings table.
///
/// The value is stored under `(session id, "step")`. No row means no wizard
/// run is in progress for that session.
#[derive(Clone)]
pub struct StepStore {
    db: Arc<dyn Database>,
}

impl StepStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// The raw stored identifier, if any.
    pub async fn load(&self, session_id: Uuid) -> Result<Option<String>, DatabaseError> {
        let value = self
            .db
            .get_setting(&session_id.to_string(), settings_keys::STEP)
            .await?;
        Ok(value.map(|v| match v {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        }))
    }

    /// Resolve the step a freshly loaded session starts on.
    ///
    /// Absent → `Welcome`, and `Welcome` is written back. Unrecognised →
    /// `Welcome`, left as stored until the next transition overwrites it.
    pub async fn resolve(&self, session_id: Uuid) -> Result<Step, DatabaseError> {
        match self.load(session_id).await? {
            Some(raw) => {
                let step = Step::parse_lenient(&raw);
                debug!(session_id = %session_id, stored = %raw, step = %step, "Restored step");
                Ok(step)
            }
            None => {
                self.save(session_id, Step::Welcome).await?;
                Ok(Step::Welcome)
            }
        }
    }

    /// The step a session would resume on, without writing anything.
    pub async fn peek(&self, session_id: Uuid) -> Result<Step, DatabaseError> {
        Ok(self
            .load(session_id)
            .await?
            .map(|raw| Step::parse_lenient(&raw))
            .unwrap_or_default())
    }

    pub async fn save(&self, session_id: Uuid, step: Step) -> Result<(), DatabaseError> {
        self.db
            .set_setting(
                &session_id.to_string(),
                settings_keys::STEP,
                &serde_json::Value::String(step.to_string()),
            )
            .await
    }

    /// Remove the step slot. Returns whether one existed.
    pub async fn clear(&self, session_id: Uuid) -> Result<bool, DatabaseError> {
        self.db
            .delete_setting(&session_id.to_string(), settings_keys::STEP)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LibSqlBackend;

    async fn test_store() -> (StepStore, Arc<dyn Database>) {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        (StepStore::new(Arc::clone(&db)), db)
    }

    #[tokio::test]
    async fn absent_step_resolves_to_welcome_and_is_persisted() {
        let (store, _db) = test_store().await;
        let session = Uuid::new_v4();

        assert!(store.load(session).await.unwrap().is_none());
        assert_eq!(store.resolve(session).await.unwrap(), Step::Welcome);
        assert_eq!(store.load(session).await.unwrap().as_deref(), Some("welcome"));
    }

    #[tokio::test]
    async fn unknown_step_resolves_to_welcome() {
        let (store, db) = test_store().await;
        let session = Uuid::new_v4();
        db.set_setting(
            &session.to_string(),
            settings_keys::STEP,
            &serde_json::json!("payment"),
        )
        .await
        .unwrap();

        assert_eq!(store.resolve(session).await.unwrap(), Step::Welcome);
    }

    #[tokio::test]
    async fn non_string_value_resolves_to_welcome() {
        let (store, db) = test_store().await;
        let session = Uuid::new_v4();
        db.set_setting(&session.to_string(), settings_keys::STEP, &serde_json::json!(3))
            .await
            .unwrap();

        assert_eq!(store.resolve(session).await.unwrap(), Step::Welcome);
    }

    #[tokio::test]
    async fn peek_does_not_persist() {
        let (store, _db) = test_store().await;
        let session = Uuid::new_v4();

        assert_eq!(store.peek(session).await.unwrap(), Step::Welcome);
        assert!(store.load(session).await.unwrap().is_none());

        store.save(session, Step::Files).await.unwrap();
        assert_eq!(store.peek(session).await.unwrap(), Step::Files);
    }

    #[tokio::test]
    async fn saved_step_is_restored() {
        let (store, _db) = test_store().await;
        let session = Uuid::new_v4();
        store.save(session, Step::Request).await.unwrap();

        assert_eq!(store.resolve(session).await.unwrap(), Step::Request);
    }

    #[tokio::test]
    async fn clear_removes_the_slot() {
        let (store, _db) = test_store().await;
        let session = Uuid::new_v4();
        store.save(session, Step::Files).await.unwrap();

        assert!(store.clear(session).await.unwrap());
        assert!(store.load(session).await.unwrap().is_none());
        assert!(!store.clear(session).await.unwrap());
    }
}
