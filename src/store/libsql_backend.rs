//! libSQL backend: async `Database` trait implementation.
//!
//! Supports local file and in-memory databases.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use libsql::{Connection, Database as LibSqlDatabase, params};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{Database, StoredProject};
use crate::wizard::model::ProjectRecord;

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations.
/// `libsql::Connection` is `Send + Sync` and safe for concurrent async use.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;

        let backend = Self {
            db: Arc::new(db),
            conn,
        };
        backend.init_schema().await?;
        Ok(backend)
    }

    fn conn(&self) -> &Connection {
        &self.conn
    }
}

// ── Helper functions ────────────────────────────────────────────────

/// Parse an RFC 3339 or SQLite datetime string into DateTime<Utc>.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.with_timezone(&Utc);
    }
    if let Ok(ndt) = chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return ndt.and_utc();
    }
    DateTime::<Utc>::MIN_UTC
}

fn opt_text_owned(s: Option<String>) -> libsql::Value {
    match s {
        Some(s) => libsql::Value::Text(s),
        None => libsql::Value::Null,
    }
}

/// Map a libsql Row to a StoredProject.
///
/// Column order matches PROJECT_COLUMNS:
/// 0:id, 1:session_id, 2:name, 3:request, 4:files, 5:created_at
fn row_to_project(row: &libsql::Row) -> Result<StoredProject, DatabaseError> {
    let id_str: String = row
        .get(0)
        .map_err(|e| DatabaseError::Query(format!("project id: {e}")))?;
    let session_str: String = row
        .get(1)
        .map_err(|e| DatabaseError::Query(format!("project session_id: {e}")))?;
    let name: String = row
        .get(2)
        .map_err(|e| DatabaseError::Query(format!("project name: {e}")))?;
    let request: Option<String> = row.get::<String>(3).ok();
    let files_str: Option<String> = row.get::<String>(4).ok();
    let created_str: String = row
        .get(5)
        .map_err(|e| DatabaseError::Query(format!("project created_at: {e}")))?;

    let files = match files_str {
        Some(raw) => Some(
            serde_json::from_str::<Vec<String>>(&raw)
                .map_err(|e| DatabaseError::Serialization(e.to_string()))?,
        ),
        None => None,
    };

    Ok(StoredProject {
        id: Uuid::parse_str(&id_str).map_err(|e| DatabaseError::Serialization(e.to_string()))?,
        session_id: Uuid::parse_str(&session_str)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?,
        name,
        request,
        files,
        created_at: parse_datetime(&created_str),
    })
}

// ── Trait implementation ────────────────────────────────────────────

const PROJECT_COLUMNS: &str = "id, session_id, name, request, files, created_at";

#[async_trait]
impl Database for LibSqlBackend {
    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(self.conn()).await
    }

    // ── Settings ────────────────────────────────────────────────────

    async fn get_setting(
        &self,
        user_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                "SELECT value FROM settings WHERE user_id = ?1 AND key = ?2",
                params![user_id, key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get_setting: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value_str: String = row.get(0).unwrap_or_else(|_| "null".to_string());
                let value: serde_json::Value =
                    serde_json::from_str(&value_str).unwrap_or(serde_json::Value::Null);
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get_setting: {e}"))),
        }
    }

    async fn set_setting(
        &self,
        user_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();
        let value_str = serde_json::to_string(value)
            .map_err(|e| DatabaseError::Serialization(e.to_string()))?;

        conn.execute(
            "INSERT INTO settings (user_id, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (user_id, key) DO UPDATE SET value = ?3, updated_at = ?4",
            params![user_id, key, value_str, now],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("set_setting: {e}")))?;

        Ok(())
    }

    async fn delete_setting(&self, user_id: &str, key: &str) -> Result<bool, DatabaseError> {
        let conn = self.conn();
        let count = conn
            .execute(
                "DELETE FROM settings WHERE user_id = ?1 AND key = ?2",
                params![user_id, key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("delete_setting: {e}")))?;
        Ok(count > 0)
    }

    // ── Projects ────────────────────────────────────────────────────

    async fn insert_project(&self, record: &ProjectRecord) -> Result<Uuid, DatabaseError> {
        let conn = self.conn();
        let id = Uuid::new_v4();
        let files_json = match &record.files {
            Some(files) => Some(
                serde_json::to_string(files)
                    .map_err(|e| DatabaseError::Serialization(e.to_string()))?,
            ),
            None => None,
        };

        conn.execute(
            "INSERT INTO projects (id, session_id, name, request, files, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id.to_string(),
                record.session_id.to_string(),
                record.name.clone(),
                opt_text_owned(record.request.clone()),
                opt_text_owned(files_json),
                Utc::now().to_rfc3339(),
            ],
        )
        .await
        .map_err(|e| DatabaseError::Query(format!("insert_project: {e}")))?;

        debug!(project_id = %id, session_id = %record.session_id, "Project inserted into DB");
        Ok(id)
    }

    async fn list_projects_for_session(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<StoredProject>, DatabaseError> {
        let conn = self.conn();
        let mut rows = conn
            .query(
                &format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects WHERE session_id = ?1 ORDER BY created_at ASC, rowid ASC"
                ),
                params![session_id.to_string()],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("list_projects_for_session: {e}")))?;

        let mut projects = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| DatabaseError::Query(format!("list_projects_for_session: {e}")))?
        {
            projects.push(row_to_project(&row)?);
        }
        Ok(projects)
    }
}
