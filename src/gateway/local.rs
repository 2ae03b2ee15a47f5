//! Local gateway: project records in libSQL, blobs on disk.
//!
//! Used when no hosted backend is configured. Files land under
//! `{upload_dir}/{bucket}/{path}` and are served by the HTTP server at
//! `/files/{bucket}/{path}`.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use super::{SubmissionGateway, object_url};
use crate::config::StorageConfig;
use crate::error::GatewayError;
use crate::store::Database;
use crate::wizard::model::ProjectRecord;

/// Table the local backend writes to, regardless of
/// `StorageConfig::projects_table`.
const LOCAL_PROJECTS_TABLE: &str = "projects";

pub struct LocalGateway {
    db: Arc<dyn Database>,
    upload_dir: PathBuf,
    bucket: String,
    public_base_url: String,
}

impl LocalGateway {
    pub fn new(db: Arc<dyn Database>, storage: &StorageConfig) -> Self {
        Self {
            db,
            upload_dir: storage.upload_dir.clone(),
            bucket: storage.bucket.clone(),
            public_base_url: storage.public_base_url.clone(),
        }
    }

    /// Directory the HTTP server should expose under `/files`.
    pub fn upload_dir(&self) -> &PathBuf {
        &self.upload_dir
    }
}

#[async_trait]
impl SubmissionGateway for LocalGateway {
    fn name(&self) -> &str {
        "local"
    }

    async fn insert_project(&self, record: &ProjectRecord) -> Result<(), GatewayError> {
        let id = self
            .db
            .insert_project(record)
            .await
            .map_err(|e| GatewayError::Write {
                table: LOCAL_PROJECTS_TABLE.into(),
                reason: e.to_string(),
            })?;
        debug!(project_id = %id, session_id = %record.session_id, "Project record stored locally");
        Ok(())
    }

    async fn upload_file(
        &self,
        path: &str,
        bytes: Vec<u8>,
        _content_type: Option<&str>,
    ) -> Result<String, GatewayError> {
        let upload_err = |reason: String| GatewayError::Upload {
            path: path.to_string(),
            reason,
        };

        let mut target = self.upload_dir.join(&self.bucket);
        for segment in path.split('/') {
            if segment.is_empty() || segment == "." || segment == ".." {
                return Err(upload_err(format!("unsafe path segment {segment:?}")));
            }
            target.push(segment);
        }

        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| upload_err(e.to_string()))?;
        }
        tokio::fs::write(&target, &bytes)
            .await
            .map_err(|e| upload_err(e.to_string()))?;

        debug!(path = %target.display(), size = bytes.len(), "File stored locally");
        object_url(
            &self.public_base_url,
            &["files", self.bucket.as_str()],
            path,
        )
        .map_err(upload_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::LibSqlBackend;
    use uuid::Uuid;

    async fn gateway(dir: &std::path::Path) -> (LocalGateway, Arc<dyn Database>) {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let storage = StorageConfig {
            upload_dir: dir.to_path_buf(),
            public_base_url: "http://localhost:9999".into(),
            ..StorageConfig::default()
        };
        (LocalGateway::new(Arc::clone(&db), &storage), db)
    }

    #[tokio::test]
    async fn upload_writes_blob_and_returns_served_url() {
        let tmp = tempfile::tempdir().unwrap();
        let (gw, _db) = gateway(tmp.path()).await;

        let url = gw
            .upload_file("public/logo.png", b"png-bytes".to_vec(), Some("image/png"))
            .await
            .unwrap();

        assert_eq!(url, "http://localhost:9999/files/project-files/public/logo.png");
        let stored = std::fs::read(tmp.path().join("project-files/public/logo.png")).unwrap();
        assert_eq!(stored, b"png-bytes");
    }

    #[tokio::test]
    async fn upload_rejects_traversal() {
        let tmp = tempfile::tempdir().unwrap();
        let (gw, _db) = gateway(tmp.path()).await;

        let err = gw
            .upload_file("public/../../etc/passwd", Vec::new(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Upload { .. }));
    }

    #[tokio::test]
    async fn hosted_table_name_does_not_redirect_local_writes() {
        let db: Arc<dyn Database> = Arc::new(LibSqlBackend::new_memory().await.unwrap());
        let storage = StorageConfig {
            projects_table: "leads".into(),
            ..StorageConfig::default()
        };
        let gw = LocalGateway::new(Arc::clone(&db), &storage);
        let session = Uuid::new_v4();

        gw.submit_partial(session, "Ada").await.unwrap();

        assert_eq!(db.list_projects_for_session(session).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn insert_project_stores_row() {
        let tmp = tempfile::tempdir().unwrap();
        let (gw, db) = gateway(tmp.path()).await;
        let session = Uuid::new_v4();

        gw.submit_partial(session, "Ada").await.unwrap();

        let rows = db.list_projects_for_session(session).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].name, "Ada");
    }
}
