//! Hosted gateway: Supabase REST for records, Supabase Storage for files.

use async_trait::async_trait;
use secrecy::ExposeSecret;

use super::{SubmissionGateway, object_url};
use crate::config::{StorageConfig, SupabaseConfig};
use crate::error::GatewayError;
use crate::wizard::model::ProjectRecord;

/// Talks to a Supabase project over HTTP with the anon key.
pub struct SupabaseGateway {
    config: SupabaseConfig,
    table: String,
    bucket: String,
    client: reqwest::Client,
}

impl SupabaseGateway {
    pub fn new(config: SupabaseConfig, storage: &StorageConfig) -> Self {
        Self {
            config,
            table: storage.projects_table.clone(),
            bucket: storage.bucket.clone(),
            client: reqwest::Client::new(),
        }
    }

    fn insert_url(&self) -> String {
        format!("{}/rest/v1/{}", self.config.url, self.table)
    }

    fn upload_url(&self, path: &str) -> Result<String, String> {
        object_url(
            &self.config.url,
            &["storage", "v1", "object", self.bucket.as_str()],
            path,
        )
    }

    /// Public URL of an object in the bucket. Does not check that it exists.
    pub fn public_url(&self, path: &str) -> Result<String, String> {
        object_url(
            &self.config.url,
            &["storage", "v1", "object", "public", self.bucket.as_str()],
            path,
        )
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        let key = self.config.anon_key.expose_secret();
        builder
            .header("apikey", key)
            .header(reqwest::header::AUTHORIZATION, format!("Bearer {key}"))
    }
}

#[async_trait]
impl SubmissionGateway for SupabaseGateway {
    fn name(&self) -> &str {
        "supabase"
    }

    async fn insert_project(&self, record: &ProjectRecord) -> Result<(), GatewayError> {
        let write_err = |reason: String| GatewayError::Write {
            table: self.table.clone(),
            reason,
        };

        let resp = self
            .authorized(self.client.post(self.insert_url()))
            .header("Prefer", "return=minimal")
            .json(&[record])
            .send()
            .await
            .map_err(|e| write_err(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(write_err(format!("{status}: {body}")));
        }

        tracing::debug!(session_id = %record.session_id, table = %self.table, "Project record inserted");
        Ok(())
    }

    async fn upload_file(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: Option<&str>,
    ) -> Result<String, GatewayError> {
        let upload_err = |reason: String| GatewayError::Upload {
            path: path.to_string(),
            reason,
        };

        let url = self.upload_url(path).map_err(upload_err)?;
        let resp = self
            .authorized(self.client.post(url))
            .header(
                reqwest::header::CONTENT_TYPE,
                content_type.unwrap_or("application/octet-stream"),
            )
            .body(bytes)
            .send()
            .await
            .map_err(|e| upload_err(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(upload_err(format!("{status}: {body}")));
        }

        self.public_url(path).map_err(upload_err)
    }
}
