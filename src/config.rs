//! Configuration types, built from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;

/// Where the page's "Go back home" link points.
pub const DEFAULT_HOME_URL: &str = "https://dylanreed.dev";

/// Server and wizard configuration.
#[derive(Debug, Clone)]
pub struct WizardConfig {
    /// HTTP port the wizard API listens on.
    pub port: u16,
    /// Path of the libSQL database file.
    pub db_path: PathBuf,
    /// Link shown on the thank-you screen.
    pub home_url: String,
    /// In-memory sessions unused for this long are dropped. Their stored
    /// step survives, so the next load resumes it.
    pub session_idle_timeout: Duration,
    pub storage: StorageConfig,
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            db_path: PathBuf::from("./data/intake-wizard.db"),
            home_url: DEFAULT_HOME_URL.to_string(),
            session_idle_timeout: Duration::from_secs(3600), // 1 hour
            storage: StorageConfig::default(),
        }
    }
}

impl WizardConfig {
    /// Build config from environment variables, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = match std::env::var("INTAKE_PORT") {
            Ok(raw) => raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: "INTAKE_PORT".into(),
                message: format!("{e}"),
            })?,
            Err(_) => defaults.port,
        };

        let db_path = std::env::var("INTAKE_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let home_url = std::env::var("INTAKE_HOME_URL").unwrap_or(defaults.home_url);

        let session_idle_timeout = match std::env::var("INTAKE_SESSION_IDLE_SECS") {
            Ok(raw) => Duration::from_secs(raw.parse().map_err(|e| ConfigError::InvalidValue {
                key: "INTAKE_SESSION_IDLE_SECS".into(),
                message: format!("{e}"),
            })?),
            Err(_) => defaults.session_idle_timeout,
        };

        Ok(Self {
            port,
            db_path,
            home_url,
            session_idle_timeout,
            storage: StorageConfig::from_env(port),
        })
    }
}

/// Naming of the remote collection and blob bucket, plus where the local
/// gateway keeps its files.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Hosted collection that receives project records. The local gateway
    /// always writes to its own `projects` table.
    pub projects_table: String,
    /// Bucket that receives uploaded files.
    pub bucket: String,
    /// Fixed prefix every upload path starts with.
    pub upload_prefix: String,
    /// Local gateway: directory blobs are written under.
    pub upload_dir: PathBuf,
    /// Local gateway: base of the public URLs it hands out.
    pub public_base_url: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            projects_table: "projects".to_string(),
            bucket: "project-files".to_string(),
            upload_prefix: "public".to_string(),
            upload_dir: PathBuf::from("./data/uploads"),
            public_base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl StorageConfig {
    fn from_env(port: u16) -> Self {
        let defaults = Self::default();
        Self {
            projects_table: std::env::var("INTAKE_PROJECTS_TABLE")
                .unwrap_or(defaults.projects_table),
            bucket: std::env::var("INTAKE_BUCKET").unwrap_or(defaults.bucket),
            upload_prefix: std::env::var("INTAKE_UPLOAD_PREFIX")
                .map(|p| p.trim_matches('/').to_string())
                .unwrap_or(defaults.upload_prefix),
            upload_dir: std::env::var("INTAKE_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            public_base_url: std::env::var("INTAKE_PUBLIC_BASE_URL")
                .unwrap_or_else(|_| format!("http://localhost:{port}")),
        }
    }
}

/// Credentials for the hosted backend (database REST + object storage).
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: SecretString,
}

impl SupabaseConfig {
    /// Returns `None` when `SUPABASE_URL` or `SUPABASE_ANON_KEY` is unset
    /// (the local gateway is used instead).
    pub fn from_env() -> Option<Self> {
        let url = std::env::var("SUPABASE_URL").ok()?;
        let anon_key = std::env::var("SUPABASE_ANON_KEY").ok()?;
        Some(Self {
            url: url.trim_end_matches('/').to_string(),
            anon_key: SecretString::from(anon_key),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_hosted_layout() {
        let config = WizardConfig::default();
        assert_eq!(config.storage.projects_table, "projects");
        assert_eq!(config.storage.bucket, "project-files");
        assert_eq!(config.storage.upload_prefix, "public");
        assert_eq!(config.home_url, DEFAULT_HOME_URL);
        assert_eq!(config.session_idle_timeout, Duration::from_secs(3600));
    }
}
