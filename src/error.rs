//! Error types for the intake wizard.

use crate::wizard::step::Step;

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Wizard error: {0}")]
    Wizard(#[from] WizardError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Failures talking to the remote submission gateway.
///
/// These never reach the wizard's user; the manager logs them and moves on.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Insert into {table} failed: {reason}")]
    Write { table: String, reason: String },

    #[error("Upload of {path} failed: {reason}")]
    Upload { path: String, reason: String },
}

/// Wizard flow errors: the requested move is not possible from where the
/// session currently is.
#[derive(Debug, thiserror::Error)]
pub enum WizardError {
    #[error("Cannot transition from {from} to {to}")]
    InvalidTransition { from: Step, to: Step },

    #[error("Action {action} is not available on step {step}")]
    ActionNotAvailable { action: String, step: Step },

    #[error("Invalid file name: {0:?}")]
    InvalidFileName(String),
}

/// Result type alias for the crate.
pub type Result<T> = std::result::Result<T, Error>;
