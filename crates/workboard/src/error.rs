use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkboardError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] crate::gateway::GatewayError),

    #[error("Identity error: {0}")]
    Identity(#[from] crate::identity::IdentityError),

    #[error("Secret error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Store error: {0}")]
    Store(#[from] crate::store::StoreError),

    #[error("Validation failed: {0}")]
    Validation(#[from] crate::wizard::ValidationErrors),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

pub type Result<T> = std::result::Result<T, WorkboardError>;
