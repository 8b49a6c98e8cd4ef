use std::path::PathBuf;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::secrets::{self, SecretError};
use crate::store::StoreScope;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub identity: IdentityConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackendConfig {
    /// Project the documents belong to. Shows up in logs and spans.
    #[serde(default = "default_project_id")]
    pub project_id: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default)]
    pub api_key_env_var: Option<String>,
    /// SQLite file; `~/.workboard/data/workboard.db` when unset.
    #[serde(default)]
    pub database_path: Option<String>,
}

fn default_project_id() -> String {
    "default".to_string()
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            project_id: default_project_id(),
            api_key: None,
            api_key_file: None,
            api_key_env_var: None,
            database_path: None,
        }
    }
}

impl BackendConfig {
    /// Resolves the API key from its direct value, file or env var.
    pub fn resolve_api_key(&self) -> Result<Option<SecretString>, SecretError> {
        secrets::resolve_secret_optional(
            self.api_key.as_deref(),
            self.api_key_file.as_deref(),
            self.api_key_env_var.as_deref(),
        )
    }

    /// The configured database path with `~` expanded, or the default.
    pub fn database_path(&self) -> PathBuf {
        match self.database_path.as_deref() {
            Some(path) if !path.trim().is_empty() => PathBuf::from(secrets::expand_home(path)),
            _ => crate::db::default_database_path()
                .unwrap_or_else(|| PathBuf::from("workboard.db")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: Option<String>,
    #[serde(default)]
    pub client_secret_file: Option<String>,
    #[serde(default)]
    pub client_secret_env_var: Option<String>,
    #[serde(default)]
    pub device_auth_url: String,
    #[serde(default)]
    pub token_url: String,
    #[serde(default)]
    pub userinfo_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: Vec<String>,
}

fn default_scopes() -> Vec<String> {
    ["openid", "profile", "email", "offline_access"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: None,
            client_secret_file: None,
            client_secret_env_var: None,
            device_auth_url: String::new(),
            token_url: String::new(),
            userinfo_url: String::new(),
            scopes: default_scopes(),
        }
    }
}

impl IdentityConfig {
    /// True when every endpoint needed for the device flow is set.
    pub fn is_configured(&self) -> bool {
        [
            &self.client_id,
            &self.device_auth_url,
            &self.token_url,
            &self.userinfo_url,
        ]
        .iter()
        .all(|v| !v.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreConfig {
    #[serde(default)]
    pub scope: StoreScope,
    #[serde(default = "default_true")]
    pub live_sync: bool,
}

fn default_true() -> bool {
    true
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            scope: StoreScope::default(),
            live_sync: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    /// `EnvFilter` directive, e.g. `info` or `workboard=debug`.
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            json: false,
        }
    }
}
