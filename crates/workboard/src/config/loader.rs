use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub const ENV_API_KEY: &str = "WORKBOARD_API_KEY";
pub const ENV_PROJECT_ID: &str = "WORKBOARD_PROJECT_ID";
pub const ENV_DATABASE_PATH: &str = "WORKBOARD_DATABASE_PATH";
pub const ENV_CLIENT_ID: &str = "WORKBOARD_CLIENT_ID";
pub const ENV_DEVICE_AUTH_URL: &str = "WORKBOARD_DEVICE_AUTH_URL";
pub const ENV_TOKEN_URL: &str = "WORKBOARD_TOKEN_URL";
pub const ENV_USERINFO_URL: &str = "WORKBOARD_USERINFO_URL";
pub const ENV_LOG: &str = "WORKBOARD_LOG";

/// Loads a config file, applies environment overrides and validates.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut config: Config = serde_json::from_str(&content)?;
    config.apply_env_overrides();
    validate_config(&config)?;
    log::debug!("Loaded config from {}", path.display());
    Ok(config)
}

/// Parses and validates a config document. Environment variables are not
/// consulted.
pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl Config {
    /// Defaults overridden by `WORKBOARD_*` environment variables.
    pub fn from_env() -> Result<Config, ConfigError> {
        let mut config = Config::default();
        config.apply_env_overrides();
        validate_config(&config)?;
        Ok(config)
    }

    /// Replaces file values with any set `WORKBOARD_*` variables.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = env_value(ENV_API_KEY) {
            self.backend.api_key = Some(v);
        }
        if let Some(v) = env_value(ENV_PROJECT_ID) {
            self.backend.project_id = v;
        }
        if let Some(v) = env_value(ENV_DATABASE_PATH) {
            self.backend.database_path = Some(v);
        }
        if let Some(v) = env_value(ENV_CLIENT_ID) {
            self.identity.client_id = v;
        }
        if let Some(v) = env_value(ENV_DEVICE_AUTH_URL) {
            self.identity.device_auth_url = v;
        }
        if let Some(v) = env_value(ENV_TOKEN_URL) {
            self.identity.token_url = v;
        }
        if let Some(v) = env_value(ENV_USERINFO_URL) {
            self.identity.userinfo_url = v;
        }
        if let Some(v) = env_value(ENV_LOG) {
            self.logging.level = v;
        }
    }
}

fn validate_url(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Ok(());
    }
    let url = reqwest::Url::parse(value).map_err(|e| ConfigError::Validation {
        message: format!("{} is not a valid URL: {}", field, e),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            message: format!("{} must use http or https, got '{}'", field, url.scheme()),
        });
    }
    Ok(())
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.backend.project_id.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "backend.projectId must not be empty".to_string(),
        });
    }

    validate_url("identity.deviceAuthUrl", &config.identity.device_auth_url)?;
    validate_url("identity.tokenUrl", &config.identity.token_url)?;
    validate_url("identity.userinfoUrl", &config.identity.userinfo_url)?;

    if let Err(e) = tracing_subscriber::EnvFilter::try_new(&config.logging.level) {
        return Err(ConfigError::Validation {
            message: format!("logging.level '{}' is invalid: {}", config.logging.level, e),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreScope;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_load_valid_config() {
        let config = load_config_from_str(
            r#"{
                "backend": {"projectId": "acme"},
                "identity": {"tokenUrl": "https://auth.example.com/token"},
                "store": {"scope": "all"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.backend.project_id, "acme");
        assert_eq!(config.store.scope, StoreScope::All);
    }

    #[test]
    fn test_empty_project_id_rejected() {
        let err = load_config_from_str(r#"{"backend": {"projectId": "  "}}"#).unwrap_err();
        assert!(err.to_string().contains("projectId"));
    }

    #[test]
    fn test_malformed_url_rejected() {
        let err = load_config_from_str(r#"{"identity": {"tokenUrl": "not a url"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));

        let err =
            load_config_from_str(r#"{"identity": {"userinfoUrl": "ftp://example.com"}}"#).unwrap_err();
        assert!(err.to_string().contains("http"));
    }

    #[test]
    fn test_unknown_scope_is_parse_error() {
        let err = load_config_from_str(r#"{"store": {"scope": "team"}}"#).unwrap_err();
        assert!(matches!(err, ConfigError::ParseJson(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/workboard.json").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"backend": {{"projectId": "from-file"}}, "logging": {{"level": "warn"}}}}"#
        )
        .unwrap();

        std::env::set_var(ENV_PROJECT_ID, "from-env");
        let config = load_config(file.path());
        std::env::remove_var(ENV_PROJECT_ID);

        let config = config.unwrap();
        assert_eq!(config.backend.project_id, "from-env");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    #[serial]
    fn test_from_env() {
        std::env::set_var(ENV_CLIENT_ID, "cli");
        std::env::set_var(ENV_DATABASE_PATH, "/tmp/wb.db");
        let config = Config::from_env();
        std::env::remove_var(ENV_CLIENT_ID);
        std::env::remove_var(ENV_DATABASE_PATH);

        let config = config.unwrap();
        assert_eq!(config.identity.client_id, "cli");
        assert_eq!(config.backend.database_path.as_deref(), Some("/tmp/wb.db"));
    }

    #[test]
    #[serial]
    fn test_blank_env_ignored() {
        std::env::set_var(ENV_PROJECT_ID, "  ");
        let config = Config::from_env();
        std::env::remove_var(ENV_PROJECT_ID);
        assert_eq!(config.unwrap().backend.project_id, "default");
    }
}
