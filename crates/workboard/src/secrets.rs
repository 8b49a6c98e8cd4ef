//! Secret resolution for API keys and OAuth client secrets.
//!
//! A secret may be given three ways, checked in this order:
//!
//! 1. Direct value in the config file (`apiKey: "..."`), for local testing
//! 2. File path (`apiKeyFile: /run/secrets/workboard`), for mounted secrets
//! 3. Environment variable name (`apiKeyEnvVar: WORKBOARD_KEY`)
//!
//! Empty strings count as unset.

use secrecy::SecretString;
use std::fs;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },
}

pub type Result<T> = std::result::Result<T, SecretError>;

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Resolves a secret from the first configured source. File and env var
/// values are trimmed.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    if let Some(value) = non_empty(direct) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = non_empty(file_path) {
        let expanded = expand_home(path);
        let content = fs::read_to_string(&expanded).map_err(|source| SecretError::FileReadError {
            path: expanded.clone(),
            source,
        })?;
        return Ok(SecretString::from(content.trim().to_string()));
    }

    if let Some(name) = non_empty(env_var) {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

/// Like [`resolve_secret`], but no configured source is `Ok(None)`.
pub fn resolve_secret_optional(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<Option<SecretString>> {
    match resolve_secret(direct, file_path, env_var) {
        Ok(secret) => Ok(Some(secret)),
        Err(SecretError::NoSourceProvided) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Expands a leading `~` to the home directory. `~user` forms are left
/// untouched.
pub fn expand_home(path: &str) -> String {
    if path != "~" && !path.starts_with("~/") {
        return path.to_string();
    }
    match dirs::home_dir() {
        Some(home) => {
            let home = home.to_string_lossy();
            if path == "~" {
                home.into_owned()
            } else {
                path.replacen('~', &home, 1)
            }
        }
        None => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    #[serial]
    fn test_direct_value_wins() {
        std::env::set_var("WORKBOARD_TEST_SECRET_1", "env_value");
        let secret =
            resolve_secret(Some("direct"), None, Some("WORKBOARD_TEST_SECRET_1")).unwrap();
        assert_eq!(secret.expose_secret(), "direct");
        std::env::remove_var("WORKBOARD_TEST_SECRET_1");
    }

    #[test]
    #[serial]
    fn test_file_before_env() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "  from_file  ").unwrap();

        std::env::set_var("WORKBOARD_TEST_SECRET_2", "env_value");
        let secret = resolve_secret(
            None,
            Some(file.path().to_str().unwrap()),
            Some("WORKBOARD_TEST_SECRET_2"),
        )
        .unwrap();
        assert_eq!(secret.expose_secret(), "from_file");
        std::env::remove_var("WORKBOARD_TEST_SECRET_2");
    }

    #[test]
    #[serial]
    fn test_empty_values_skipped() {
        std::env::set_var("WORKBOARD_TEST_SECRET_3", "env_value\n");
        let secret = resolve_secret(Some(""), Some(""), Some("WORKBOARD_TEST_SECRET_3")).unwrap();
        assert_eq!(secret.expose_secret(), "env_value");
        std::env::remove_var("WORKBOARD_TEST_SECRET_3");
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            resolve_secret(None, None, None),
            Err(SecretError::NoSourceProvided)
        ));
        assert!(matches!(
            resolve_secret(None, Some("/nonexistent/secret"), None),
            Err(SecretError::FileReadError { .. })
        ));
        assert!(matches!(
            resolve_secret(None, None, Some("WORKBOARD_DEFINITELY_UNSET_9876")),
            Err(SecretError::EnvVarNotSet { .. })
        ));
    }

    #[test]
    fn test_optional() {
        assert!(resolve_secret_optional(None, Some(""), None).unwrap().is_none());
        assert!(resolve_secret_optional(Some("x"), None, None).unwrap().is_some());
        assert!(resolve_secret_optional(None, Some("/nonexistent/secret"), None).is_err());
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/absolute/path"), "/absolute/path");
        assert_eq!(expand_home("relative/path"), "relative/path");
        assert_eq!(expand_home("~alice/x"), "~alice/x");

        if let Some(home) = dirs::home_dir() {
            let home = home.to_string_lossy().into_owned();
            assert_eq!(expand_home("~"), home);
            assert_eq!(expand_home("~/data"), format!("{}/data", home));
        }
    }
}
