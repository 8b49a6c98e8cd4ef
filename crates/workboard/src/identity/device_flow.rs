//! OAuth2 Device Authorization Grant (RFC 8628) identity provider.
//!
//! Suits a terminal client: the user opens the verification URL on any
//! device, enters the code, and this side polls the token endpoint until the
//! grant completes. The signed-in profile comes from the userinfo endpoint.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info, warn};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::{IdentityError, Result};
use super::provider::{IdentityProvider, Session};
use crate::config::IdentityConfig;
use crate::model::Identity;
use crate::secrets;

/// Maximum length for error bodies echoed into errors and logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Floor for the polling window so a tiny `expires_in` or clock skew does
/// not end the flow before the first poll.
const MIN_POLL_TTL_SECS: u64 = 5;

const MAX_POLL_INTERVAL: Duration = Duration::from_secs(30);

const DEVICE_CODE_GRANT_TYPE: &str = "urn:ietf:params:oauth:grant-type:device_code";

fn truncate_body(body: &str) -> String {
    if body.len() > MAX_ERROR_BODY_LENGTH {
        let mut end = MAX_ERROR_BODY_LENGTH;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}... (truncated)", &body[..end])
    } else {
        body.to_string()
    }
}

/// Response from the device authorization endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceCode {
    pub device_code: String,
    /// Code the user types at the verification URI.
    pub user_code: String,
    pub verification_uri: String,
    /// Verification URI with the user code embedded, for QR codes.
    #[serde(default)]
    pub verification_uri_complete: Option<String>,
    /// Lifetime in seconds of the device and user codes.
    pub expires_in: u64,
    /// Minimum polling interval in seconds.
    #[serde(default = "default_interval")]
    pub interval: u64,
}

fn default_interval() -> u64 {
    5
}

#[derive(Debug, Clone, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// OpenID Connect userinfo claims we care about.
#[derive(Debug, Clone, Deserialize)]
struct UserInfo {
    sub: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

impl From<UserInfo> for Identity {
    fn from(info: UserInfo) -> Self {
        Identity {
            uid: info.sub,
            display_name: info.name,
            email: info.email,
            photo_url: info.picture,
        }
    }
}

/// What to do after a non-success poll response.
#[derive(Debug, PartialEq, Eq)]
enum PollStep {
    Continue,
    SlowDown,
}

fn classify_poll_error(error: &TokenErrorResponse) -> Result<PollStep> {
    match error.error.as_str() {
        "authorization_pending" => Ok(PollStep::Continue),
        "slow_down" => Ok(PollStep::SlowDown),
        "expired_token" => Err(IdentityError::Expired),
        "access_denied" => Err(IdentityError::Denied),
        other => Err(IdentityError::Provider(format!(
            "Token request error: {} - {}",
            other,
            error.error_description.clone().unwrap_or_default()
        ))),
    }
}

/// Shows the verification URI and user code to the user.
pub trait DevicePrompt: Send + Sync {
    fn show(&self, code: &DeviceCode);
}

/// Prompt that writes the instructions to the log.
pub struct LogPrompt;

impl DevicePrompt for LogPrompt {
    fn show(&self, code: &DeviceCode) {
        info!(
            "To sign in, visit {} and enter code {}",
            code.verification_uri, code.user_code
        );
    }
}

/// Identity provider speaking the OAuth2 device flow.
pub struct DeviceFlowProvider {
    client: Client,
    client_id: String,
    client_secret: Option<SecretString>,
    device_auth_url: String,
    token_url: String,
    userinfo_url: String,
    scopes: Vec<String>,
    prompt: Arc<dyn DevicePrompt>,
}

impl DeviceFlowProvider {
    pub fn new(config: &IdentityConfig, prompt: Arc<dyn DevicePrompt>) -> Result<Self> {
        let require = |value: &str, name: &str| {
            if value.trim().is_empty() {
                Err(IdentityError::Config(format!("{} is required", name)))
            } else {
                Ok(value.to_string())
            }
        };

        let client_secret = secrets::resolve_secret_optional(
            config.client_secret.as_deref(),
            config.client_secret_file.as_deref(),
            config.client_secret_env_var.as_deref(),
        )
        .map_err(|e| IdentityError::Config(e.to_string()))?;

        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| IdentityError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            client_id: require(&config.client_id, "identity.clientId")?,
            client_secret,
            device_auth_url: require(&config.device_auth_url, "identity.deviceAuthUrl")?,
            token_url: require(&config.token_url, "identity.tokenUrl")?,
            userinfo_url: require(&config.userinfo_url, "identity.userinfoUrl")?,
            scopes: config.scopes.clone(),
            prompt,
        })
    }

    fn credential_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("client_id", self.client_id.clone())];
        if let Some(secret) = &self.client_secret {
            params.push(("client_secret", secret.expose_secret().to_string()));
        }
        params
    }

    /// Step 1: obtain a device code and user code.
    pub async fn request_device_code(&self) -> Result<DeviceCode> {
        let scope = self.scopes.join(" ");
        info!("Requesting device code from {}", self.device_auth_url);

        let mut params = self.credential_params();
        params.push(("scope", scope));

        let response = self
            .client
            .post(&self.device_auth_url)
            .form(&params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Provider(format!(
                "Device code request failed ({}): {}",
                status,
                truncate_body(&body)
            )));
        }

        let code: DeviceCode = response
            .json()
            .await
            .map_err(|e| IdentityError::Provider(format!("Failed to parse device code: {}", e)))?;
        debug!("Device code received, expires in {}s", code.expires_in);
        Ok(code)
    }

    /// Step 2: poll the token endpoint until the user acts or the code
    /// expires.
    async fn poll_for_token(&self, code: &DeviceCode) -> Result<TokenResponse> {
        let ttl_secs = code.expires_in.max(MIN_POLL_TTL_SECS);
        let deadline = std::time::Instant::now() + Duration::from_secs(ttl_secs);
        let mut interval = Duration::from_secs(code.interval).max(Duration::from_secs(1));

        loop {
            if std::time::Instant::now() > deadline {
                return Err(IdentityError::Expired);
            }

            tokio::time::sleep(interval).await;

            let mut params = self.credential_params();
            params.push(("device_code", code.device_code.clone()));
            params.push(("grant_type", DEVICE_CODE_GRANT_TYPE.to_string()));

            let response = self.client.post(&self.token_url).form(&params).send().await?;

            if response.status().is_success() {
                return response.json().await.map_err(|e| {
                    IdentityError::Provider(format!("Failed to parse token response: {}", e))
                });
            }

            let error: TokenErrorResponse = response.json().await.map_err(|e| {
                IdentityError::Provider(format!("Failed to parse error response: {}", e))
            })?;

            match classify_poll_error(&error)? {
                PollStep::Continue => debug!("Authorization pending"),
                PollStep::SlowDown => {
                    interval = (interval + Duration::from_secs(5)).min(MAX_POLL_INTERVAL);
                    warn!("Server requested slow down, new interval: {:?}", interval);
                }
            }
        }
    }

    /// Fetches the profile for an access token.
    async fn fetch_identity(&self, access_token: &SecretString) -> Result<Identity> {
        let response = self
            .client
            .get(&self.userinfo_url)
            .bearer_auth(access_token.expose_secret())
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Provider(format!(
                "Userinfo request failed ({}): {}",
                status,
                truncate_body(&body)
            )));
        }

        let info: UserInfo = response
            .json()
            .await
            .map_err(|e| IdentityError::Provider(format!("Failed to parse userinfo: {}", e)))?;
        Ok(info.into())
    }
}

fn session_from(token: TokenResponse, identity: Identity) -> Session {
    Session {
        identity,
        access_token: SecretString::from(token.access_token),
        refresh_token: token.refresh_token.map(SecretString::from),
        expires_at: token
            .expires_in
            .map(|secs| Utc::now() + chrono::Duration::seconds(secs as i64)),
    }
}

#[async_trait]
impl IdentityProvider for DeviceFlowProvider {
    async fn sign_in(&self) -> Result<Session> {
        let code = self.request_device_code().await?;
        self.prompt.show(&code);

        let token = self.poll_for_token(&code).await?;
        let access_token = SecretString::from(token.access_token.clone());
        let identity = self.fetch_identity(&access_token).await?;
        info!("Device authorization completed for {}", identity.uid);
        Ok(session_from(token, identity))
    }

    async fn refresh(&self, session: &Session) -> Result<Session> {
        let refresh_token = session
            .refresh_token
            .as_ref()
            .ok_or_else(|| IdentityError::Provider("Session has no refresh token".to_string()))?;

        let mut params = self.credential_params();
        params.push(("refresh_token", refresh_token.expose_secret().to_string()));
        params.push(("grant_type", "refresh_token".to_string()));

        let response = self.client.post(&self.token_url).form(&params).send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(IdentityError::Provider(format!(
                "Token refresh failed ({}): {}",
                status,
                truncate_body(&body)
            )));
        }

        let mut token: TokenResponse = response.json().await.map_err(|e| {
            IdentityError::Provider(format!("Failed to parse refresh response: {}", e))
        })?;
        // Providers may omit the refresh token when it is not rotated.
        if token.refresh_token.is_none() {
            token.refresh_token = Some(refresh_token.expose_secret().to_string());
        }
        Ok(session_from(token, session.identity.clone()))
    }
}
