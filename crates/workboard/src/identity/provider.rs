//! The identity provider seam.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;

use super::error::Result;
use crate::model::Identity;

/// An authenticated session: who the user is plus the tokens that prove it.
#[derive(Debug)]
pub struct Session {
    pub identity: Identity,
    pub access_token: SecretString,
    pub refresh_token: Option<SecretString>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// True once the access token's lifetime has passed. Sessions without an
    /// expiry never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// An external identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Runs the provider's interactive sign-in flow.
    async fn sign_in(&self) -> Result<Session>;

    /// Exchanges the session's refresh token for fresh tokens.
    async fn refresh(&self, session: &Session) -> Result<Session>;

    /// Revokes the session with the provider, when it supports that.
    async fn sign_out(&self, _session: &Session) -> Result<()> {
        Ok(())
    }
}
