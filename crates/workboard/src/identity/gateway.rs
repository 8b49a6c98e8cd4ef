//! Session holder and identity change notifications.

use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tracing::Instrument;

use super::error::{IdentityError, Result};
use super::provider::{IdentityProvider, Session};
use crate::model::Identity;
use crate::subscription::Subscription;

/// Identity gateway.
///
/// Wraps an [`IdentityProvider`] and republishes the current identity on a
/// watch channel. Every sign-in, refresh and sign-out publishes, so
/// observers also fire on token refresh with an unchanged identity.
pub struct IdentityGateway {
    provider: Arc<dyn IdentityProvider>,
    session: Mutex<Option<Session>>,
    identity: watch::Sender<Option<Identity>>,
}

impl IdentityGateway {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            provider,
            session: Mutex::new(None),
            identity,
        }
    }

    /// Runs the provider's sign-in flow and publishes the new identity.
    pub async fn sign_in(&self) -> Result<Identity> {
        let session = self
            .provider
            .sign_in()
            .instrument(tracing::info_span!("identity.sign_in"))
            .await?;
        let identity = session.identity.clone();

        *self.session.lock().await = Some(session);
        log::info!("Signed in as {}", identity.label());
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// Clears the session and publishes `None`.
    ///
    /// A provider that fails to revoke the session is logged; the local
    /// session is cleared regardless.
    pub async fn sign_out(&self) -> Result<()> {
        let session = self.session.lock().await.take();
        if let Some(session) = session {
            if let Err(e) = self.provider.sign_out(&session).await {
                log::warn!("Provider sign-out failed: {}", e);
            }
            log::info!("Signed out {}", session.identity.label());
        }
        self.identity.send_replace(None);
        Ok(())
    }

    /// Refreshes the session's tokens and republishes the identity.
    pub async fn refresh(&self) -> Result<Identity> {
        let mut guard = self.session.lock().await;
        let current = guard.as_ref().ok_or(IdentityError::NotSignedIn)?;
        let refreshed = self
            .provider
            .refresh(current)
            .instrument(tracing::info_span!("identity.refresh"))
            .await?;
        let identity = refreshed.identity.clone();
        *guard = Some(refreshed);
        drop(guard);

        log::debug!("Refreshed session for {}", identity.label());
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    /// The currently signed-in identity, if any.
    pub fn current(&self) -> Option<Identity> {
        self.identity.borrow().clone()
    }

    /// A raw receiver for callers that prefer awaiting changes directly.
    pub fn watch(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }

    /// Calls `callback` with the current identity before returning, then
    /// again on every sign-in, refresh and sign-out.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn observe_identity<F>(&self, callback: F) -> Subscription
    where
        F: Fn(Option<Identity>) + Send + Sync + 'static,
    {
        let mut rx = self.identity.subscribe();
        let initial = rx.borrow_and_update().clone();
        callback(initial);

        Subscription::spawn("identity", move |cancelled| async move {
            while rx.changed().await.is_ok() {
                let value = rx.borrow_and_update().clone();
                if cancelled.is_set() {
                    break;
                }
                callback(value);
            }
        })
    }
}
