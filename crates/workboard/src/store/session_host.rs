//! Ties the store's lifetime to the signed-in identity.

use std::sync::Arc;

use tokio::sync::watch;

use super::app_store::AppStore;
use crate::config::StoreConfig;
use crate::gateway::DataGateway;
use crate::identity::IdentityGateway;
use crate::model::Identity;
use crate::subscription::Subscription;

/// Creates and loads an [`AppStore`] when a user signs in and tears it down
/// when they sign out. Token refreshes for the same user keep the store.
pub struct SessionHost {
    gateway: DataGateway,
    config: StoreConfig,
    active: watch::Sender<Option<Arc<AppStore>>>,
}

impl SessionHost {
    pub fn new(gateway: DataGateway, config: StoreConfig) -> Self {
        let (active, _) = watch::channel(None);
        Self {
            gateway,
            config,
            active,
        }
    }

    /// The store for the current session, if someone is signed in.
    pub fn active(&self) -> Option<Arc<AppStore>> {
        self.active.borrow().clone()
    }

    /// Notifies when a session store is installed or removed.
    pub fn watch(&self) -> watch::Receiver<Option<Arc<AppStore>>> {
        self.active.subscribe()
    }

    /// Applies one identity value: builds a fresh store for a new user,
    /// drops it on sign-out, and ignores repeats for the current user.
    pub async fn on_identity(&self, identity: Option<Identity>) {
        let current = self.active();
        match (identity, current) {
            (Some(identity), Some(store)) if store.identity().uid == identity.uid => {
                log::debug!("Identity refreshed for {}, keeping store", identity.uid);
            }
            (Some(identity), current) => {
                // Nothing is handed out while the next user's data loads.
                if let Some(previous) = current {
                    previous.teardown();
                    self.active.send_replace(None);
                }
                let store = Arc::new(AppStore::new(
                    self.gateway.clone(),
                    identity,
                    self.config.scope,
                ));
                store.load_all().await;
                if self.config.live_sync {
                    store.start_live_sync();
                }
                self.active.send_replace(Some(store));
            }
            (None, Some(store)) => {
                store.teardown();
                self.active.send_replace(None);
            }
            (None, None) => {}
        }
    }

    /// Follows the identity gateway until the returned handle is cancelled.
    /// Identity changes are applied one at a time, in order.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn attach(self: &Arc<Self>, identity: &IdentityGateway) -> Subscription {
        let mut rx = identity.watch();
        let host = Arc::clone(self);
        Subscription::spawn("session-host", move |cancelled| async move {
            loop {
                let current = rx.borrow_and_update().clone();
                if cancelled.is_set() {
                    break;
                }
                host.on_identity(current).await;
                if rx.changed().await.is_err() {
                    break;
                }
            }
        })
    }
}
