//! Cancellation handle for live listeners.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::task::JoinHandle;

/// Shared flag a listener checks before each delivery.
#[derive(Debug, Clone, Default)]
pub(crate) struct Cancelled(Arc<AtomicBool>);

impl Cancelled {
    pub(crate) fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// A running listener. Cancelling or dropping the handle stops delivery.
///
/// The listener task is aborted and its cancellation flag is raised. A
/// callback that already passed the flag check when `cancel` ran may still
/// finish; none starts afterwards.
pub struct Subscription {
    label: String,
    cancelled: Cancelled,
    handle: Option<JoinHandle<()>>,
}

impl Subscription {
    /// Spawns `listener` with the flag it must check before calling back.
    pub(crate) fn spawn<F, Fut>(label: impl Into<String>, listener: F) -> Self
    where
        F: FnOnce(Cancelled) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        let cancelled = Cancelled::default();
        let handle = tokio::spawn(listener(cancelled.clone()));
        Self {
            label: label.into(),
            cancelled,
            handle: Some(handle),
        }
    }

    /// What this subscription listens to, for logs.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns true until the listener is cancelled or its source closes.
    pub fn is_active(&self) -> bool {
        !self.cancelled.is_set() && self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Stops the listener. Calling this more than once is a no-op.
    pub fn cancel(&mut self) {
        self.cancelled.set();
        if let Some(handle) = self.handle.take() {
            handle.abort();
            log::debug!("Subscription '{}' cancelled", self.label);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("label", &self.label)
            .field("active", &self.is_active())
            .finish()
    }
}
