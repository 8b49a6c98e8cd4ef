//! Application data store.
//!
//! - [`AppStore`]: the per-session collections, mutations and live sync
//! - [`SessionHost`]: creates and tears down stores as users sign in and out
//! - [`StoreEvent`]: change notifications for the presentation layer

pub mod app_store;
pub mod error;
pub mod events;
pub mod session_host;

pub use app_store::{AppStore, StoreScope, StoreSnapshot};
pub use error::StoreError;
pub use events::StoreEvent;
pub use session_host::SessionHost;
