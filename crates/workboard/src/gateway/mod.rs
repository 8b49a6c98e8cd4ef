//! Remote data gateway.
//!
//! Translates entity-level operations into document-store calls. The gateway
//! owns no entity state: every read goes to the store, every failure is
//! returned to the caller unchanged, and nothing is retried.
//!
//! - [`DataGateway`]: typed create/list/get/update/delete/subscribe
//! - [`DocumentStore`]: the backend seam, implemented by [`SqliteDocumentStore`]
//! - [`Collection`]: dispatch key for collection-specific behavior

pub mod collection;
pub mod data;
pub mod document;
pub mod error;
pub mod filter;
pub mod sqlite;
pub mod stats;

pub use collection::{Collection, Document};
pub use data::DataGateway;
pub use document::{ChangeEvent, ChangeKind, DocumentStore, StoredDocument};
pub use error::GatewayError;
pub use filter::{DocumentFilter, FieldCondition, SortOrder};
pub use sqlite::SqliteDocumentStore;
pub use stats::{ProjectStats, UserStats};
