//! Gateway error types.

use thiserror::Error;

use super::collection::Collection;
use crate::db::DatabaseError;

/// Errors surfaced by gateway calls. Nothing is retried.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Transport-level failure from the backing store.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// The requested document does not exist.
    #[error("Document '{id}' not found in {collection}")]
    NotFound { collection: Collection, id: String },

    /// The backend refused the write (read-only database, denied access).
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// A draft, patch or stored body did not map to the expected shape.
    #[error("Invalid document data: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The blocking worker running the store call failed.
    #[error("Background task failed: {0}")]
    TaskJoin(String),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, GatewayError::NotFound { .. })
    }
}
