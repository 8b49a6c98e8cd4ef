use thiserror::Error;

use crate::gateway::GatewayError;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The session ended and the store no longer accepts writes.
    #[error("The session has ended")]
    TornDown,
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Gateway(e) if e.is_not_found())
    }
}
