//! Identity error types.

use thiserror::Error;

/// Errors from sign-in, refresh and sign-out.
#[derive(Error, Debug)]
pub enum IdentityError {
    /// The provider rejected the request or returned something unusable.
    #[error("Identity provider error: {0}")]
    Provider(String),

    /// The user declined the authorization request.
    #[error("User denied the authorization request")]
    Denied,

    /// The device code expired before the user authorized it.
    #[error("Device code expired before authorization")]
    Expired,

    /// Transport failure talking to the provider.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Missing or invalid provider settings.
    #[error("Invalid identity configuration: {0}")]
    Config(String),

    /// Refresh was requested with no active session.
    #[error("No user is signed in")]
    NotSignedIn,
}

impl From<reqwest::Error> for IdentityError {
    fn from(err: reqwest::Error) -> Self {
        IdentityError::Http(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, IdentityError>;
