//! Identity gateway.
//!
//! Authentication is delegated to an external provider behind the
//! [`IdentityProvider`] trait. [`IdentityGateway`] holds the session and
//! broadcasts identity changes; [`DeviceFlowProvider`] is the shipped
//! provider.

pub mod device_flow;
pub mod error;
pub mod gateway;
pub mod provider;

pub use device_flow::{DeviceCode, DeviceFlowProvider, DevicePrompt, LogPrompt};
pub use error::IdentityError;
pub use gateway::IdentityGateway;
pub use provider::{IdentityProvider, Session};
