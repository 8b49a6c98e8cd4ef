pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod identity;
pub mod logging;
pub mod model;
pub mod secrets;
pub mod store;
pub mod subscription;
pub mod views;
pub mod wizard;

pub use config::{load_config, load_config_from_str, Config};
pub use db::Database;
pub use error::{ConfigError, Result, WorkboardError};
pub use gateway::{Collection, DataGateway, Document, DocumentFilter, GatewayError};
pub use identity::{DeviceFlowProvider, IdentityGateway, IdentityProvider, Session};
pub use logging::init_logging;
pub use secrets::{resolve_secret, resolve_secret_optional, SecretError};
pub use store::{AppStore, SessionHost, StoreError, StoreEvent, StoreScope};
pub use subscription::Subscription;
pub use wizard::{ProjectForm, TaskForm, ValidationErrors, Wizard};
