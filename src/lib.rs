pub mod auth;
pub mod config;
pub mod connector;
pub mod error;
pub mod http;
pub mod mcp;
pub mod models;
pub mod validation;

pub use config::ConnectorConfig;
pub use connector::Connector;
pub use error::ApiError;
