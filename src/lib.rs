//! Equipment Gateway Library
//!
//! Request admission for the equipment-management API: host validation,
//! body limits, CORS, bearer-token authentication with a revocation
//! blacklist, prefix routing to collaborator groups, and a liveness probe.

pub mod auth;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod store;
pub mod upstream;

pub use config::schema::GatewayConfig;
pub use http::{Collaborators, HttpServer};
pub use lifecycle::Shutdown;
