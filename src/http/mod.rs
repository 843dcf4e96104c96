//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware pipeline)
//!     → request.rs (request ID, tracing span)
//!     → [security stages: CORS, headers, limits, hosts]
//!     → server.rs dispatch (route lookup, method check, bearer auth)
//!     → group router (health, token endpoints, collaborators)
//!     → error.rs (uniform JSON error bodies)
//! ```

pub mod error;
pub mod request;
pub mod server;

pub use error::GatewayError;
pub use request::X_REQUEST_ID;
pub use server::{AppState, Collaborators, HttpServer};
