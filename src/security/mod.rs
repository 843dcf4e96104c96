//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → cors.rs (preflight answered here; origin checked)
//!     → headers.rs (security headers on the way out)
//!     → limits.rs (body size)
//!     → hosts.rs (Host header)
//!     → Pass to routing
//! ```
//!
//! # Design Decisions
//! - Fail closed: reject on any security check failure
//! - No trust in client input

pub mod cors;
pub mod headers;
pub mod hosts;
pub mod limits;

pub use cors::{cors_middleware, CorsPolicy};
pub use headers::with_security_headers;
pub use hosts::{host_guard, AllowedHosts};
pub use limits::with_body_limit;
