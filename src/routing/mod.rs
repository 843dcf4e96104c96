//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path, method)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate prefix)
//!     → Return: matched RouteSpec or NoMatch
//!
//! Route metadata consulted before dispatch:
//!     methods → 405 on mismatch
//!     auth    → bearer stage for AuthPolicy::Bearer
//! ```
//!
//! # Design Decisions
//! - Routes declared at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (table order)

pub mod matcher;
pub mod router;

pub use router::{AuthPolicy, RouteGroup, RouteSpec, RouteTable};
