//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Config → Store (dir + blacklist) → Token service → Server → Listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → broadcast → server drains, janitor exits
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{open_token_service, run, StartupError};
