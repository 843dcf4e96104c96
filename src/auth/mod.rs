//! Bearer-token authentication.
//!
//! # Data Flow
//! ```text
//! Authorization: Bearer <token>
//!     → middleware.rs (extract header)
//!     → tokens.rs (HS256 signature → exp → token_type → blacklist)
//!     → AuthenticatedUser in request extensions
//! ```
//!
//! # Design Decisions
//! - Every failure maps to the same 401; the reason is only logged
//! - Refresh tokens are never accepted as bearer credentials
//! - Refresh tokens are not rotated; logout blacklists them

pub mod claims;
pub mod handlers;
pub mod middleware;
pub mod tokens;

use thiserror::Error;

use crate::store::StoreError;

pub use claims::{Claims, TokenType};
pub use middleware::{authenticate_request, AuthenticatedUser};
pub use tokens::{TokenPair, TokenService};

/// Internal reasons a token was refused. Never shown to clients.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing Authorization header")]
    MissingHeader,

    #[error("malformed Authorization header")]
    MalformedHeader,

    #[error("invalid token: {0}")]
    Invalid(String),

    #[error("token expired")]
    Expired,

    #[error("unexpected token type {0:?}")]
    WrongTokenType(TokenType),

    #[error("token blacklisted")]
    Blacklisted,

    #[error("blacklist lookup failed: {0}")]
    Store(#[from] StoreError),

    #[error("token encoding failed: {0}")]
    Encode(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Short label for metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::MissingHeader => "missing_header",
            AuthError::MalformedHeader => "malformed_header",
            AuthError::Invalid(_) => "invalid",
            AuthError::Expired => "expired",
            AuthError::WrongTokenType(_) => "wrong_type",
            AuthError::Blacklisted => "blacklisted",
            AuthError::Store(_) => "store",
            AuthError::Encode(_) | AuthError::Internal(_) => "internal",
        }
    }
}
