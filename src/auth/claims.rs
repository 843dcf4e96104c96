//! JWT claim set shared by access and refresh tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Distinguishes access tokens from refresh tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Claims carried by every token the gateway signs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: TokenType,
    pub exp: i64,
    pub iat: i64,
    /// Unique token id, used as the blacklist key.
    pub jti: String,
    /// Tokens from the auth collaborator carry a numeric id; ours carry a string.
    #[serde(deserialize_with = "user_id_from_string_or_int")]
    pub user_id: String,
}

impl Claims {
    /// Fresh claims with a random `jti`, valid for `lifetime` from `issued_at`.
    pub fn new(
        user_id: impl Into<String>,
        token_type: TokenType,
        issued_at: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        Self {
            token_type,
            exp: (issued_at + lifetime).timestamp(),
            iat: issued_at.timestamp(),
            jti: Uuid::new_v4().simple().to_string(),
            user_id: user_id.into(),
        }
    }
}

fn user_id_from_string_or_int<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUserId {
        Text(String),
        Signed(i64),
        Unsigned(u64),
    }

    Ok(match RawUserId::deserialize(deserializer)? {
        RawUserId::Text(id) => id,
        RawUserId::Signed(id) => id.to_string(),
        RawUserId::Unsigned(id) => id.to_string(),
    })
}
