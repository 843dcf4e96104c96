//! Token issuance, verification and revocation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;

use crate::auth::claims::{Claims, TokenType};
use crate::auth::AuthError;
use crate::config::{JwtConfig, Secret};
use crate::store::{BlacklistEntry, TokenBlacklist};

/// An access/refresh token pair handed out at login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Signs and validates HS256 tokens against a shared blacklist.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
    blacklist: Arc<dyn TokenBlacklist>,
}

impl TokenService {
    pub fn new(secret: &Secret, jwt: &JwtConfig, blacklist: Arc<dyn TokenBlacklist>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            encoding: EncodingKey::from_secret(secret.expose().as_bytes()),
            decoding: DecodingKey::from_secret(secret.expose().as_bytes()),
            validation,
            access_lifetime: Duration::seconds(jwt.access_lifetime_secs),
            refresh_lifetime: Duration::seconds(jwt.refresh_lifetime_secs),
            blacklist,
        }
    }

    /// Issue a new access/refresh pair for a user.
    pub fn issue_pair(&self, user_id: &str) -> Result<TokenPair, AuthError> {
        Ok(TokenPair {
            access: self.issue(user_id, TokenType::Access)?,
            refresh: self.issue(user_id, TokenType::Refresh)?,
        })
    }

    /// Issue a single token of the given type, starting now.
    pub fn issue(&self, user_id: &str, token_type: TokenType) -> Result<String, AuthError> {
        let lifetime = match token_type {
            TokenType::Access => self.access_lifetime,
            TokenType::Refresh => self.refresh_lifetime,
        };
        self.sign(&Claims::new(user_id, token_type, Utc::now(), lifetime))
    }

    /// Sign an arbitrary claim set.
    pub fn sign(&self, claims: &Claims) -> Result<String, AuthError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|e| AuthError::Encode(e.to_string()))
    }

    /// Full validation: signature, expiry, token type, then blacklist.
    pub async fn validate(&self, token: &str, expected: TokenType) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        if claims.token_type != expected {
            return Err(AuthError::WrongTokenType(claims.token_type));
        }
        self.ensure_not_blacklisted(claims).await
    }

    /// Validation that accepts either token type.
    pub async fn validate_any(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        self.ensure_not_blacklisted(claims).await
    }

    /// Exchange a refresh token for a new access token. The refresh token
    /// itself stays valid; it is not rotated.
    pub async fn refresh(&self, refresh_token: &str) -> Result<String, AuthError> {
        let claims = self.validate(refresh_token, TokenType::Refresh).await?;
        self.issue(&claims.user_id, TokenType::Access)
    }

    /// Blacklist a refresh token (logout). Fails if the token is already
    /// invalid, including when it was revoked before.
    pub async fn revoke(&self, refresh_token: &str) -> Result<Claims, AuthError> {
        let claims = self.validate(refresh_token, TokenType::Refresh).await?;
        let entry = BlacklistEntry {
            jti: claims.jti.clone(),
            user_id: claims.user_id.clone(),
            token_type: claims.token_type.as_str().to_string(),
            expires_at: claims.exp,
        };
        let blacklist = Arc::clone(&self.blacklist);
        tokio::task::spawn_blocking(move || blacklist.blacklist(&entry))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))??;
        tracing::info!(user_id = %claims.user_id, jti = %claims.jti, "Refresh token blacklisted");
        Ok(claims)
    }

    /// Blacklist handle, for maintenance tasks.
    pub fn blacklist(&self) -> Arc<dyn TokenBlacklist> {
        Arc::clone(&self.blacklist)
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::Expired,
                _ => AuthError::Invalid(e.to_string()),
            })
    }

    async fn ensure_not_blacklisted(&self, claims: Claims) -> Result<Claims, AuthError> {
        let blacklist = Arc::clone(&self.blacklist);
        let jti = claims.jti.clone();
        let revoked = tokio::task::spawn_blocking(move || blacklist.is_blacklisted(&jti))
            .await
            .map_err(|e| AuthError::Internal(e.to_string()))??;
        if revoked {
            return Err(AuthError::Blacklisted);
        }
        Ok(claims)
    }
}
