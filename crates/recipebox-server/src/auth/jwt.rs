//! JWT token issuance and validation.
//!
//! Access and refresh tokens are signed with separate secrets, so a refresh
//! token never verifies as an access token and vice versa.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use recipebox_core::api::Roles;
use recipebox_core::db::unix_timestamp;
use serde::de::DeserializeOwned;
use sha2::{Digest, Sha256};

use super::claims::{AccessClaims, RefreshClaims};

/// Access token lifetime: 10 minutes.
pub const ACCESS_TTL_SECS: i64 = 10 * 60;
/// Refresh token lifetime: 7 days.
pub const REFRESH_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,

    #[error("invalid token: {0}")]
    Invalid(jsonwebtoken::errors::Error),

    #[error("failed to sign token: {0}")]
    Signing(jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Short failure label for logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Expired => "expired",
            Self::Invalid(_) => "invalid",
            Self::Signing(_) => "signing",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid(e),
        }
    }
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl KeyPair {
    fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// Manages JWT token creation and validation.
pub struct JwtManager {
    access: KeyPair,
    refresh: KeyPair,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
    validation: Validation,
}

impl JwtManager {
    /// Create a `JwtManager` with the default lifetimes.
    pub fn new(access_secret: &[u8], refresh_secret: &[u8]) -> Self {
        Self::with_ttls(
            access_secret,
            refresh_secret,
            ACCESS_TTL_SECS,
            REFRESH_TTL_SECS,
        )
    }

    pub fn with_ttls(
        access_secret: &[u8],
        refresh_secret: &[u8],
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            access: KeyPair::from_secret(access_secret),
            refresh: KeyPair::from_secret(refresh_secret),
            access_ttl_secs,
            refresh_ttl_secs,
            validation,
        }
    }

    pub const fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_secs
    }

    /// Issue an access token carrying the user's identity and roles.
    pub fn issue_access_token(
        &self,
        user_id: &str,
        username: &str,
        roles: &Roles,
    ) -> Result<String, TokenError> {
        let now = unix_timestamp();
        let claims = AccessClaims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: user_id.to_string(),
            username: username.to_string(),
            roles: roles.clone(),
            iat: now,
            exp: now + self.access_ttl_secs,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.access.encoding)
            .map_err(TokenError::Signing)
    }

    /// Issue a refresh token for the given user.
    pub fn issue_refresh_token(&self, user_id: &str, username: &str) -> Result<String, TokenError> {
        let now = unix_timestamp();
        let claims = RefreshClaims {
            jti: uuid::Uuid::new_v4().to_string(),
            sub: user_id.to_string(),
            username: username.to_string(),
            iat: now,
            exp: now + self.refresh_ttl_secs,
        };

        jsonwebtoken::encode(&Header::default(), &claims, &self.refresh.encoding)
            .map_err(TokenError::Signing)
    }

    pub fn verify_access(&self, token: &str) -> Result<AccessClaims, TokenError> {
        self.decode(token, &self.access)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims, TokenError> {
        self.decode(token, &self.refresh)
    }

    fn decode<T: DeserializeOwned>(&self, token: &str, keys: &KeyPair) -> Result<T, TokenError> {
        let data = jsonwebtoken::decode::<T>(token, &keys.decoding, &self.validation)?;
        Ok(data.claims)
    }

    /// Hash a token for storage (raw refresh tokens are never persisted).
    pub fn hash_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}
