//! JWT claims for `RecipeBox` access and refresh tokens.

use recipebox_core::api::Roles;
use serde::{Deserialize, Serialize};

/// Claims embedded in short-lived access tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessClaims {
    /// JWT ID (unique per token).
    pub jti: String,
    /// Subject (user ID).
    pub sub: String,
    pub username: String,
    pub roles: Roles,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Claims embedded in refresh tokens. Carries no roles; those are re-read
/// from the store when the token is exchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshClaims {
    pub jti: String,
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
}
