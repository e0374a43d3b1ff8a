//! Authentication for the `RecipeBox` server.
//!
//! Password hashing, access/refresh JWT management and the refresh-token
//! cookie.

pub mod claims;
pub mod cookie;
pub mod jwt;
pub mod password;

pub use claims::{AccessClaims, RefreshClaims};
pub use cookie::SessionCookie;
pub use jwt::{JwtManager, TokenError};
pub use password::PasswordError;
