//! Validated server configuration.
//!
//! Built once at startup from command-line flags and environment; a bad
//! value is a fatal startup error, never a per-request one.

use regex::Regex;

use crate::auth::jwt::{ACCESS_TTL_SECS, REFRESH_TTL_SECS};

/// Origins allowed by default: localhost and 127.0.0.1 over HTTP(S) on any port.
pub const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    r"^https?://localhost(:\d+)?$",
    r"^https?://127\.0\.0\.1(:\d+)?$",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must not be empty")]
    EmptySecret(&'static str),

    #[error("{0} must be positive, got {1}")]
    InvalidTtl(&'static str, i64),

    #[error("invalid allowed-origin pattern {pattern:?}: {source}")]
    OriginPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Clone)]
pub struct ServerConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub allowed_origins: Vec<Regex>,
    /// Mark the refresh cookie `Secure; SameSite=None`.
    pub secure_cookies: bool,
}

impl ServerConfig {
    /// Validate secrets and compile origin patterns.
    pub fn new(
        access_secret: impl Into<String>,
        refresh_secret: impl Into<String>,
        origin_patterns: &[String],
    ) -> Result<Self, ConfigError> {
        let access_secret = access_secret.into();
        let refresh_secret = refresh_secret.into();
        if access_secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret("ACCESS_TOKEN_SECRET"));
        }
        if refresh_secret.trim().is_empty() {
            return Err(ConfigError::EmptySecret("REFRESH_TOKEN_SECRET"));
        }

        let allowed_origins = origin_patterns
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|source| ConfigError::OriginPattern {
                    pattern: pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            access_secret,
            refresh_secret,
            access_ttl_secs: ACCESS_TTL_SECS,
            refresh_ttl_secs: REFRESH_TTL_SECS,
            allowed_origins,
            secure_cookies: true,
        })
    }

    pub fn with_ttls(
        mut self,
        access_ttl_secs: i64,
        refresh_ttl_secs: i64,
    ) -> Result<Self, ConfigError> {
        if access_ttl_secs <= 0 {
            return Err(ConfigError::InvalidTtl("access token TTL", access_ttl_secs));
        }
        if refresh_ttl_secs <= 0 {
            return Err(ConfigError::InvalidTtl("refresh token TTL", refresh_ttl_secs));
        }
        self.access_ttl_secs = access_ttl_secs;
        self.refresh_ttl_secs = refresh_ttl_secs;
        Ok(self)
    }

    #[must_use]
    pub const fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.secure_cookies = secure;
        self
    }

    pub fn default_origin_patterns() -> Vec<String> {
        DEFAULT_ALLOWED_ORIGINS
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|re| re.is_match(origin))
    }
}

impl std::fmt::Debug for ServerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServerConfig")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_secs", &self.refresh_ttl_secs)
            .field("allowed_origins", &self.allowed_origins)
            .field("secure_cookies", &self.secure_cookies)
            .finish_non_exhaustive()
    }
}
