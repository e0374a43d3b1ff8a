//! HTTP-only cookie carrying the refresh token.

use axum::http::header::{COOKIE, InvalidHeaderValue};
use axum::http::{HeaderMap, HeaderValue};
use cookie::{Cookie, SameSite};
use recipebox_core::api::REFRESH_COOKIE;

/// Issues, clears and reads the refresh cookie.
#[derive(Debug, Clone, Copy)]
pub struct SessionCookie {
    secure: bool,
    max_age_secs: i64,
}

impl SessionCookie {
    /// `secure = false` is for plain-HTTP development only. Browsers drop
    /// `SameSite=None` cookies without `Secure`, so that mode falls back to
    /// `SameSite=Lax`.
    pub const fn new(secure: bool, max_age_secs: i64) -> Self {
        Self {
            secure,
            max_age_secs,
        }
    }

    pub fn issue(&self, token: &str) -> Cookie<'static> {
        self.base(token.to_string())
            .max_age(cookie::time::Duration::seconds(self.max_age_secs))
            .build()
    }

    /// A cookie that makes the client discard the refresh token.
    pub fn clear(&self) -> Cookie<'static> {
        let mut cookie = self.base(String::new()).build();
        cookie.make_removal();
        cookie
    }

    fn base(&self, value: String) -> cookie::CookieBuilder<'static> {
        let same_site = if self.secure {
            SameSite::None
        } else {
            SameSite::Lax
        };
        Cookie::build((REFRESH_COOKIE, value))
            .http_only(true)
            .secure(self.secure)
            .same_site(same_site)
            .path("/")
    }

    /// Read the refresh token from the request's `Cookie` headers.
    pub fn extract(headers: &HeaderMap) -> Option<String> {
        headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(Cookie::split_parse)
            .filter_map(Result::ok)
            .find(|c| c.name() == REFRESH_COOKIE && !c.value().is_empty())
            .map(|c| c.value().to_string())
    }
}

/// Render a cookie as a `Set-Cookie` header value.
pub fn set_cookie_value(cookie: &Cookie<'_>) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&cookie.to_string())
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn issued_cookie_attributes() {
        let rendered = SessionCookie::new(true, 604_800).issue("tok").to_string();

        assert!(rendered.starts_with("jwt=tok"));
        assert!(rendered.contains("HttpOnly"));
        assert!(rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=None"));
        assert!(rendered.contains("Path=/"));
        assert!(rendered.contains("Max-Age=604800"));
    }

    #[test]
    fn insecure_mode_uses_lax() {
        let rendered = SessionCookie::new(false, 60).issue("tok").to_string();
        assert!(!rendered.contains("Secure"));
        assert!(rendered.contains("SameSite=Lax"));
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let rendered = SessionCookie::new(true, 604_800).clear().to_string();
        assert!(rendered.starts_with("jwt=;"));
        assert!(rendered.contains("Max-Age=0"));
    }

    #[test]
    fn extract_finds_refresh_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark; jwt=abc.def.ghi"));
        assert_eq!(
            SessionCookie::extract(&headers).as_deref(),
            Some("abc.def.ghi")
        );
    }

    #[test]
    fn extract_without_cookie() {
        let mut headers = HeaderMap::new();
        assert!(SessionCookie::extract(&headers).is_none());

        headers.append(COOKIE, HeaderValue::from_static("jwt="));
        assert!(SessionCookie::extract(&headers).is_none());
    }
}
