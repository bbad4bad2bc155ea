//! Cookie plumbing for opaque session tokens.
//!
//! The token itself is minted and stored by the session port; this module
//! only moves it in and out of the `Cookie`/`Set-Cookie` headers and turns
//! it into a [`Principal`] via an extractor.

use axum::extract::FromRequestParts;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::request::Parts;
use domains::models::Principal;
use domains::AppError;

use crate::error::ApiError;
use crate::AppState;

pub const SESSION_COOKIE: &str = "clubhouse_session";

/// Pulls the session token out of the `Cookie` header, if any.
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    raw.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

/// How login cookies are issued. `max_age_secs` should track the
/// server-side session TTL so the browser drops the cookie when the
/// token it carries has already expired.
#[derive(Debug, Clone, Copy)]
pub struct CookiePolicy {
    pub max_age_secs: i64,
    /// Adds the `Secure` attribute; enable wherever TLS terminates.
    pub secure: bool,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            max_age_secs: 7 * 24 * 60 * 60,
            secure: false,
        }
    }
}

/// `Set-Cookie` value for a fresh login. HttpOnly keeps the token away
/// from scripts; the token is base64url so the value needs no quoting.
pub fn login_cookie(token: &str, policy: CookiePolicy) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        policy.max_age_secs
    );
    if policy.secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|err| ApiError(AppError::internal(err)))
}

/// `Set-Cookie` value that expires the cookie immediately.
pub fn logout_cookie() -> HeaderValue {
    HeaderValue::from_static("clubhouse_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

/// Resolves the request's session, if any. Routes decide what to do with
/// an anonymous caller; the policy engine is the one that says no.
pub struct Session(pub Option<Principal>);

impl FromRequestParts<AppState> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers);
        let principal = state.auth.principal(token.as_deref()).await?;
        Ok(Session(principal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_found_among_other_cookies() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; clubhouse_session=abc123; lang=en"),
        );
        assert_eq!(token_from_headers(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_cookie_header_yields_none() {
        assert_eq!(token_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn unrelated_cookie_yields_none() {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("theme=dark"));
        assert_eq!(token_from_headers(&headers), None);
    }

    #[test]
    fn login_cookie_lifetime_tracks_the_policy() {
        let policy = CookiePolicy {
            max_age_secs: 3600,
            secure: false,
        };
        let value = login_cookie("abc123", policy).unwrap();
        let value = value.to_str().unwrap();
        assert!(value.contains("Max-Age=3600"));
        assert!(!value.contains("Secure"));
    }

    #[test]
    fn login_cookie_is_secure_only_when_asked() {
        let policy = CookiePolicy {
            secure: true,
            ..CookiePolicy::default()
        };
        let value = login_cookie("abc123", policy).unwrap();
        assert!(value.to_str().unwrap().ends_with("; Secure"));
    }

    #[test]
    fn logout_cookie_expires_immediately() {
        let value = logout_cookie();
        assert!(value.to_str().unwrap().contains("Max-Age=0"));
    }
}
