//! Signed session cookies.
//!
//! A session is an HS256 token in the `bookstore_session` cookie. It carries
//! the caller's id and the role observed when it was issued; nothing else is
//! kept per caller.

use std::fmt;

use axum::http::{HeaderMap, header};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

pub const SESSION_COOKIE: &str = "bookstore_session";

#[derive(Debug, Deserialize, Serialize)]
pub struct Claims {
    pub sub: String,
    pub is_admin: bool,
    pub iat: usize,
    pub exp: usize,
}

/// Identity recovered from a valid, unexpired session cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    /// Role at login time. Admin checks re-read the user instead of trusting this.
    pub is_admin: bool,
}

#[derive(Clone)]
pub struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
    secure: bool,
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("ttl", &self.ttl)
            .field("secure", &self.secure)
            .finish_non_exhaustive()
    }
}

impl SessionKeys {
    pub fn new(secret: &[u8], ttl_hours: i64, secure: bool) -> Self {
        // Out-of-range lifetimes saturate; `issue` then reports the overflow as an error.
        let ttl = Duration::try_hours(ttl_hours).unwrap_or(Duration::MAX);
        Self::with_ttl(secret, ttl, secure)
    }

    pub fn with_ttl(secret: &[u8], ttl: Duration, secure: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
            secure,
        }
    }

    pub fn issue(&self, user_id: Uuid, is_admin: bool) -> AppResult<String> {
        let now = Utc::now();
        let expiration = now
            .checked_add_signed(self.ttl)
            .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

        let claims = Claims {
            sub: user_id.to_string(),
            is_admin,
            iat: now.timestamp().max(0) as usize,
            exp: expiration.timestamp().max(0) as usize,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
    }

    /// Tampered, malformed and expired tokens all decode to `None`.
    pub fn verify(&self, token: &str) -> Option<Session> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let decoded = decode::<Claims>(token, &self.decoding, &validation).ok()?;
        let user_id = Uuid::parse_str(&decoded.claims.sub).ok()?;
        Some(Session {
            user_id,
            is_admin: decoded.claims.is_admin,
        })
    }

    pub fn from_headers(&self, headers: &HeaderMap) -> Option<Session> {
        let token = cookie_value(headers, SESSION_COOKIE)?;
        self.verify(token)
    }

    /// `Set-Cookie` value that opens a session for the given user.
    pub fn issue_cookie(&self, user_id: Uuid, is_admin: bool) -> AppResult<String> {
        let token = self.issue(user_id, is_admin)?;
        Ok(self.cookie(&token, self.ttl.num_seconds().max(0)))
    }

    /// `Set-Cookie` value that makes the browser drop the session.
    pub fn clear_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: i64) -> String {
        let mut cookie =
            format!("{SESSION_COOKIE}={value}; HttpOnly; SameSite=Lax; Path=/; Max-Age={max_age}");
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    const SECRET: &[u8] = b"test-session-secret-0123456789";

    #[test]
    fn issued_token_verifies_to_the_same_identity() {
        let keys = SessionKeys::new(SECRET, 1, false);
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, true).expect("issue");

        assert_eq!(
            keys.verify(&token),
            Some(Session {
                user_id,
                is_admin: true
            })
        );
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = SessionKeys::with_ttl(SECRET, Duration::minutes(-5), false);
        let token = keys.issue(Uuid::new_v4(), false).expect("issue");
        assert_eq!(keys.verify(&token), None);
    }

    #[test]
    fn oversized_ttl_fails_to_issue_instead_of_panicking() {
        let keys = SessionKeys::new(SECRET, i64::MAX, false);
        assert!(matches!(
            keys.issue(Uuid::new_v4(), false),
            Err(AppError::Internal(_))
        ));
    }

    #[test]
    fn token_signed_with_another_secret_is_rejected() {
        let other = SessionKeys::new(b"some-other-secret-abcdefghijkl", 1, false);
        let keys = SessionKeys::new(SECRET, 1, false);
        let token = other.issue(Uuid::new_v4(), true).expect("issue");
        assert_eq!(keys.verify(&token), None);
        assert_eq!(keys.verify("not-a-token"), None);
    }

    #[test]
    fn session_is_read_from_a_multi_cookie_header() {
        let keys = SessionKeys::new(SECRET, 1, false);
        let user_id = Uuid::new_v4();
        let token = keys.issue(user_id, false).expect("issue");

        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_str(&format!("theme=dark; {SESSION_COOKIE}={token}; lang=ru"))
                .expect("header"),
        );

        let session = keys.from_headers(&headers).expect("session");
        assert_eq!(session.user_id, user_id);
    }

    #[test]
    fn cleared_cookie_expires_immediately() {
        let keys = SessionKeys::new(SECRET, 24, true);
        let cookie = keys.clear_cookie();
        assert!(cookie.starts_with("bookstore_session=;"));
        assert!(cookie.contains("Max-Age=0"));
        assert!(cookie.ends_with("; Secure"));

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_static("bookstore_session="));
        assert_eq!(keys.from_headers(&headers), None);
    }

    #[test]
    fn issued_cookie_is_http_only_with_ttl() {
        let keys = SessionKeys::new(SECRET, 2, false);
        let cookie = keys.issue_cookie(Uuid::new_v4(), false).expect("cookie");
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(!cookie.contains("Secure"));
    }
}
