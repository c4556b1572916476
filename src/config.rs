use std::env;

use anyhow::{Context, anyhow};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://books.db?mode=rwc";
pub const DEFAULT_BOOTSTRAP_ADMIN_EMAIL: &str = "admin@books.ru";
/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

/// How the declared `total_amount` of a new order is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotalPolicy {
    /// Store the client-supplied total as-is.
    #[default]
    Trust,
    /// Reject orders whose total differs from the sum of their lines.
    Verify,
}

/// Which values `UpdateOrderStatus` accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Any non-empty string.
    #[default]
    Lenient,
    /// Only `pending`, `completed` and `cancelled`.
    Strict,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub session_secret: String,
    pub session_ttl_hours: i64,
    pub session_cookie_secure: bool,
    pub bootstrap_admin_email: Option<String>,
    pub total_policy: TotalPolicy,
    pub status_policy: StatusPolicy,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("APP_PORT") {
            Ok(raw) => parse_port(&raw).context("APP_PORT must be a port number")?,
            Err(_) => 8000,
        };

        let session_secret = env::var("SESSION_SECRET").context("SESSION_SECRET is not set")?;
        if session_secret.len() < 16 {
            return Err(anyhow!("SESSION_SECRET must be at least 16 bytes"));
        }
        let session_ttl_hours = match env::var("SESSION_TTL_HOURS") {
            Ok(raw) => parse_ttl_hours(&raw).with_context(|| {
                format!("SESSION_TTL_HOURS must be between 1 and {MAX_SESSION_TTL_HOURS}")
            })?,
            Err(_) => 24,
        };
        let session_cookie_secure = match env::var("SESSION_COOKIE_SECURE") {
            Ok(raw) => parse_bool(&raw)
                .ok_or_else(|| anyhow!("SESSION_COOKIE_SECURE must be true or false"))?,
            Err(_) => false,
        };

        let bootstrap_admin_email = bootstrap_email(
            env::var("BOOTSTRAP_ADMIN_EMAIL")
                .ok()
                .as_deref()
                .unwrap_or(DEFAULT_BOOTSTRAP_ADMIN_EMAIL),
        );

        let total_policy = match env::var("ORDER_TOTAL_POLICY") {
            Ok(raw) => parse_total_policy(&raw)
                .ok_or_else(|| anyhow!("ORDER_TOTAL_POLICY must be `trust` or `verify`"))?,
            Err(_) => TotalPolicy::default(),
        };
        let status_policy = match env::var("ORDER_STATUS_POLICY") {
            Ok(raw) => parse_status_policy(&raw)
                .ok_or_else(|| anyhow!("ORDER_STATUS_POLICY must be `lenient` or `strict`"))?,
            Err(_) => StatusPolicy::default(),
        };

        Ok(Self {
            database_url,
            host,
            port,
            session_secret,
            session_ttl_hours,
            session_cookie_secure,
            bootstrap_admin_email,
            total_policy,
            status_policy,
        })
    }
}

fn bootstrap_email(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    raw.trim().parse::<u16>().ok()
}

fn parse_ttl_hours(raw: &str) -> Option<i64> {
    raw.trim()
        .parse::<i64>()
        .ok()
        .filter(|hours| (1..=MAX_SESSION_TTL_HOURS).contains(hours))
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

fn parse_total_policy(raw: &str) -> Option<TotalPolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trust" => Some(TotalPolicy::Trust),
        "verify" => Some(TotalPolicy::Verify),
        _ => None,
    }
}

fn parse_status_policy(raw: &str) -> Option<StatusPolicy> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "lenient" => Some(StatusPolicy::Lenient),
        "strict" => Some(StatusPolicy::Strict),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bootstrap_email_disables_auto_admin() {
        assert_eq!(bootstrap_email("   "), None);
        assert_eq!(
            bootstrap_email(" admin@books.ru "),
            Some("admin@books.ru".to_string())
        );
    }

    #[test]
    fn policies_parse_case_insensitively() {
        assert_eq!(parse_total_policy("Verify"), Some(TotalPolicy::Verify));
        assert_eq!(parse_total_policy("trust"), Some(TotalPolicy::Trust));
        assert_eq!(parse_total_policy("maybe"), None);
        assert_eq!(parse_status_policy("STRICT"), Some(StatusPolicy::Strict));
        assert_eq!(parse_status_policy("lenient"), Some(StatusPolicy::Lenient));
        assert_eq!(parse_status_policy(""), None);
    }

    #[test]
    fn port_must_fit_in_u16() {
        assert_eq!(parse_port(" 8080 "), Some(8080));
        assert_eq!(parse_port("eighty"), None);
        assert_eq!(parse_port("70000"), None);
        assert_eq!(parse_port(""), None);
    }

    #[test]
    fn session_ttl_is_bounded() {
        assert_eq!(parse_ttl_hours("24"), Some(24));
        assert_eq!(
            parse_ttl_hours(&MAX_SESSION_TTL_HOURS.to_string()),
            Some(MAX_SESSION_TTL_HOURS)
        );
        assert_eq!(parse_ttl_hours("0"), None);
        assert_eq!(parse_ttl_hours("-3"), None);
        assert_eq!(parse_ttl_hours("9223372036854775807"), None);
        assert_eq!(parse_ttl_hours("soon"), None);
    }

    #[test]
    fn bool_flags_accept_common_spellings() {
        assert_eq!(parse_bool("yes"), Some(true));
        assert_eq!(parse_bool("0"), Some(false));
        assert_eq!(parse_bool("on"), None);
    }
}
