//! Process configuration loaded once at startup.
//!
//! `API_BASE_URL` and `SESSION_SECRET` are required; the server refuses to
//! start without them rather than failing on the first request.

use std::time::Duration;

/// Minimum secret length; the cookie key is derived from it.
pub const MIN_SECRET_LEN: usize = 32;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("SESSION_SECRET must be at least {MIN_SECRET_LEN} bytes")]
    WeakSecret,
    #[error("invalid {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub api_base_url: String,
    pub session_secret: String,
    pub port: u16,
    /// Mark the session cookie `Secure`.
    pub secure_cookies: bool,
    pub api_timeout: Duration,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_base_url", &self.api_base_url)
            .field("session_secret", &"<redacted>")
            .field("port", &self.port)
            .field("secure_cookies", &self.secure_cookies)
            .field("api_timeout", &self.api_timeout)
            .finish()
    }
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary lookup; `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());

        let api_base_url = non_empty("API_BASE_URL").ok_or(ConfigError::Missing("API_BASE_URL"))?;
        let session_secret =
            non_empty("SESSION_SECRET").ok_or(ConfigError::Missing("SESSION_SECRET"))?;
        if session_secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        let port = match non_empty("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                value: raw,
            })?,
            None => DEFAULT_PORT,
        };

        let production = non_empty("APP_ENV").is_some_and(|env| env.trim() == "production");
        let secure_cookies = match non_empty("COOKIE_SECURE") {
            Some(raw) => parse_bool(&raw).ok_or(ConfigError::Invalid {
                name: "COOKIE_SECURE",
                value: raw,
            })?,
            None => production,
        };

        let api_timeout = match non_empty("API_TIMEOUT_SECS") {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs)
                .ok_or(ConfigError::Invalid {
                    name: "API_TIMEOUT_SECS",
                    value: raw,
                })?,
            None => DEFAULT_API_TIMEOUT,
        };

        Ok(Self {
            api_base_url,
            session_secret,
            port,
            secure_cookies,
            api_timeout,
        })
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
