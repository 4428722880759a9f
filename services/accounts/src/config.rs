//! Server configuration layered from defaults and `ACCOUNTS_*` variables

use anyhow::{Context, Result};
use config::{Config, Environment};
use serde::Deserialize;

/// HTTP listener and session cookie settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Name of the cookie carrying the session token
    pub session_cookie: String,
    /// Session lifetime in seconds
    pub session_ttl: u64,
    /// Mark the session cookie `Secure`
    pub secure_cookies: bool,
}

impl ServerConfig {
    /// Load the configuration
    ///
    /// # Environment Variables
    /// - `ACCOUNTS_HOST` (default: "0.0.0.0")
    /// - `ACCOUNTS_PORT` (default: 3000)
    /// - `ACCOUNTS_SESSION_COOKIE` (default: "accounts.sid")
    /// - `ACCOUNTS_SESSION_TTL` (default: 86400)
    /// - `ACCOUNTS_SECURE_COOKIES` (default: false)
    pub fn load() -> Result<Self> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .set_default("session_cookie", "accounts.sid")?
            .set_default("session_ttl", 86_400)?
            .set_default("secure_cookies", false)?
            .add_source(Environment::with_prefix("ACCOUNTS").try_parsing(true))
            .build()
            .context("failed to read configuration")?
            .try_deserialize()
            .context("invalid configuration")
    }

    /// Address for the listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 5] = [
        "ACCOUNTS_HOST",
        "ACCOUNTS_PORT",
        "ACCOUNTS_SESSION_COOKIE",
        "ACCOUNTS_SESSION_TTL",
        "ACCOUNTS_SECURE_COOKIES",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let config = ServerConfig::load().unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(config.session_cookie, "accounts.sid");
        assert_eq!(config.session_ttl, 86_400);
        assert!(!config.secure_cookies);
    }

    #[test]
    #[serial]
    fn test_environment_overrides() {
        unsafe {
            std::env::set_var("ACCOUNTS_HOST", "127.0.0.1");
            std::env::set_var("ACCOUNTS_PORT", "8080");
            std::env::set_var("ACCOUNTS_SESSION_TTL", "60");
            std::env::set_var("ACCOUNTS_SECURE_COOKIES", "true");
        }

        let config = ServerConfig::load().unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert_eq!(config.session_ttl, 60);
        assert!(config.secure_cookies);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_is_rejected() {
        unsafe {
            std::env::set_var("ACCOUNTS_PORT", "not-a-port");
        }

        assert!(ServerConfig::load().is_err());

        clear_env();
    }
}
