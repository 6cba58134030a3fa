//! Environment-driven configuration.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;

pub const DEFAULT_GATEWAY_BASE_URL: &str = "https://api.mercadopago.com";
const DEFAULT_PORT: u16 = 8083;
const DEFAULT_GATEWAY_TIMEOUT_SECS: u64 = 15;
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 10;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    Missing(&'static str),

    #[error("invalid value for {name}: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub db_max_connections: u32,
    pub gateway: GatewayConfig,
    pub nats_url: Option<String>,
}

/// Settings for talking to the payment gateway. The access token is optional
/// at startup; payment routes answer 500 until it is configured.
#[derive(Clone)]
pub struct GatewayConfig {
    pub access_token: Option<String>,
    pub base_url: String,
    pub timeout_secs: u64,
    pub webhook_secret: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self { access_token: None, base_url: DEFAULT_GATEWAY_BASE_URL.to_owned(), timeout_secs: DEFAULT_GATEWAY_TIMEOUT_SECS, webhook_secret: None }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup so tests don't
    /// have to mutate the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let port = parse_or("PORT", get("PORT"), DEFAULT_PORT)?;

        Ok(Self {
            database_url,
            bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port),
            log_level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_owned()),
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), DEFAULT_DB_MAX_CONNECTIONS)?,
            gateway: GatewayConfig {
                access_token: get("GATEWAY_ACCESS_TOKEN"),
                base_url: get("GATEWAY_BASE_URL").unwrap_or_else(|| DEFAULT_GATEWAY_BASE_URL.to_owned()),
                timeout_secs: parse_or("GATEWAY_TIMEOUT_SECS", get("GATEWAY_TIMEOUT_SECS"), DEFAULT_GATEWAY_TIMEOUT_SECS)?,
                webhook_secret: get("GATEWAY_WEBHOOK_SECRET"),
            },
            nats_url: get("NATS_URL"),
        })
    }
}

fn parse_or<T: std::str::FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value.parse().map_err(|_| ConfigError::Invalid { name, value }),
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("database_url", &"[redacted]")
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("db_max_connections", &self.db_max_connections)
            .field("gateway", &self.gateway)
            .field("nats_url", &self.nats_url)
            .finish()
    }
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("access_token", &self.access_token.as_ref().map(|_| "[redacted]"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("webhook_secret", &self.webhook_secret.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/shop")])).unwrap();
        assert_eq!(config.bind_addr.port(), 8083);
        assert_eq!(config.gateway.base_url, DEFAULT_GATEWAY_BASE_URL);
        assert_eq!(config.gateway.timeout_secs, 15);
        assert!(config.gateway.access_token.is_none());
        assert!(config.nats_url.is_none());
    }

    #[test]
    fn test_missing_database_url() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("DATABASE_URL")));
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x"), ("PORT", "eighty")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PORT", .. }));
    }

    #[test]
    fn test_blank_token_is_absent_and_debug_redacts() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://user:secret@db/shop"),
            ("GATEWAY_ACCESS_TOKEN", "   "),
            ("GATEWAY_WEBHOOK_SECRET", "whsec"),
        ]))
        .unwrap();
        assert!(config.gateway.access_token.is_none());
        let debug = format!("{config:?}");
        assert!(!debug.contains("secret@db"));
        assert!(!debug.contains("whsec"));
    }
}
