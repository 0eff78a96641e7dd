//! Configuration structures for the Mirador backend

use serde::{Deserialize, Serialize};

/// Default TTL for cached ERP call results, in seconds.
pub const DEFAULT_CACHE_TTL_SECS: u64 = 30;

/// Default bind address for the HTTP server.
pub const DEFAULT_SERVER_HOST: &str = "127.0.0.1";

/// Default port for the HTTP server.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Connection settings for the Odoo ERP.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OdooConfig {
    /// Base URL of the Odoo instance (without the `/jsonrpc` suffix).
    pub url: String,
    /// Database name.
    pub db: String,
    /// Login of the integration user.
    pub username: String,
    /// API key used in place of a password.
    pub api_key: String,
    /// TTL for cached call results.
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_server_host")]
    pub host: String,
    #[serde(default = "default_server_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_server_host(), port: default_server_port() }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub odoo: OdooConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

fn default_server_host() -> String {
    DEFAULT_SERVER_HOST.to_string()
}

fn default_server_port() -> u16 {
    DEFAULT_SERVER_PORT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn optional_fields_fall_back_to_defaults() {
        let json = r#"{
            "odoo": {
                "url": "https://erp.example.com",
                "db": "prod",
                "username": "bot@example.com",
                "api_key": "secret"
            }
        }"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert_eq!(config.odoo.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS);
        assert_eq!(config.server.host, DEFAULT_SERVER_HOST);
        assert_eq!(config.server.port, DEFAULT_SERVER_PORT);
    }
}
