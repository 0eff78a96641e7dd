//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `MIRADOR_ODOO_URL`: Base URL of the Odoo instance
//! - `MIRADOR_ODOO_DB`: Database name
//! - `MIRADOR_ODOO_USER`: Login of the integration user
//! - `MIRADOR_ODOO_API_KEY`: API key used in place of a password
//! - `MIRADOR_CACHE_TTL_SECONDS`: Result cache TTL (optional, default 30)
//! - `MIRADOR_SERVER_HOST`: HTTP bind address (optional)
//! - `MIRADOR_SERVER_PORT`: HTTP port (optional)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.json` or `./config.toml` (current working directory)
//! 2. `./mirador.json` or `./mirador.toml` (current working directory)
//! 3. `../config.json` or `../config.toml` (parent directory)
//! 4. `../../config.json` or `../../config.toml` (grandparent directory)
//! 5. Relative to executable location

use std::path::{Path, PathBuf};

use mirador_domain::{
    Config, MiradorError, OdooConfig, Result, ServerConfig, DEFAULT_CACHE_TTL_SECS,
    DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `MiradorError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<Config> {
    // Try loading from environment first
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            // Fall back to file
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// All required environment variables must be present. Returns an error
/// if any are missing.
///
/// # Environment Variables
/// See module documentation for the complete list.
///
/// # Errors
/// Returns `MiradorError::Config` if required variables are missing
/// or have invalid values.
pub fn load_from_env() -> Result<Config> {
    let url = env_var("MIRADOR_ODOO_URL").and_then(|raw| {
        // Validated up front so a typo fails at startup, not on the first call.
        url::Url::parse(&raw)
            .map_err(|e| MiradorError::Config(format!("Invalid Odoo URL: {}", e)))?;
        Ok(raw)
    })?;
    let db = env_var("MIRADOR_ODOO_DB")?;
    let username = env_var("MIRADOR_ODOO_USER")?;
    let api_key = env_var("MIRADOR_ODOO_API_KEY")?;

    let cache_ttl_secs = match std::env::var("MIRADOR_CACHE_TTL_SECONDS") {
        Ok(s) => s
            .parse::<u64>()
            .map_err(|e| MiradorError::Config(format!("Invalid cache TTL: {}", e)))?,
        Err(_) => DEFAULT_CACHE_TTL_SECS,
    };

    let host =
        std::env::var("MIRADOR_SERVER_HOST").unwrap_or_else(|_| DEFAULT_SERVER_HOST.to_string());
    let port = match std::env::var("MIRADOR_SERVER_PORT") {
        Ok(s) => s
            .parse::<u16>()
            .map_err(|e| MiradorError::Config(format!("Invalid server port: {}", e)))?,
        Err(_) => DEFAULT_SERVER_PORT,
    };

    Ok(Config {
        odoo: OdooConfig { url, db, username, api_key, cache_ttl_secs },
        server: ServerConfig { host, port },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Arguments
/// * `path` - Optional path to config file. If `None`, uses
///   [`probe_config_paths`].
///
/// # Errors
/// Returns `MiradorError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MiradorError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MiradorError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MiradorError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
///
/// # Errors
/// Returns `MiradorError::Config` if format is invalid or parsing fails.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MiradorError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MiradorError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(MiradorError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe multiple paths for configuration files
///
/// Searches for config files in the following locations (in order):
/// 1. Current working directory (`./config.{json,toml}`,
///    `./mirador.{json,toml}`)
/// 2. Parent directories (up to 2 levels)
/// 3. Relative to executable location
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    // Try current working directory
    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("mirador.json"),
            cwd.join("mirador.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    // Try relative to executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("mirador.json"),
                exe_dir.join("mirador.toml"),
            ]);
        }
    }

    // Return first existing candidate
    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
///
/// # Errors
/// Returns `MiradorError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        MiradorError::Config(format!("Missing required environment variable: {}", key))
    })
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    fn clear_mirador_env() {
        for key in [
            "MIRADOR_ODOO_URL",
            "MIRADOR_ODOO_DB",
            "MIRADOR_ODOO_USER",
            "MIRADOR_ODOO_API_KEY",
            "MIRADOR_CACHE_TTL_SECONDS",
            "MIRADOR_SERVER_HOST",
            "MIRADOR_SERVER_PORT",
        ] {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_mirador_env();

        std::env::set_var("MIRADOR_ODOO_URL", "https://erp.example.com");
        std::env::set_var("MIRADOR_ODOO_DB", "produccion");
        std::env::set_var("MIRADOR_ODOO_USER", "bot@example.com");
        std::env::set_var("MIRADOR_ODOO_API_KEY", "abc123");
        std::env::set_var("MIRADOR_CACHE_TTL_SECONDS", "60");
        std::env::set_var("MIRADOR_SERVER_PORT", "9000");

        let result = load_from_env();
        assert!(result.is_ok(), "Should load config from env vars, error: {:?}", result.err());

        let config = result.unwrap();
        assert_eq!(config.odoo.url, "https://erp.example.com");
        assert_eq!(config.odoo.db, "produccion");
        assert_eq!(config.odoo.username, "bot@example.com");
        assert_eq!(config.odoo.api_key, "abc123");
        assert_eq!(config.odoo.cache_ttl_secs, 60);
        assert_eq!(config.server.host, DEFAULT_SERVER_HOST);
        assert_eq!(config.server.port, 9000);

        clear_mirador_env();
    }

    #[test]
    fn test_load_from_env_defaults_for_optionals() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_mirador_env();

        std::env::set_var("MIRADOR_ODOO_URL", "https://erp.example.com");
        std::env::set_var("MIRADOR_ODOO_DB", "produccion");
        std::env::set_var("MIRADOR_ODOO_USER", "bot@example.com");
        std::env::set_var("MIRADOR_ODOO_API_KEY", "abc123");

        let config = load_from_env().unwrap();
        assert_eq!(config.odoo.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS);
        assert_eq!(config.server.host, DEFAULT_SERVER_HOST);
        assert_eq!(config.server.port, DEFAULT_SERVER_PORT);

        clear_mirador_env();
    }

    #[test]
    fn test_load_from_env_missing_var() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_mirador_env();

        std::env::set_var("MIRADOR_ODOO_URL", "https://erp.example.com");
        // MIRADOR_ODOO_DB intentionally absent

        let result = load_from_env();
        assert!(result.is_err(), "Should fail with missing env var");

        let err = result.unwrap_err();
        assert!(matches!(err, MiradorError::Config(_)), "Should be a Config error");

        clear_mirador_env();
    }

    #[test]
    fn test_load_from_env_invalid_url() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_mirador_env();

        std::env::set_var("MIRADOR_ODOO_URL", "not a url");
        std::env::set_var("MIRADOR_ODOO_DB", "produccion");
        std::env::set_var("MIRADOR_ODOO_USER", "bot@example.com");
        std::env::set_var("MIRADOR_ODOO_API_KEY", "abc123");

        let result = load_from_env();
        assert!(result.is_err(), "Should fail with invalid URL");

        clear_mirador_env();
    }

    #[test]
    fn test_load_from_env_invalid_port() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_mirador_env();

        std::env::set_var("MIRADOR_ODOO_URL", "https://erp.example.com");
        std::env::set_var("MIRADOR_ODOO_DB", "produccion");
        std::env::set_var("MIRADOR_ODOO_USER", "bot@example.com");
        std::env::set_var("MIRADOR_ODOO_API_KEY", "abc123");
        std::env::set_var("MIRADOR_SERVER_PORT", "not-a-port");

        let result = load_from_env();
        assert!(result.is_err(), "Should fail with invalid port");

        clear_mirador_env();
    }

    #[test]
    fn test_load_from_file_json() {
        let json_content = r#"{
            "odoo": {
                "url": "https://erp.example.com",
                "db": "produccion",
                "username": "bot@example.com",
                "api_key": "secret",
                "cache_ttl_secs": 45
            },
            "server": {
                "host": "0.0.0.0",
                "port": 3001
            }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_ok(), "Should load config from JSON file");

        let config = result.unwrap();
        assert_eq!(config.odoo.db, "produccion");
        assert_eq!(config.odoo.cache_ttl_secs, 45);
        assert_eq!(config.server.port, 3001);

        // Cleanup
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_toml() {
        let toml_content = r#"
[odoo]
url = "https://erp.example.com"
db = "produccion"
username = "bot@example.com"
api_key = "secret"

[server]
port = 3002
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_ok(), "Should load config from TOML file");

        let config = result.unwrap();
        assert_eq!(config.odoo.username, "bot@example.com");
        assert_eq!(config.odoo.cache_ttl_secs, DEFAULT_CACHE_TTL_SECS);
        assert_eq!(config.server.host, DEFAULT_SERVER_HOST);
        assert_eq!(config.server.port, 3002);

        // Cleanup
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(result.is_err(), "Should fail when file not found");

        let err = result.unwrap_err();
        assert!(matches!(err, MiradorError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let invalid_json = r#"{ "this is": "not valid json" "#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(invalid_json.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let result = load_from_file(Some(path.clone()));
        assert!(result.is_err(), "Should fail with invalid JSON");

        // Cleanup
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let content = "some content";
        let path = PathBuf::from("test.yaml");
        let result = parse_config(content, &path);
        assert!(result.is_err(), "Should fail with unsupported format");
    }
}
