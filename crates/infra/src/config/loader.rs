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
//! - `SIMOBRIDGE_DB_PATH`: Configuration database file path
//! - `SIMOBRIDGE_DB_POOL_SIZE`: Connection pool soft cap (default 10)
//! - `SIMOBRIDGE_DB_POOL_SEED`: Connections opened at startup (default 3)
//! - `SIMOBRIDGE_DB_BORROW_TIMEOUT`: Pool borrow timeout in seconds (default 5)
//! - `SIMOBRIDGE_HTTP_TIMEOUT_SECS`: Outbound HTTP timeout (default 30)
//! - `SIMOBRIDGE_HTTP_VERIFY_TLS`: TLS verification (default false)
//!
//! ## File Locations
//! The loader probes `config.{json,toml}` and `simobridge.{json,toml}` in
//! the working directory, its parents (2 levels) and next to the
//! executable.

use std::path::{Path, PathBuf};

use simobridge_domain::{Config, DatabaseConfig, HttpConfig, Result, SimoBridgeError};

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If the required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `SimoBridgeError::Config` if configuration cannot be loaded
/// from either source.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `SIMOBRIDGE_DB_PATH` is required; everything else has a default.
///
/// # Errors
/// Returns `SimoBridgeError::Config` if the database path is missing or a
/// numeric variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let db_path = env_var("SIMOBRIDGE_DB_PATH")?;
    let pool_size = env_parse("SIMOBRIDGE_DB_POOL_SIZE", 10)?;
    let pool_seed = env_parse("SIMOBRIDGE_DB_POOL_SEED", 3)?;
    let borrow_timeout_secs = env_parse("SIMOBRIDGE_DB_BORROW_TIMEOUT", 5)?;
    let timeout_secs = env_parse("SIMOBRIDGE_HTTP_TIMEOUT_SECS", 30)?;
    let verify_tls = env_bool("SIMOBRIDGE_HTTP_VERIFY_TLS", false);

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size, pool_seed, borrow_timeout_secs },
        http: HttpConfig { timeout_secs, verify_tls },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `SimoBridgeError::Config` if no file is found or the format is
/// invalid.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(SimoBridgeError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            SimoBridgeError::Config(
                "No config file found in any of the standard locations".to_string(),
            )
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| SimoBridgeError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content; format is detected by file
/// extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| SimoBridgeError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| SimoBridgeError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(SimoBridgeError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files, returning the first that
/// exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(vec![
            cwd.join("config.json"),
            cwd.join("config.toml"),
            cwd.join("simobridge.json"),
            cwd.join("simobridge.toml"),
            cwd.join("../config.json"),
            cwd.join("../config.toml"),
            cwd.join("../../config.json"),
            cwd.join("../../config.toml"),
        ]);
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(vec![
                exe_dir.join("config.json"),
                exe_dir.join("config.toml"),
                exe_dir.join("simobridge.json"),
                exe_dir.join("simobridge.toml"),
            ]);
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        SimoBridgeError::Config(format!("Missing required environment variable: {key}"))
    })
}

/// Parse a numeric environment variable, with a default when unset.
fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match std::env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|_| SimoBridgeError::Config(format!("Invalid value for {key}: {raw}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Mutex;

    use once_cell::sync::Lazy;
    use tempfile::NamedTempFile;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    #[test]
    fn env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TEST_SIMO_BOOL", "yes");
        assert!(env_bool("TEST_SIMO_BOOL", false));

        std::env::set_var("TEST_SIMO_BOOL", "off");
        assert!(!env_bool("TEST_SIMO_BOOL", true));

        std::env::remove_var("TEST_SIMO_BOOL");
        assert!(env_bool("TEST_SIMO_BOOL", true));
        assert!(!env_bool("TEST_SIMO_BOOL", false));
    }

    #[test]
    fn load_from_env_with_defaults() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("SIMOBRIDGE_DB_PATH", "/tmp/simo-config.db");
        std::env::remove_var("SIMOBRIDGE_DB_POOL_SIZE");
        std::env::remove_var("SIMOBRIDGE_HTTP_VERIFY_TLS");

        let config = load_from_env().expect("config from env");
        assert_eq!(config.database.path, "/tmp/simo-config.db");
        assert_eq!(config.database.pool_size, 10);
        assert_eq!(config.database.pool_seed, 3);
        assert_eq!(config.http.timeout_secs, 30);
        assert!(!config.http.verify_tls);

        std::env::remove_var("SIMOBRIDGE_DB_PATH");
    }

    #[test]
    fn load_from_env_missing_path_fails() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::remove_var("SIMOBRIDGE_DB_PATH");

        let result = load_from_env();
        assert!(matches!(result, Err(SimoBridgeError::Config(_))));
    }

    #[test]
    fn load_from_env_invalid_number_fails() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("SIMOBRIDGE_DB_PATH", "/tmp/simo-config.db");
        std::env::set_var("SIMOBRIDGE_DB_POOL_SIZE", "not-a-number");

        let result = load_from_env();
        assert!(matches!(result, Err(SimoBridgeError::Config(_))));

        std::env::remove_var("SIMOBRIDGE_DB_PATH");
        std::env::remove_var("SIMOBRIDGE_DB_POOL_SIZE");
    }

    #[test]
    fn load_from_file_json() {
        let json_content = r#"{
            "database": {
                "path": "config.db",
                "pool_size": 4
            },
            "http": {
                "timeout_secs": 20
            }
        }"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(json_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("json");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("config from JSON");
        assert_eq!(config.database.path, "config.db");
        assert_eq!(config.database.pool_size, 4);
        assert_eq!(config.database.pool_seed, 3);
        assert_eq!(config.http.timeout_secs, 20);
        assert!(!config.http.verify_tls);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn load_from_file_toml() {
        let toml_content = r#"
[database]
path = "config.db"
pool_size = 6
pool_seed = 2
borrow_timeout_secs = 10

[http]
timeout_secs = 45
verify_tls = true
"#;

        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(toml_content.as_bytes()).unwrap();
        let path = temp_file.path().with_extension("toml");
        std::fs::copy(temp_file.path(), &path).unwrap();

        let config = load_from_file(Some(path.clone())).expect("config from TOML");
        assert_eq!(config.database.pool_size, 6);
        assert_eq!(config.database.pool_seed, 2);
        assert!(config.http.verify_tls);

        std::fs::remove_file(path).ok();
    }

    #[test]
    fn load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/config.json")));
        assert!(matches!(result, Err(SimoBridgeError::Config(_))));
    }

    #[test]
    fn parse_config_rejects_unknown_extension() {
        let result = parse_config("some content", &PathBuf::from("test.yaml"));
        assert!(matches!(result, Err(SimoBridgeError::Config(_))));
    }
}
