//! Server configuration
//!
//! Everything is read from `HEALTHGO_*` environment variables at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_UPLOAD_DIR: &str = "uploads";
pub const DEFAULT_MAX_UPLOAD_MB: usize = 16;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {var} value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub database_path: PathBuf,
    pub upload_dir: PathBuf,
    pub bind_addr: SocketAddr,
    pub max_upload_bytes: usize,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; used by `from_env` and tests
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_path = lookup("HEALTHGO_DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(default_database_path);

        let upload_dir = lookup("HEALTHGO_UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_UPLOAD_DIR));

        let bind_raw = lookup("HEALTHGO_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
            var: "HEALTHGO_BIND_ADDR",
            value: bind_raw.clone(),
            reason: e.to_string(),
        })?;

        let max_upload_mb = match lookup("HEALTHGO_MAX_UPLOAD_MB") {
            Some(raw) => raw.parse::<usize>().map_err(|e| ConfigError::Invalid {
                var: "HEALTHGO_MAX_UPLOAD_MB",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => DEFAULT_MAX_UPLOAD_MB,
        };

        Ok(Self {
            database_path,
            upload_dir,
            bind_addr,
            max_upload_bytes: max_upload_mb * 1024 * 1024,
        })
    }
}

/// `<project>/data/healthgo.db`, where the project root is found by walking
/// up from `target/{debug,release}`
pub fn default_database_path() -> PathBuf {
    let mut path = std::env::current_exe()
        .ok()
        .and_then(|p| p.parent().map(|p| p.to_path_buf()))
        .unwrap_or_else(|| PathBuf::from("."));

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(grandparent) = path.parent().and_then(|p| p.parent()) {
            path = grandparent.to_path_buf();
        }
    }

    path.push("data");
    path.push("healthgo.db");
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> Result<ServerConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.max_upload_bytes, 16 * 1024 * 1024);
        assert!(config.database_path.ends_with("data/healthgo.db"));
    }

    #[test]
    fn test_overrides() {
        let config = config_from(&[
            ("HEALTHGO_DATABASE_PATH", "/tmp/x.db"),
            ("HEALTHGO_UPLOAD_DIR", "/tmp/up"),
            ("HEALTHGO_BIND_ADDR", "127.0.0.1:8080"),
            ("HEALTHGO_MAX_UPLOAD_MB", "2"),
        ])
        .unwrap();
        assert_eq!(config.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(config.upload_dir, PathBuf::from("/tmp/up"));
        assert_eq!(config.bind_addr.to_string(), "127.0.0.1:8080");
        assert_eq!(config.max_upload_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn test_invalid_values() {
        let err = config_from(&[("HEALTHGO_BIND_ADDR", "nowhere")]).unwrap_err();
        assert!(err.to_string().contains("HEALTHGO_BIND_ADDR"));

        assert!(config_from(&[("HEALTHGO_MAX_UPLOAD_MB", "lots")]).is_err());
    }
}
