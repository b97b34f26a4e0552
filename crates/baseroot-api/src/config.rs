//! Server configuration.

use std::path::PathBuf;

/// Default upload ceiling: 100 MiB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

/// Listener, storage and observability settings for the API server.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    /// Directory that holds request temp files.
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Where saga records are persisted. `None` keeps them in memory.
    pub journal_dir: Option<PathBuf>,
    pub log_json: bool,
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            upload_dir: PathBuf::from("./uploads"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            journal_dir: None,
            log_json: false,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `BASEROOT_PORT` (default: 3000)
    /// - `BASEROOT_UPLOAD_DIR` (default: `./uploads`)
    /// - `BASEROOT_MAX_UPLOAD_BYTES` (default: 104857600)
    /// - `BASEROOT_JOURNAL_DIR` (optional)
    /// - `BASEROOT_LOG_JSON` (default: false)
    /// - `BASEROOT_METRICS_ENABLED` (default: true)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let flag = |name: &str, default: bool| -> Result<bool, ConfigError> {
            match get(name) {
                None => Ok(default),
                Some(raw) => match raw.to_ascii_lowercase().as_str() {
                    "1" | "true" | "yes" | "on" => Ok(true),
                    "0" | "false" | "no" | "off" => Ok(false),
                    _ => Err(ConfigError::InvalidValue(name.to_string(), raw)),
                },
            }
        };

        let defaults = Self::default();

        let port = match get("BASEROOT_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::InvalidValue("BASEROOT_PORT".into(), raw))?,
            None => defaults.port,
        };

        let max_upload_bytes = match get("BASEROOT_MAX_UPLOAD_BYTES") {
            Some(raw) => match raw.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => return Err(ConfigError::InvalidValue("BASEROOT_MAX_UPLOAD_BYTES".into(), raw)),
            },
            None => defaults.max_upload_bytes,
        };

        Ok(Self {
            port,
            upload_dir: get("BASEROOT_UPLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.upload_dir),
            max_upload_bytes,
            journal_dir: get("BASEROOT_JOURNAL_DIR").map(PathBuf::from),
            log_json: flag("BASEROOT_LOG_JSON", false)?,
            metrics_enabled: flag("BASEROOT_METRICS_ENABLED", true)?,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {0}: {1:?}")]
    InvalidValue(String, String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<ApiConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ApiConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults_when_unset() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.upload_dir, PathBuf::from("./uploads"));
        assert_eq!(cfg.max_upload_bytes, 100 * 1024 * 1024);
        assert!(cfg.journal_dir.is_none());
        assert!(!cfg.log_json);
        assert!(cfg.metrics_enabled);
    }

    #[test]
    fn overrides_and_blank_values() {
        let cfg = load(&[
            ("BASEROOT_PORT", "8080"),
            ("BASEROOT_UPLOAD_DIR", "/var/tmp/baseroot"),
            ("BASEROOT_JOURNAL_DIR", "  "),
            ("BASEROOT_LOG_JSON", "true"),
            ("BASEROOT_METRICS_ENABLED", "off"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.upload_dir, PathBuf::from("/var/tmp/baseroot"));
        assert!(cfg.journal_dir.is_none());
        assert!(cfg.log_json);
        assert!(!cfg.metrics_enabled);
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(load(&[("BASEROOT_PORT", "99999")]).is_err());
        assert!(load(&[("BASEROOT_MAX_UPLOAD_BYTES", "0")]).is_err());
        assert!(load(&[("BASEROOT_LOG_JSON", "maybe")]).is_err());
    }
}
