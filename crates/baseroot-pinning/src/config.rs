//! Pinning client configuration.
//!
//! Selects the backend and holds its endpoints and credentials. Loaded
//! from environment variables; nothing secret has a default.

use url::Url;
use zeroize::Zeroizing;

/// Default Pinata REST endpoint.
pub const DEFAULT_PINATA_API_URL: &str = "https://api.pinata.cloud";
/// Default public Pinata gateway.
pub const DEFAULT_PINATA_GATEWAY_URL: &str = "https://gateway.pinata.cloud";
/// Default local Kubo RPC endpoint.
pub const DEFAULT_KUBO_API_URL: &str = "http://127.0.0.1:5001";

/// Which pinning service to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinningBackend {
    Pinata,
    Kubo,
}

impl std::str::FromStr for PinningBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pinata" => Ok(Self::Pinata),
            "kubo" | "ipfs" => Ok(Self::Kubo),
            other => Err(ConfigError::UnknownBackend(other.to_string())),
        }
    }
}

/// Pinata credentials.
#[derive(Clone)]
pub enum PinataAuth {
    /// Scoped JWT sent as a bearer token.
    Jwt(Zeroizing<String>),
    /// Legacy key pair sent as `pinata_api_key` / `pinata_secret_api_key`.
    ApiKey {
        key: Zeroizing<String>,
        secret: Zeroizing<String>,
    },
}

impl std::fmt::Debug for PinataAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Jwt(_) => f.write_str("Jwt([REDACTED])"),
            Self::ApiKey { .. } => f.write_str("ApiKey([REDACTED])"),
        }
    }
}

/// Pinata endpoints and credentials.
#[derive(Debug, Clone)]
pub struct PinataConfig {
    pub api_url: Url,
    pub gateway_url: Url,
    pub auth: PinataAuth,
    pub timeout_secs: u64,
}

/// Kubo (go-ipfs) RPC endpoint.
#[derive(Debug, Clone)]
pub struct KuboConfig {
    pub api_url: Url,
    pub timeout_secs: u64,
}

/// Backend selection plus the name recorded with each pin.
#[derive(Debug, Clone)]
pub struct PinningConfig {
    pub backend: BackendConfig,
    /// Fixed pin name. When unset the uploaded file name is used.
    pub pin_name: Option<String>,
}

/// Per-backend settings.
#[derive(Debug, Clone)]
pub enum BackendConfig {
    Pinata(PinataConfig),
    Kubo(KuboConfig),
}

impl PinningConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `BASEROOT_PINNING_BACKEND`: `pinata` (default) or `kubo`
    /// - `PINATA_JWT`, or `PINATA_API_KEY` + `PINATA_SECRET_API_KEY` (required for pinata)
    /// - `PINATA_API_URL` (default: `https://api.pinata.cloud`)
    /// - `PINATA_GATEWAY_URL` (default: `https://gateway.pinata.cloud`)
    /// - `KUBO_API_URL` (default: `http://127.0.0.1:5001`)
    /// - `BASEROOT_PIN_NAME` (optional)
    /// - `BASEROOT_PINNING_TIMEOUT_SECS` (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let backend: PinningBackend = match get("BASEROOT_PINNING_BACKEND") {
            Some(raw) => raw.parse()?,
            None => PinningBackend::Pinata,
        };
        let timeout_secs = match get("BASEROOT_PINNING_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                ConfigError::InvalidNumber("BASEROOT_PINNING_TIMEOUT_SECS".into(), raw.clone())
            })?,
            None => 60,
        };

        let url = |var: &str, default: &str| -> Result<Url, ConfigError> {
            let raw = get(var).unwrap_or_else(|| default.to_string());
            Url::parse(raw.trim())
                .map_err(|e| ConfigError::InvalidUrl(var.to_string(), e.to_string()))
        };

        let backend = match backend {
            PinningBackend::Pinata => {
                let auth = match (
                    get("PINATA_JWT"),
                    get("PINATA_API_KEY"),
                    get("PINATA_SECRET_API_KEY"),
                ) {
                    (Some(jwt), _, _) => PinataAuth::Jwt(Zeroizing::new(jwt.trim().to_string())),
                    (None, Some(key), Some(secret)) => PinataAuth::ApiKey {
                        key: Zeroizing::new(key.trim().to_string()),
                        secret: Zeroizing::new(secret.trim().to_string()),
                    },
                    _ => return Err(ConfigError::MissingCredentials),
                };
                BackendConfig::Pinata(PinataConfig {
                    api_url: url("PINATA_API_URL", DEFAULT_PINATA_API_URL)?,
                    gateway_url: url("PINATA_GATEWAY_URL", DEFAULT_PINATA_GATEWAY_URL)?,
                    auth,
                    timeout_secs,
                })
            }
            PinningBackend::Kubo => BackendConfig::Kubo(KuboConfig {
                api_url: url("KUBO_API_URL", DEFAULT_KUBO_API_URL)?,
                timeout_secs,
            }),
        };

        Ok(Self {
            backend,
            pin_name: get("BASEROOT_PIN_NAME"),
        })
    }

    /// Name to record for a pin of `file_name`.
    pub fn pin_name_for<'a>(&'a self, file_name: &'a str) -> &'a str {
        self.pin_name.as_deref().unwrap_or(file_name)
    }

    pub fn backend_kind(&self) -> PinningBackend {
        match self.backend {
            BackendConfig::Pinata(_) => PinningBackend::Pinata,
            BackendConfig::Kubo(_) => PinningBackend::Kubo,
        }
    }
}

impl PinataConfig {
    /// Configuration pointing both API and gateway at one local mock server.
    pub fn local_mock(base_url: &str, jwt: &str) -> Result<Self, ConfigError> {
        let url = Url::parse(base_url)
            .map_err(|e| ConfigError::InvalidUrl("local_mock".to_string(), e.to_string()))?;
        Ok(Self {
            api_url: url.clone(),
            gateway_url: url,
            auth: PinataAuth::Jwt(Zeroizing::new(jwt.to_string())),
            timeout_secs: 5,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PINATA_JWT or PINATA_API_KEY and PINATA_SECRET_API_KEY are required for the pinata backend")]
    MissingCredentials,
    #[error("unknown pinning backend {0:?} (expected \"pinata\" or \"kubo\")")]
    UnknownBackend(String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid number for {0}: {1:?}")]
    InvalidNumber(String, String),
    #[error("invalid header value for {0}")]
    InvalidHeader(&'static str),
}
