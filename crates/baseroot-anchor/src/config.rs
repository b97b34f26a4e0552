//! Anchor submitter configuration.

use std::time::Duration;

use baseroot_core::Pubkey;
use url::Url;

/// Default local validator endpoint.
pub const DEFAULT_RPC_URL: &str = "http://localhost:8899";

/// Commitment level the submitter waits for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Commitment {
    Processed,
    Confirmed,
    Finalized,
}

impl Commitment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Confirmed => "confirmed",
            Self::Finalized => "finalized",
        }
    }
}

impl std::str::FromStr for Commitment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "processed" => Ok(Self::Processed),
            "confirmed" => Ok(Self::Confirmed),
            "finalized" => Ok(Self::Finalized),
            other => Err(ConfigError::InvalidCommitment(other.to_string())),
        }
    }
}

impl std::fmt::Display for Commitment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// RPC endpoint, target program and confirmation policy.
#[derive(Debug, Clone)]
pub struct AnchorConfig {
    pub rpc_url: Url,
    /// Address of the anchor program every transaction invokes.
    pub program_id: Pubkey,
    pub commitment: Commitment,
    /// Per-request HTTP timeout.
    pub rpc_timeout_secs: u64,
    /// How long to poll for confirmation after sending.
    pub confirm_timeout_secs: u64,
    pub confirm_poll_ms: u64,
}

impl AnchorConfig {
    /// Load configuration from environment variables.
    ///
    /// Variables:
    /// - `SOLANA_RPC_URL` (default: `http://localhost:8899`)
    /// - `BASEROOT_PROGRAM_ID` (required, base58)
    /// - `SOLANA_COMMITMENT` (default: `confirmed`)
    /// - `BASEROOT_RPC_TIMEOUT_SECS` (default: 30)
    /// - `BASEROOT_CONFIRM_TIMEOUT_SECS` (default: 60)
    /// - `BASEROOT_CONFIRM_POLL_MS` (default: 500)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let number = |name: &str, default: u64| -> Result<u64, ConfigError> {
            match get(name) {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidNumber(name.to_string(), raw)),
                None => Ok(default),
            }
        };

        let raw_url = get("SOLANA_RPC_URL").unwrap_or_else(|| DEFAULT_RPC_URL.to_string());
        let rpc_url = Url::parse(raw_url.trim())
            .map_err(|e| ConfigError::InvalidUrl("SOLANA_RPC_URL".into(), e.to_string()))?;

        let program_id = get("BASEROOT_PROGRAM_ID")
            .ok_or(ConfigError::MissingProgramId)?
            .parse::<Pubkey>()
            .map_err(|e| ConfigError::InvalidProgramId(e.to_string()))?;

        let commitment = match get("SOLANA_COMMITMENT") {
            Some(raw) => raw.parse()?,
            None => Commitment::Confirmed,
        };

        let config = Self {
            rpc_url,
            program_id,
            commitment,
            rpc_timeout_secs: number("BASEROOT_RPC_TIMEOUT_SECS", 30)?,
            confirm_timeout_secs: number("BASEROOT_CONFIRM_TIMEOUT_SECS", 60)?,
            confirm_poll_ms: number("BASEROOT_CONFIRM_POLL_MS", 500)?,
        };
        if config.confirm_poll_ms == 0 {
            return Err(ConfigError::InvalidNumber(
                "BASEROOT_CONFIRM_POLL_MS".into(),
                "0".into(),
            ));
        }
        Ok(config)
    }

    /// Configuration for a local mock RPC server with short deadlines.
    pub fn local_mock(rpc_url: &str, program_id: Pubkey) -> Result<Self, ConfigError> {
        Ok(Self {
            rpc_url: Url::parse(rpc_url)
                .map_err(|e| ConfigError::InvalidUrl("local_mock".into(), e.to_string()))?,
            program_id,
            commitment: Commitment::Confirmed,
            rpc_timeout_secs: 5,
            confirm_timeout_secs: 2,
            confirm_poll_ms: 20,
        })
    }

    pub fn confirm_timeout(&self) -> Duration {
        Duration::from_secs(self.confirm_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.confirm_poll_ms)
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("BASEROOT_PROGRAM_ID environment variable is required")]
    MissingProgramId,
    #[error("invalid BASEROOT_PROGRAM_ID: {0}")]
    InvalidProgramId(String),
    #[error("invalid URL for {0}: {1}")]
    InvalidUrl(String, String),
    #[error("invalid number for {0}: {1:?}")]
    InvalidNumber(String, String),
    #[error("unknown commitment {0:?} (expected processed, confirmed or finalized)")]
    InvalidCommitment(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const PROGRAM: &str = "D4vE1yXw3n3G86V9G9R71T5iG6K7T26F5rL7iP8JdC7f";

    fn load(vars: &[(&str, &str)]) -> Result<AnchorConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AnchorConfig::from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = load(&[("BASEROOT_PROGRAM_ID", PROGRAM)]).unwrap();
        assert_eq!(cfg.rpc_url.as_str(), "http://localhost:8899/");
        assert_eq!(cfg.program_id.to_base58(), PROGRAM);
        assert_eq!(cfg.commitment, Commitment::Confirmed);
        assert_eq!(cfg.rpc_timeout_secs, 30);
        assert_eq!(cfg.confirm_timeout(), Duration::from_secs(60));
        assert_eq!(cfg.poll_interval(), Duration::from_millis(500));
    }

    #[test]
    fn program_id_is_required() {
        assert!(matches!(load(&[]), Err(ConfigError::MissingProgramId)));
        assert!(matches!(
            load(&[("BASEROOT_PROGRAM_ID", "not-a-key")]),
            Err(ConfigError::InvalidProgramId(_))
        ));
    }

    #[test]
    fn overrides() {
        let cfg = load(&[
            ("BASEROOT_PROGRAM_ID", PROGRAM),
            ("SOLANA_RPC_URL", "https://api.devnet.solana.com"),
            ("SOLANA_COMMITMENT", "Finalized"),
            ("BASEROOT_CONFIRM_POLL_MS", "250"),
        ])
        .unwrap();
        assert_eq!(cfg.rpc_url.host_str(), Some("api.devnet.solana.com"));
        assert_eq!(cfg.commitment, Commitment::Finalized);
        assert_eq!(cfg.confirm_poll_ms, 250);
    }

    #[test]
    fn bad_numbers_and_commitment_rejected() {
        assert!(load(&[("BASEROOT_PROGRAM_ID", PROGRAM), ("BASEROOT_RPC_TIMEOUT_SECS", "soon")]).is_err());
        assert!(load(&[("BASEROOT_PROGRAM_ID", PROGRAM), ("BASEROOT_CONFIRM_POLL_MS", "0")]).is_err());
        assert!(load(&[("BASEROOT_PROGRAM_ID", PROGRAM), ("SOLANA_COMMITMENT", "max")]).is_err());
    }

    #[test]
    fn commitment_ordering() {
        assert!(Commitment::Finalized > Commitment::Confirmed);
        assert!(Commitment::Confirmed > Commitment::Processed);
    }
}
