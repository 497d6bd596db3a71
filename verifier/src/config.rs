use std::env;
use std::time::Duration;

use crate::error::VerifyError;

pub const DEFAULT_GATEWAYS: &[&str] = &[
    "https://ipfs.io/ipfs/",
    "https://cloudflare-ipfs.com/ipfs/",
    "https://dweb.link/ipfs/",
];

/// Hard resource ceilings for one verification run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Wall-clock budget for the whole run.
    pub total_timeout: Duration,
    pub fetch_timeout: Duration,
    /// Outbound requests across both documents and every gateway.
    pub max_fetches: usize,
    pub max_response_bytes: usize,
    /// Maximum schema nesting the validator will follow.
    pub max_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            total_timeout: Duration::from_secs(10),
            fetch_timeout: Duration::from_secs(3),
            max_fetches: 5,
            max_response_bytes: 2 * 1024 * 1024,
            max_depth: 64,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifierConfig {
    /// Ordered gateway base URLs; the content identifier is appended.
    pub gateways: Vec<String>,
    pub limits: Limits,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            gateways: DEFAULT_GATEWAYS.iter().map(|g| g.to_string()).collect(),
            limits: Limits::default(),
        }
    }
}

impl VerifierConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self, VerifyError> {
        let defaults = Limits::default();
        let gateways = match env::var("VERIFIER_GATEWAYS") {
            Ok(list) => parse_gateways(&list),
            Err(_) => VerifierConfig::default().gateways,
        };

        let config = VerifierConfig {
            gateways,
            limits: Limits {
                total_timeout: env_millis("VERIFIER_TOTAL_TIMEOUT_MS", defaults.total_timeout)?,
                fetch_timeout: env_millis("VERIFIER_FETCH_TIMEOUT_MS", defaults.fetch_timeout)?,
                max_fetches: env_parse("VERIFIER_MAX_FETCHES", defaults.max_fetches)?,
                max_response_bytes: env_parse(
                    "VERIFIER_MAX_RESPONSE_BYTES",
                    defaults.max_response_bytes,
                )?,
                max_depth: env_parse("VERIFIER_MAX_DEPTH", defaults.max_depth)?,
            },
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), VerifyError> {
        if self.gateways.is_empty() {
            return Err(VerifyError::Config("at least one gateway is required".into()));
        }
        if let Some(bad) = self
            .gateways
            .iter()
            .find(|g| !(g.starts_with("https://") || g.starts_with("http://")))
        {
            return Err(VerifyError::Config(format!("gateway {bad:?} is not an http(s) URL")));
        }
        if self.limits.max_fetches == 0 || self.limits.max_response_bytes == 0 {
            return Err(VerifyError::Config("fetch limits must be non-zero".into()));
        }
        if self.limits.fetch_timeout > self.limits.total_timeout {
            return Err(VerifyError::Config(
                "per-fetch timeout exceeds the total budget".into(),
            ));
        }
        Ok(())
    }
}

/// Split a comma-separated gateway list, trimming blanks and ensuring each
/// base ends with `/`.
pub fn parse_gateways(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(normalize_gateway)
        .collect()
}

pub fn normalize_gateway(gateway: &str) -> String {
    if gateway.ends_with('/') {
        gateway.to_string()
    } else {
        format!("{gateway}/")
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T, VerifyError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| VerifyError::Config(format!("{key} is not a valid number: {raw:?}"))),
        Err(_) => Ok(default),
    }
}

fn env_millis(key: &str, default: Duration) -> Result<Duration, VerifyError> {
    let millis = env_parse(key, default.as_millis() as u64)?;
    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gateways_normalizes() {
        let gateways = parse_gateways(" https://a.example/ipfs , ,https://b.example/ipfs/");
        assert_eq!(
            gateways,
            vec![
                "https://a.example/ipfs/".to_string(),
                "https://b.example/ipfs/".to_string()
            ]
        );
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = VerifierConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.limits.max_fetches, 5);
        assert_eq!(config.gateways.len(), DEFAULT_GATEWAYS.len());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let mut config = VerifierConfig::default();
        config.gateways = vec!["ftp://nope/".into()];
        assert!(config.validate().is_err());

        let mut config = VerifierConfig::default();
        config.limits.fetch_timeout = Duration::from_secs(60);
        assert!(config.validate().is_err());

        let mut config = VerifierConfig::default();
        config.gateways.clear();
        assert!(config.validate().is_err());
    }
}
