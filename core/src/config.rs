//! Endpoints and limits used by the dispatcher.

use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_LOCAL_RELAY: &str = "http://localhost:8766";
pub const DEFAULT_HOSTED_RELAY: &str = "https://st-playground.vercel.app/api/proxy";
pub const DEFAULT_OPAQUE_BASE: &str = "https://api.allorigins.win/raw?url=";
pub const DEFAULT_PREFIX_BASE: &str = "https://corsproxy.io/?";

pub const ENV_LOCAL_RELAY: &str = "CURLRELAY_LOCAL_RELAY";
pub const ENV_HOSTED_RELAY: &str = "CURLRELAY_HOSTED_RELAY";
pub const ENV_OPAQUE_BASE: &str = "CURLRELAY_OPAQUE_BASE";
pub const ENV_PREFIX_BASE: &str = "CURLRELAY_PREFIX_BASE";
pub const ENV_TIMEOUT_SECS: &str = "CURLRELAY_TIMEOUT_SECS";

/// Where each strategy sends its traffic.
///
/// The rewrite bases are prefixes: the percent-encoded target URL is
/// appended verbatim. `timeout` is `None` by default, leaving any limit to
/// the caller or the network stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub local_relay_url: String,
    pub hosted_relay_url: String,
    pub opaque_base: String,
    pub prefix_base: String,
    pub timeout: Option<Duration>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            local_relay_url: DEFAULT_LOCAL_RELAY.to_string(),
            hosted_relay_url: DEFAULT_HOSTED_RELAY.to_string(),
            opaque_base: DEFAULT_OPAQUE_BASE.to_string(),
            prefix_base: DEFAULT_PREFIX_BASE.to_string(),
            timeout: None,
        }
    }
}

impl DispatchConfig {
    /// Defaults overridden by `CURLRELAY_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable.
    /// Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = read(ENV_LOCAL_RELAY) {
            config.local_relay_url = endpoint(ENV_LOCAL_RELAY, url)?;
        }
        if let Some(url) = read(ENV_HOSTED_RELAY) {
            config.hosted_relay_url = endpoint(ENV_HOSTED_RELAY, url)?;
        }
        if let Some(base) = read(ENV_OPAQUE_BASE) {
            config.opaque_base = endpoint(ENV_OPAQUE_BASE, base)?;
        }
        if let Some(base) = read(ENV_PREFIX_BASE) {
            config.prefix_base = endpoint(ENV_PREFIX_BASE, base)?;
        }
        if let Some(secs) = read(ENV_TIMEOUT_SECS) {
            let parsed = secs
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout {
                    var: ENV_TIMEOUT_SECS,
                    value: secs.clone(),
                })?;
            config.timeout = Some(Duration::from_secs(parsed));
        }
        Ok(config)
    }
}

fn endpoint(var: &'static str, value: String) -> Result<String, ConfigError> {
    let value = value.trim().to_string();
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(value)
    } else {
        Err(ConfigError::InvalidEndpoint { var, value })
    }
}
