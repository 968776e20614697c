//! Configuration types for backend clients.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry settings for transport failures.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per logical call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Wait before attempt `k + 1` is `k` times this delay.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    60_000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
        }
    }
}

impl RetryConfig {
    /// Create a retry configuration.
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts,
            base_delay_ms: base_delay.as_millis() as u64,
        }
    }

    /// Base delay as a duration.
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }
}

/// Payment outcome polling settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Wait after a record reports the payment still pending.
    #[serde(default = "default_pending_interval_ms")]
    pub pending_interval_ms: u64,

    /// Wait after a query returns no record yet.
    #[serde(default = "default_empty_interval_ms")]
    pub empty_interval_ms: u64,

    /// Upper bound on status queries; `None` polls until cancelled.
    #[serde(default = "default_max_polls")]
    pub max_attempts: Option<u32>,
}

fn default_pending_interval_ms() -> u64 {
    200
}

fn default_empty_interval_ms() -> u64 {
    50
}

fn default_max_polls() -> Option<u32> {
    Some(1500)
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            pending_interval_ms: default_pending_interval_ms(),
            empty_interval_ms: default_empty_interval_ms(),
            max_attempts: default_max_polls(),
        }
    }
}

impl PollConfig {
    /// Set both wait intervals.
    pub fn with_intervals(mut self, pending: Duration, empty: Duration) -> Self {
        self.pending_interval_ms = pending.as_millis() as u64;
        self.empty_interval_ms = empty.as_millis() as u64;
        self
    }

    /// Set the query ceiling.
    pub fn with_max_attempts(mut self, max_attempts: Option<u32>) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Wait after a pending record.
    pub fn pending_interval(&self) -> Duration {
        Duration::from_millis(self.pending_interval_ms)
    }

    /// Wait after an empty result.
    pub fn empty_interval(&self) -> Duration {
        Duration::from_millis(self.empty_interval_ms)
    }
}

/// Connection details for a bitcoind JSON-RPC wallet.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BitcoindConfig {
    /// RPC endpoint URL (e.g., "http://localhost:18443").
    pub rpc_url: String,

    /// RPC user.
    pub user: String,

    /// RPC password.
    pub password: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl BitcoindConfig {
    /// Create a new bitcoind configuration.
    pub fn new(
        rpc_url: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            rpc_url: rpc_url.into(),
            user: user.into(),
            password: password.into(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

/// Configuration for an Eclair REST API backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EclairConfig {
    /// REST API endpoint URL (e.g., "http://localhost:8080").
    pub url: String,

    /// API password, sent as HTTP basic auth with an empty user.
    pub password: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Transport retry settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Payment polling settings.
    #[serde(default)]
    pub poll: PollConfig,

    /// Wallet used for deposit addresses.
    #[serde(default)]
    pub bitcoind: Option<BitcoindConfig>,
}

impl EclairConfig {
    /// Create a new Eclair configuration.
    pub fn new(url: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            password: password.into(),
            timeout_secs: default_timeout(),
            retry: RetryConfig::default(),
            poll: PollConfig::default(),
            bitcoind: None,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the payment polling policy.
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Attach a bitcoind wallet.
    pub fn with_bitcoind(mut self, bitcoind: BitcoindConfig) -> Self {
        self.bitcoind = Some(bitcoind);
        self
    }
}

/// Configuration for a Ptarmigan REST API backend.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PtarmiganConfig {
    /// REST API endpoint URL (e.g., "http://localhost:3000").
    pub url: String,

    /// API token, sent as a bearer token.
    pub api_token: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Transport retry settings.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Payment polling settings.
    #[serde(default)]
    pub poll: PollConfig,

    /// Wallet used for deposit addresses.
    #[serde(default)]
    pub bitcoind: Option<BitcoindConfig>,
}

impl PtarmiganConfig {
    /// Create a new Ptarmigan configuration.
    pub fn new(url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            api_token: api_token.into(),
            timeout_secs: default_timeout(),
            retry: RetryConfig::default(),
            poll: PollConfig::default(),
            bitcoind: None,
        }
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set the payment polling policy.
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Attach a bitcoind wallet.
    pub fn with_bitcoind(mut self, bitcoind: BitcoindConfig) -> Self {
        self.bitcoind = Some(bitcoind);
        self
    }
}

/// Unified backend configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    /// Eclair REST API.
    Eclair(EclairConfig),
    /// Ptarmigan REST API.
    Ptarmigan(PtarmiganConfig),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_defaults() {
        let retry = RetryConfig::default();
        assert_eq!(retry.max_attempts, 5);
        assert_eq!(retry.base_delay(), Duration::from_secs(60));
    }

    #[test]
    fn test_eclair_builder() {
        let config = EclairConfig::new("http://localhost:8080", "secret")
            .with_timeout(10)
            .with_bitcoind(BitcoindConfig::new("http://localhost:18443", "u", "p"));

        assert_eq!(config.url, "http://localhost:8080");
        assert_eq!(config.timeout_secs, 10);
        assert!(config.bitcoind.is_some());
        assert_eq!(config.poll.pending_interval(), Duration::from_millis(200));
    }

    #[test]
    fn test_backend_config_tagged() {
        let json = serde_json::json!({
            "type": "ptarmigan",
            "url": "http://localhost:3000",
            "api_token": "token",
            "poll": { "max_attempts": null }
        });
        let config: BackendConfig = serde_json::from_value(json).unwrap();
        match config {
            BackendConfig::Ptarmigan(p) => {
                assert_eq!(p.api_token, "token");
                assert_eq!(p.timeout_secs, 30);
                assert_eq!(p.poll.max_attempts, None);
                assert_eq!(p.poll.pending_interval_ms, 200);
                assert_eq!(p.retry.max_attempts, 5);
            }
            other => panic!("unexpected config: {:?}", other),
        }
    }
}
