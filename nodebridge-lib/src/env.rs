//! Backend configuration from environment variables.
//!
//! | Variable                     | Meaning                                  |
//! |------------------------------|------------------------------------------|
//! | `NODEBRIDGE_BACKEND`         | `eclair` or `ptarmigan`                  |
//! | `NODEBRIDGE_URL`             | REST base URL                            |
//! | `NODEBRIDGE_SECRET`          | Eclair password or Ptarmigan API token   |
//! | `NODEBRIDGE_TIMEOUT`         | request timeout in seconds (optional)    |
//! | `NODEBRIDGE_BITCOIND_URL`    | bitcoind JSON-RPC URL (optional)         |
//! | `NODEBRIDGE_BITCOIND_USER`   | bitcoind RPC user                        |
//! | `NODEBRIDGE_BITCOIND_PASSWORD` | bitcoind RPC password                  |

use crate::config::{BackendConfig, BitcoindConfig, EclairConfig, PtarmiganConfig};

/// Load the backend configuration from the process environment.
///
/// Returns `None` when a required variable is missing or the backend name is
/// unknown.
pub fn backend_config_from_env() -> Option<BackendConfig> {
    backend_config_from_lookup(|name| std::env::var(name).ok())
}

/// Load the backend configuration through an arbitrary variable lookup.
pub fn backend_config_from_lookup<F>(lookup: F) -> Option<BackendConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let backend = lookup("NODEBRIDGE_BACKEND")?;
    let url = lookup("NODEBRIDGE_URL")?;
    let secret = lookup("NODEBRIDGE_SECRET")?;

    let timeout = lookup("NODEBRIDGE_TIMEOUT").and_then(|raw| raw.parse::<u64>().ok());
    let bitcoind = bitcoind_config_from_lookup(&lookup);

    match backend.to_ascii_lowercase().as_str() {
        "eclair" => {
            let mut config = EclairConfig::new(url, secret);
            if let Some(secs) = timeout {
                config = config.with_timeout(secs);
            }
            if let Some(bitcoind) = bitcoind {
                config = config.with_bitcoind(bitcoind);
            }
            Some(BackendConfig::Eclair(config))
        }
        "ptarmigan" => {
            let mut config = PtarmiganConfig::new(url, secret);
            if let Some(secs) = timeout {
                config = config.with_timeout(secs);
            }
            if let Some(bitcoind) = bitcoind {
                config = config.with_bitcoind(bitcoind);
            }
            Some(BackendConfig::Ptarmigan(config))
        }
        other => {
            tracing::warn!("unknown NODEBRIDGE_BACKEND {:?}", other);
            None
        }
    }
}

fn bitcoind_config_from_lookup<F>(lookup: &F) -> Option<BitcoindConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let url = lookup("NODEBRIDGE_BITCOIND_URL")?;
    let user = lookup("NODEBRIDGE_BITCOIND_USER").unwrap_or_default();
    let password = lookup("NODEBRIDGE_BITCOIND_PASSWORD").unwrap_or_default();
    Some(BitcoindConfig::new(url, user, password))
}
