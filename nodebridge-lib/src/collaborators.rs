//! External collaborators a client can be given.
//!
//! Deposit addresses come from an on-chain wallet, invoice-paid events from a
//! push channel. Neither is part of the node's REST surface, so clients only
//! offer them when the matching collaborator is attached.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use crate::config::BitcoindConfig;
use crate::models::Invoice;
use crate::poller::CancelToken;
use crate::{NodeBridgeError, Result};

/// On-chain wallet able to hand out receive addresses.
#[async_trait]
pub trait WalletRpc: Send + Sync {
    /// A fresh receive address.
    async fn new_address(&self) -> Result<String>;
}

/// Stream of paid invoices.
#[async_trait]
pub trait InvoiceListener: Send {
    /// Next paid invoice, or `None` once cancelled.
    async fn wait_invoice(&mut self, cancel: &CancelToken) -> Result<Option<Invoice>>;
}

/// Opens invoice listeners.
#[async_trait]
pub trait InvoiceEvents: Send + Sync {
    /// Open a new listener.
    async fn subscribe(&self) -> Result<Box<dyn InvoiceListener>>;
}

/// Optional collaborators held by a client.
#[derive(Clone, Default)]
pub struct Collaborators {
    wallet: Option<Arc<dyn WalletRpc>>,
    events: Option<Arc<dyn InvoiceEvents>>,
}

impl Collaborators {
    /// Attach a wallet.
    pub fn with_wallet(mut self, wallet: Arc<dyn WalletRpc>) -> Self {
        self.wallet = Some(wallet);
        self
    }

    /// Attach an invoice event source.
    pub fn with_events(mut self, events: Arc<dyn InvoiceEvents>) -> Self {
        self.events = Some(events);
        self
    }

    /// Deposit address from the wallet, if one is attached.
    pub async fn deposit_address(&self) -> Result<String> {
        match &self.wallet {
            Some(wallet) => wallet.new_address().await,
            None => Err(NodeBridgeError::NotSupported(
                "deposit address without wallet connection".to_string(),
            )),
        }
    }

    /// Listener from the event source, if one is attached.
    pub async fn listen(&self) -> Result<Box<dyn InvoiceListener>> {
        match &self.events {
            Some(events) => events.subscribe().await,
            None => Err(NodeBridgeError::NotSupported(
                "invoice listening without event source".to_string(),
            )),
        }
    }
}

/// bitcoind JSON-RPC wallet.
pub struct BitcoindWallet {
    config: BitcoindConfig,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<String>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

impl BitcoindWallet {
    /// Create a wallet client.
    pub fn new(config: BitcoindConfig) -> Result<Self> {
        if config.rpc_url.is_empty() {
            return Err(NodeBridgeError::invalid_config(
                "rpc_url",
                "RPC URL cannot be empty",
            ));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| NodeBridgeError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }
}

#[async_trait]
impl WalletRpc for BitcoindWallet {
    async fn new_address(&self) -> Result<String> {
        let request = serde_json::json!({
            "jsonrpc": "1.0",
            "id": "nodebridge",
            "method": "getnewaddress",
            "params": [],
        });

        let response = self
            .client
            .post(&self.config.rpc_url)
            .basic_auth(&self.config.user, Some(&self.config.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| NodeBridgeError::Transport(format!("bitcoind request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| NodeBridgeError::Transport(format!("bitcoind response unreadable: {}", e)))?;

        // bitcoind reports RPC errors with a 500 and a JSON body.
        let parsed: RpcResponse = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(NodeBridgeError::Backend {
                    status: status.as_u16(),
                    message: body,
                })
            }
            Err(e) => return Err(NodeBridgeError::decode("getnewaddress", e)),
        };

        if let Some(err) = parsed.error {
            return Err(NodeBridgeError::Backend {
                status: status.as_u16(),
                message: format!("{} (code {})", err.message, err.code),
            });
        }

        parsed
            .result
            .ok_or_else(|| NodeBridgeError::decode("getnewaddress", "missing result"))
    }
}
