//! Backend-agnostic client surface.
//!
//! # Architecture
//!
//! ```text
//! caller ──► LightningClient (EclairClient / PtarmiganClient)
//!               │  status resolver, open-channel classifier, poller
//!               ▼
//!            Dispatcher + RetryPolicy ──► node REST API
//! ```

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

use crate::collaborators::{BitcoindWallet, Collaborators, InvoiceListener};
use crate::config::{BackendConfig, BitcoindConfig};
use crate::eclair::EclairClient;
use crate::models::{Channel, Invoice, NodeInfo, NodeInformation, OpenChannelOutcome, OpenChannelRequest};
use crate::poller::{CancelToken, PollResult};
use crate::ptarmigan::PtarmiganClient;
use crate::Result;

/// Capabilities every backend dialect offers.
#[async_trait]
pub trait LightningClient: Send + Sync {
    /// Node identity, addresses and block height.
    async fn get_info(&self) -> Result<NodeInformation>;

    /// Create an invoice for `amount_msat` payable until `expiry` from now.
    async fn create_invoice(
        &self,
        amount_msat: u64,
        description: &str,
        expiry: Duration,
    ) -> Result<Invoice>;

    /// Look up an invoice by payment hash; status is computed at call time.
    async fn get_invoice(&self, invoice_id: &str) -> Result<Invoice>;

    /// Open a listener for paid invoices.
    async fn listen(&self) -> Result<Box<dyn InvoiceListener>>;

    /// Pay a BOLT11 invoice and wait for a terminal outcome.
    async fn pay(&self, bolt11: &str, cancel: &CancelToken) -> Result<PollResult>;

    /// Fresh on-chain deposit address.
    async fn get_deposit_address(&self) -> Result<String>;

    /// Connect to a peer.
    async fn connect_to(&self, node: &NodeInfo) -> Result<()>;

    /// Open a channel and classify the outcome.
    async fn open_channel(&self, request: &OpenChannelRequest) -> Result<OpenChannelOutcome>;

    /// Snapshot of every channel.
    async fn list_channels(&self) -> Result<Vec<Channel>>;
}

/// Build a client for the configured backend.
///
/// A configured bitcoind wallet is attached as the deposit-address source.
pub fn build_client(config: BackendConfig) -> Result<Box<dyn LightningClient>> {
    match config {
        BackendConfig::Eclair(config) => {
            let collaborators = wallet_collaborators(config.bitcoind.clone())?;
            Ok(Box::new(
                EclairClient::new(config)?.with_collaborators(collaborators),
            ))
        }
        BackendConfig::Ptarmigan(config) => {
            let collaborators = wallet_collaborators(config.bitcoind.clone())?;
            Ok(Box::new(
                PtarmiganClient::new(config)?.with_collaborators(collaborators),
            ))
        }
    }
}

fn wallet_collaborators(bitcoind: Option<BitcoindConfig>) -> Result<Collaborators> {
    let collaborators = Collaborators::default();
    match bitcoind {
        Some(config) => Ok(collaborators.with_wallet(Arc::new(BitcoindWallet::new(config)?))),
        None => Ok(collaborators),
    }
}
