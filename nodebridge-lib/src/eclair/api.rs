//! Eclair REST API calls and wire types.
//!
//! Eclair takes form-encoded parameters and answers with camelCase JSON.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::EclairConfig;
use crate::dispatch::{Auth, BodyEncoding, Dispatcher};
use crate::models::PaymentState;
use crate::open_channel::ChannelStateLookup;
use crate::poller::PaymentStatusSource;
use crate::retry::RetryPolicy;
use crate::{NodeBridgeError, Result};

/// One explicit function per Eclair method.
#[derive(Clone, Debug)]
pub struct EclairApi {
    dispatcher: Dispatcher,
}

impl EclairApi {
    /// Create the API client from configuration.
    pub fn new(config: &EclairConfig) -> Result<Self> {
        if config.password.is_empty() {
            return Err(NodeBridgeError::invalid_config(
                "password",
                "Eclair password cannot be empty",
            ));
        }
        let dispatcher = Dispatcher::new(
            &config.url,
            Auth::Password(config.password.clone()),
            BodyEncoding::Form,
            Duration::from_secs(config.timeout_secs),
            RetryPolicy::from(&config.retry),
        )?;
        Ok(Self { dispatcher })
    }

    /// `getinfo`
    pub async fn get_info(&self) -> Result<GetInfoResponse> {
        self.dispatcher.call_empty("getinfo").await
    }

    /// `createinvoice`
    pub async fn create_invoice(
        &self,
        description: &str,
        amount_msat: u64,
        expire_in_secs: u64,
    ) -> Result<InvoiceResponse> {
        let params = CreateInvoiceParams {
            description,
            amount_msat,
            expire_in: expire_in_secs,
        };
        self.dispatcher.call("createinvoice", Some(&params)).await
    }

    /// `getinvoice`
    pub async fn get_invoice(&self, payment_hash: &str) -> Result<InvoiceResponse> {
        self.dispatcher
            .call("getinvoice", Some(&PaymentHashParams { payment_hash }))
            .await
    }

    /// `getreceivedinfo`
    pub async fn get_received_info(&self, payment_hash: &str) -> Result<ReceivedInfoResponse> {
        self.dispatcher
            .call("getreceivedinfo", Some(&PaymentHashParams { payment_hash }))
            .await
    }

    /// `payinvoice`; returns the payment reference id.
    pub async fn pay_invoice(&self, invoice: &str) -> Result<String> {
        self.dispatcher
            .call("payinvoice", Some(&PayInvoiceParams { invoice }))
            .await
    }

    /// `getsentinfo` by payment reference id.
    pub async fn get_sent_info(&self, id: &str) -> Result<Vec<SentInfoResponse>> {
        self.dispatcher
            .call("getsentinfo", Some(&SentInfoParams { id }))
            .await
    }

    /// `open`; returns Eclair's free-text result.
    pub async fn open(
        &self,
        node_id: &str,
        funding_satoshis: u64,
        fee_rate_sat_byte: u64,
    ) -> Result<String> {
        let params = OpenParams {
            node_id,
            funding_satoshis,
            funding_feerate_sat_byte: fee_rate_sat_byte,
        };
        self.dispatcher.call("open", Some(&params)).await
    }

    /// `channel`
    pub async fn channel(&self, channel_id: &str) -> Result<ChannelResponse> {
        self.dispatcher
            .call("channel", Some(&ChannelParams { channel_id }))
            .await
    }

    /// `channels`
    pub async fn channels(&self) -> Result<Vec<ChannelResponse>> {
        self.dispatcher.call_empty("channels").await
    }

    /// `connect`
    pub async fn connect(&self, node_id: &str, host: &str, port: u16) -> Result<String> {
        let params = ConnectParams {
            node_id,
            host,
            port,
        };
        self.dispatcher.call("connect", Some(&params)).await
    }
}

#[async_trait]
impl PaymentStatusSource for EclairApi {
    async fn payment_state(&self, reference: &str) -> Result<Option<PaymentState>> {
        let records = self.get_sent_info(reference).await?;
        Ok(records.first().map(|record| record.status.state()))
    }
}

#[async_trait]
impl ChannelStateLookup for EclairApi {
    async fn channel_state(&self, channel_id: &str) -> Result<String> {
        Ok(self.channel(channel_id).await?.state)
    }
}

// Request parameters

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateInvoiceParams<'a> {
    description: &'a str,
    amount_msat: u64,
    expire_in: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PaymentHashParams<'a> {
    payment_hash: &'a str,
}

#[derive(Serialize)]
struct PayInvoiceParams<'a> {
    invoice: &'a str,
}

#[derive(Serialize)]
struct SentInfoParams<'a> {
    id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenParams<'a> {
    node_id: &'a str,
    funding_satoshis: u64,
    funding_feerate_sat_byte: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChannelParams<'a> {
    channel_id: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectParams<'a> {
    node_id: &'a str,
    host: &'a str,
    port: u16,
}

// Responses

/// `getinfo` response.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetInfoResponse {
    /// Node public key.
    pub node_id: String,
    /// Node alias.
    #[serde(default)]
    pub alias: String,
    /// Current block height.
    #[serde(default)]
    pub block_height: u64,
    /// Advertised `host:port` addresses.
    #[serde(default)]
    pub public_addresses: Vec<String>,
}

/// Invoice as returned by `createinvoice` / `getinvoice`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceResponse {
    /// BOLT11 string.
    pub serialized: String,
    /// Payment hash.
    pub payment_hash: String,
    /// Creation time, unix seconds.
    pub timestamp: i64,
    /// Seconds until expiry; BOLT11 default applies when absent.
    #[serde(default)]
    pub expiry: Option<i64>,
    /// Requested amount in msat; absent for amountless invoices.
    #[serde(default)]
    pub amount: Option<u64>,
    /// Description.
    #[serde(default)]
    pub description: String,
}

/// `getreceivedinfo` response.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedInfoResponse {
    /// Payment hash.
    #[serde(default)]
    pub payment_hash: String,
    /// Amount received in msat.
    #[serde(default)]
    pub amount_msat: u64,
    /// Receive time, unix milliseconds; 0 when unpaid.
    #[serde(default)]
    pub received_at: i64,
}

/// One `getsentinfo` record.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentInfoResponse {
    /// Payment reference id.
    pub id: String,
    /// Payment hash.
    #[serde(default)]
    pub payment_hash: String,
    /// Payment status.
    pub status: SentStatus,
}

/// Payment status: a plain string on older nodes, `{ "type": ... }` on newer ones.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
pub enum SentStatus {
    /// `"PENDING"`, `"SUCCEEDED"`, `"FAILED"`
    Plain(String),
    /// `{ "type": "pending" | "sent" | "failed" }`
    Typed {
        /// Status tag.
        #[serde(rename = "type")]
        kind: String,
    },
}

impl SentStatus {
    /// Normalized state.
    pub fn state(&self) -> PaymentState {
        match self {
            Self::Plain(raw) | Self::Typed { kind: raw } => PaymentState::from_raw(raw),
        }
    }
}

/// One channel as returned by `channel` / `channels`.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResponse {
    /// Remote node public key.
    pub node_id: String,
    /// Channel id.
    #[serde(default)]
    pub channel_id: String,
    /// Raw channel state, e.g. `NORMAL`.
    pub state: String,
    /// Channel data; sparse while the channel is being negotiated.
    #[serde(default)]
    pub data: ChannelData,
}

/// Channel data.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelData {
    /// Commitment state.
    #[serde(default)]
    pub commitments: Commitments,
}

/// Commitment state of a channel.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Commitments {
    /// Channel flags bitmask; bit 0 marks an announced channel.
    #[serde(default)]
    pub channel_flags: u8,
    /// Local commitment.
    #[serde(default)]
    pub local_commit: LocalCommit,
    /// Funding input.
    #[serde(default)]
    pub commit_input: CommitInput,
}

/// Local commitment.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalCommit {
    /// Commitment spec.
    #[serde(default)]
    pub spec: CommitmentSpec,
}

/// Commitment balances.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitmentSpec {
    /// Our balance in msat.
    #[serde(default)]
    pub to_local_msat: u64,
}

/// Funding input of a channel.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitInput {
    /// `txid:index`
    #[serde(default)]
    pub out_point: String,
    /// Capacity in satoshis.
    #[serde(default)]
    pub amount_satoshis: u64,
}
