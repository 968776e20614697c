//! [`LightningClient`] over the Eclair dialect.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use super::api::{ChannelResponse, EclairApi, InvoiceResponse};
use crate::client::LightningClient;
use crate::collaborators::{Collaborators, InvoiceListener};
use crate::config::{EclairConfig, PollConfig};
use crate::models::{
    Channel, Invoice, InvoiceStatus, NodeInfo, NodeInformation, OpenChannelOutcome,
    OpenChannelRequest, OutPoint, PayOutcome,
};
use crate::open_channel::{classify_open_error, classify_open_response};
use crate::poller::{poll_payment, CancelToken, PollResult};
use crate::status;
use crate::{NodeBridgeError, Result};

/// BOLT11 expiry when the invoice does not state one.
const DEFAULT_EXPIRY_SECS: i64 = 3600;

/// Channel state of a channel in normal operation.
const NORMAL_STATE: &str = "NORMAL";

/// Eclair-backed client.
pub struct EclairClient {
    api: EclairApi,
    poll: PollConfig,
    collaborators: Collaborators,
}

impl EclairClient {
    /// Create a client from configuration.
    pub fn new(config: EclairConfig) -> Result<Self> {
        Ok(Self {
            api: EclairApi::new(&config)?,
            poll: config.poll,
            collaborators: Collaborators::default(),
        })
    }

    /// Attach wallet and event collaborators.
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Raw Eclair API.
    pub fn api(&self) -> &EclairApi {
        &self.api
    }
}

fn expires_at(invoice: &InvoiceResponse) -> Result<DateTime<Utc>> {
    let expiry = invoice.expiry.unwrap_or(DEFAULT_EXPIRY_SECS);
    DateTime::from_timestamp(invoice.timestamp.saturating_add(expiry), 0)
        .ok_or_else(|| NodeBridgeError::decode("invoice", "expiry out of range"))
}

/// Project an Eclair channel record.
pub(crate) fn to_channel(response: ChannelResponse) -> Channel {
    let commitments = response.data.commitments;
    let channel_point = OutPoint::parse(&commitments.commit_input.out_point);
    if channel_point.is_none() {
        tracing::debug!(
            "channel {} has no parseable outpoint: {:?}",
            response.channel_id,
            commitments.commit_input.out_point
        );
    }

    Channel {
        remote_node: response.node_id,
        local_balance_msat: commitments.local_commit.spec.to_local_msat,
        capacity_sat: commitments.commit_input.amount_satoshis,
        channel_point,
        is_active: response.state == NORMAL_STATE,
        is_public: commitments.channel_flags & 0x01 == 0x01,
    }
}

#[async_trait]
impl LightningClient for EclairClient {
    #[tracing::instrument(skip(self))]
    async fn get_info(&self) -> Result<NodeInformation> {
        let info = self.api.get_info().await?;
        let nodes = info
            .public_addresses
            .iter()
            .filter_map(|address| {
                let node = NodeInfo::from_address(info.node_id.clone(), address);
                if node.is_none() {
                    tracing::warn!("skipping malformed public address {:?}", address);
                }
                node
            })
            .collect();

        Ok(NodeInformation {
            nodes,
            block_height: info.block_height,
        })
    }

    #[tracing::instrument(skip(self, description))]
    async fn create_invoice(
        &self,
        amount_msat: u64,
        description: &str,
        expiry: Duration,
    ) -> Result<Invoice> {
        let response = self
            .api
            .create_invoice(description, amount_msat, expiry.as_secs())
            .await?;

        Ok(Invoice {
            expires_at: expires_at(&response)?,
            id: response.payment_hash,
            amount_msat,
            bolt11: response.serialized,
            status: InvoiceStatus::Unpaid,
            amount_received_msat: 0,
            paid_at: None,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn get_invoice(&self, invoice_id: &str) -> Result<Invoice> {
        let invoice = self.api.get_invoice(invoice_id).await?;
        let received = self.api.get_received_info(invoice_id).await;

        let paid_at = received
            .as_ref()
            .ok()
            .filter(|info| info.received_at != 0)
            .and_then(|info| DateTime::from_timestamp_millis(info.received_at));
        let received_msat =
            status::received_or_zero(received.map(|info| info.amount_msat), invoice_id);

        let minimum_msat = invoice.amount.unwrap_or(0);
        let expires_at = expires_at(&invoice)?;

        Ok(Invoice {
            id: invoice.payment_hash,
            amount_msat: minimum_msat,
            bolt11: invoice.serialized,
            expires_at,
            status: status::resolve(minimum_msat, received_msat, expires_at, Utc::now()),
            amount_received_msat: received_msat,
            paid_at,
        })
    }

    async fn listen(&self) -> Result<Box<dyn InvoiceListener>> {
        self.collaborators.listen().await
    }

    #[tracing::instrument(skip(self, bolt11, cancel))]
    async fn pay(&self, bolt11: &str, cancel: &CancelToken) -> Result<PollResult> {
        let reference = match self.api.pay_invoice(bolt11).await {
            Ok(reference) => reference,
            Err(err @ NodeBridgeError::Backend { .. }) => {
                tracing::warn!("payment rejected: {}", err);
                return Ok(PollResult::Settled(PayOutcome::CouldNotFindRoute));
            }
            Err(err) => return Err(err),
        };
        tracing::debug!("payment submitted as {}", reference);

        Ok(poll_payment(&self.api, &reference, &self.poll, cancel).await)
    }

    async fn get_deposit_address(&self) -> Result<String> {
        self.collaborators.deposit_address().await
    }

    #[tracing::instrument(skip(self, node), fields(node = %node))]
    async fn connect_to(&self, node: &NodeInfo) -> Result<()> {
        let result = self.api.connect(&node.node_id, &node.host, node.port).await?;
        tracing::debug!("connect: {}", result);
        Ok(())
    }

    #[tracing::instrument(skip(self, request), fields(node = %request.node.node_id, amount_sat = request.amount_sat))]
    async fn open_channel(&self, request: &OpenChannelRequest) -> Result<OpenChannelOutcome> {
        let opened = self
            .api
            .open(
                &request.node.node_id,
                request.amount_sat,
                request.fee_rate_sat_per_vb,
            )
            .await;

        match opened {
            Ok(message) => classify_open_response(&message, &self.api).await,
            Err(err) if err.is_connectivity() => Err(err),
            Err(err) => Ok(classify_open_error(&err.to_string())),
        }
    }

    #[tracing::instrument(skip(self))]
    async fn list_channels(&self) -> Result<Vec<Channel>> {
        let channels = self.api.channels().await?;
        Ok(channels.into_iter().map(to_channel).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel_json(state: &str, out_point: &str, flags: u8) -> ChannelResponse {
        serde_json::from_value(serde_json::json!({
            "nodeId": "02remote",
            "channelId": "abc123",
            "state": state,
            "data": {
                "commitments": {
                    "channelFlags": flags,
                    "localCommit": { "spec": { "toLocalMsat": 250000 } },
                    "commitInput": { "outPoint": out_point, "amountSatoshis": 1000000 }
                }
            }
        }))
        .unwrap()
    }

    #[test]
    fn test_channel_projection() {
        let channel = to_channel(channel_json("NORMAL", "abcd1234:0", 1));
        assert_eq!(channel.remote_node, "02remote");
        assert_eq!(channel.local_balance_msat, 250000);
        assert_eq!(channel.capacity_sat, 1000000);
        assert_eq!(
            channel.channel_point,
            Some(OutPoint {
                txid: "abcd1234".into(),
                vout: 0
            })
        );
        assert!(channel.is_active);
        assert!(channel.is_public);
    }

    #[test]
    fn test_private_inactive_channel_with_bad_outpoint() {
        let channel = to_channel(channel_json("OFFLINE", "garbage", 0));
        assert_eq!(channel.channel_point, None);
        assert!(!channel.is_active);
        assert!(!channel.is_public);
    }

    #[test]
    fn test_expiry_defaults_to_an_hour() {
        let invoice: InvoiceResponse = serde_json::from_value(serde_json::json!({
            "serialized": "lnbcrt1",
            "paymentHash": "hash",
            "timestamp": 1_700_000_000
        }))
        .unwrap();
        assert_eq!(expires_at(&invoice).unwrap().timestamp(), 1_700_003_600);
    }
}
