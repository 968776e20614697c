//! [`LightningClient`] over the Ptarmigan dialect.

use async_trait::async_trait;
use chrono::Utc;
use std::time::Duration;

use super::api::{InvoiceRecord, PtarmiganApi};
use crate::client::LightningClient;
use crate::collaborators::{Collaborators, InvoiceListener};
use crate::config::{PollConfig, PtarmiganConfig};
use crate::models::{
    Channel, Invoice, NodeInfo, NodeInformation, OpenChannelOutcome, OpenChannelRequest,
    PayOutcome,
};
use crate::open_channel::classify_open_error;
use crate::poller::{poll_payment, CancelToken, PollResult};
use crate::status;
use crate::{NodeBridgeError, Result};

/// Weight units per virtual byte.
const WEIGHT_PER_VBYTE: u64 = 4;

/// Convert sat/vB to sat/kw (1 kw = 1000 weight units = 250 vB).
pub fn sat_per_vb_to_per_kw(sat_per_vb: u64) -> u64 {
    sat_per_vb.saturating_mul(1000 / WEIGHT_PER_VBYTE)
}

/// Ptarmigan-backed client.
pub struct PtarmiganClient {
    api: PtarmiganApi,
    poll: PollConfig,
    collaborators: Collaborators,
}

impl PtarmiganClient {
    /// Create a client from configuration.
    pub fn new(config: PtarmiganConfig) -> Result<Self> {
        Ok(Self {
            api: PtarmiganApi::new(&config)?,
            poll: config.poll,
            collaborators: Collaborators::default(),
        })
    }

    /// Attach wallet and event collaborators.
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    /// Raw Ptarmigan API.
    pub fn api(&self) -> &PtarmiganApi {
        &self.api
    }

    /// Host part of the configured base URL.
    fn host(&self) -> Result<String> {
        let url = reqwest::Url::parse(self.api.base_url())
            .map_err(|e| NodeBridgeError::invalid_config("url", e.to_string()))?;
        url.host_str()
            .map(|host| host.trim_start_matches('[').trim_end_matches(']').to_string())
            .ok_or_else(|| NodeBridgeError::invalid_config("url", "URL has no host"))
    }
}

fn to_invoice(record: InvoiceRecord) -> Result<Invoice> {
    let expires_at = record.expires_at()?;
    let received_msat = if record.is_used() {
        record.amount_msat
    } else {
        0
    };

    Ok(Invoice {
        status: status::resolve(record.amount_msat, received_msat, expires_at, Utc::now()),
        id: record.hash,
        amount_msat: record.amount_msat,
        bolt11: record.bolt11,
        expires_at,
        amount_received_msat: received_msat,
        paid_at: None,
    })
}

#[async_trait]
impl LightningClient for PtarmiganClient {
    #[tracing::instrument(skip(self))]
    async fn get_info(&self) -> Result<NodeInformation> {
        let info = self.api.get_info().await?;
        Ok(NodeInformation {
            nodes: vec![NodeInfo::new(info.node_id, self.host()?, info.node_port)],
            block_height: info.block_count,
        })
    }

    #[tracing::instrument(skip(self, description))]
    async fn create_invoice(
        &self,
        amount_msat: u64,
        description: &str,
        expiry: Duration,
    ) -> Result<Invoice> {
        let created = self
            .api
            .create_invoice(amount_msat, description, expiry.as_secs())
            .await?;

        let mut records = self.api.list_invoice(&created.hash).await?;
        let record = match records.iter().position(|record| record.hash == created.hash) {
            Some(index) => records.swap_remove(index),
            None => {
                tracing::debug!("invoice {} not listed by hash, using latest", created.hash);
                self.api
                    .latest_invoice()
                    .await?
                    .ok_or_else(|| NodeBridgeError::not_found("invoice", created.hash.clone()))?
            }
        };

        let mut invoice = to_invoice(record)?;
        if !created.bolt11.is_empty() {
            invoice.bolt11 = created.bolt11;
        }
        Ok(invoice)
    }

    #[tracing::instrument(skip(self))]
    async fn get_invoice(&self, invoice_id: &str) -> Result<Invoice> {
        let records = self.api.list_invoice(invoice_id).await?;
        let record = records
            .into_iter()
            .find(|record| record.hash == invoice_id)
            .ok_or_else(|| NodeBridgeError::not_found("invoice", invoice_id))?;
        to_invoice(record)
    }

    async fn listen(&self) -> Result<Box<dyn InvoiceListener>> {
        self.collaborators.listen().await
    }

    #[tracing::instrument(skip(self, bolt11, cancel))]
    async fn pay(&self, bolt11: &str, cancel: &CancelToken) -> Result<PollResult> {
        let reference = match self.api.send_payment(bolt11, 0).await {
            Ok(sent) => sent.payment_id.to_string(),
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
            .open_channel(
                &request.node.node_id,
                request.amount_sat,
                0,
                sat_per_vb_to_per_kw(request.fee_rate_sat_per_vb),
            )
            .await;

        match opened {
            Ok(result) => {
                tracing::debug!("openchannel: {}", result);
                Ok(OpenChannelOutcome::Ok)
            }
            Err(err) if err.is_connectivity() => Err(err),
            Err(err) => Ok(classify_open_error(&err.to_string())),
        }
    }

    async fn list_channels(&self) -> Result<Vec<Channel>> {
        Err(NodeBridgeError::NotSupported(
            "channel listing on Ptarmigan".to_string(),
        ))
    }
}
