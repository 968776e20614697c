//! Ptarmigan REST API calls and wire types.
//!
//! Requests carry camelCase JSON bodies; every response is wrapped in a
//! `{ "result": ... }` envelope.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::PtarmiganConfig;
use crate::dispatch::{Auth, BodyEncoding, Dispatcher};
use crate::models::PaymentState;
use crate::poller::PaymentStatusSource;
use crate::retry::RetryPolicy;
use crate::{NodeBridgeError, Result};

/// Timestamp format of `creation_time`.
const CREATION_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One explicit function per Ptarmigan method.
#[derive(Clone, Debug)]
pub struct PtarmiganApi {
    dispatcher: Dispatcher,
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

impl PtarmiganApi {
    /// Create the API client from configuration.
    pub fn new(config: &PtarmiganConfig) -> Result<Self> {
        if config.api_token.is_empty() {
            return Err(NodeBridgeError::invalid_config(
                "api_token",
                "Ptarmigan API token cannot be empty",
            ));
        }
        let dispatcher = Dispatcher::new(
            &config.url,
            Auth::Bearer(config.api_token.clone()),
            BodyEncoding::Json,
            Duration::from_secs(config.timeout_secs),
            RetryPolicy::from(&config.retry),
        )?;
        Ok(Self { dispatcher })
    }

    /// Base URL of the REST server.
    pub fn base_url(&self) -> &str {
        self.dispatcher.base_url()
    }

    async fn call<Req, Resp>(&self, method: &str, payload: Option<&Req>) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let envelope: Envelope<Resp> = self.dispatcher.call(method, payload).await?;
        Ok(envelope.result)
    }

    /// `getinfo`
    pub async fn get_info(&self) -> Result<GetInfoResult> {
        self.call::<(), _>("getinfo", None).await
    }

    /// `createinvoice`
    pub async fn create_invoice(
        &self,
        amount_msat: u64,
        description: &str,
        invoice_expiry_secs: u64,
    ) -> Result<CreateInvoiceResult> {
        let request = CreateInvoiceRequest {
            amount_msat,
            description,
            invoice_expiry: invoice_expiry_secs,
        };
        self.call("createinvoice", Some(&request)).await
    }

    /// `listinvoices` filtered by payment hash.
    pub async fn list_invoice(&self, payment_hash: &str) -> Result<Vec<InvoiceRecord>> {
        let request = ListInvoiceRequest {
            payment_hash: Some(payment_hash),
        };
        self.call("listinvoices", Some(&request)).await
    }

    /// `listinvoices` without a filter.
    pub async fn list_all_invoices(&self) -> Result<Vec<InvoiceRecord>> {
        let request = ListInvoiceRequest { payment_hash: None };
        self.call("listinvoices", Some(&request)).await
    }

    /// Most recently created invoice, if any.
    ///
    /// Records with an unparseable creation time are ignored.
    pub async fn latest_invoice(&self) -> Result<Option<InvoiceRecord>> {
        let invoices = self.list_all_invoices().await?;
        Ok(invoices
            .into_iter()
            .filter_map(|invoice| invoice.created_at().ok().map(|at| (at, invoice)))
            .max_by_key(|(at, _)| *at)
            .map(|(_, invoice)| invoice))
    }

    /// `sendpayment`; returns the payment reference id.
    pub async fn send_payment(&self, bolt11: &str, add_amount_msat: u64) -> Result<SendPaymentResult> {
        let request = SendPaymentRequest {
            bolt11,
            add_amount_msat,
        };
        self.call("sendpayment", Some(&request)).await
    }

    /// `listpayment` for one payment id.
    pub async fn list_payment(&self, list_payment_id: i64) -> Result<Vec<PaymentRecord>> {
        let request = ListPaymentRequest { list_payment_id };
        self.call("listpayment", Some(&request)).await
    }

    /// `connect`
    pub async fn connect(&self, node_id: &str, peer_addr: &str, peer_port: u16) -> Result<serde_json::Value> {
        let request = ConnectRequest {
            peer_node_id: node_id,
            peer_addr,
            peer_port: Some(peer_port),
        };
        self.call("connect", Some(&request)).await
    }

    /// `openchannel`
    pub async fn open_channel(
        &self,
        node_id: &str,
        funding_sat: u64,
        push_msat: u64,
        feerate_per_kw: u64,
    ) -> Result<serde_json::Value> {
        let request = OpenRequest {
            peer_node_id: node_id,
            funding_sat,
            push_msat,
            feerate_per_kw,
        };
        self.call("openchannel", Some(&request)).await
    }
}

#[async_trait]
impl PaymentStatusSource for PtarmiganApi {
    async fn payment_state(&self, reference: &str) -> Result<Option<PaymentState>> {
        let id = reference
            .parse::<i64>()
            .map_err(|e| NodeBridgeError::decode("payment id", e))?;
        let records = self.list_payment(id).await?;
        Ok(records
            .iter()
            .find(|record| record.payment_id == id)
            .map(|record| PaymentState::from_raw(&record.state)))
    }
}

// Requests

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CreateInvoiceRequest<'a> {
    amount_msat: u64,
    description: &'a str,
    invoice_expiry: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListInvoiceRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    payment_hash: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendPaymentRequest<'a> {
    bolt11: &'a str,
    add_amount_msat: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ListPaymentRequest {
    list_payment_id: i64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ConnectRequest<'a> {
    peer_node_id: &'a str,
    peer_addr: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    peer_port: Option<u16>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OpenRequest<'a> {
    peer_node_id: &'a str,
    funding_sat: u64,
    push_msat: u64,
    feerate_per_kw: u64,
}

// Responses

/// `getinfo` result.
#[derive(Clone, Debug, Deserialize)]
pub struct GetInfoResult {
    /// Node public key.
    pub node_id: String,
    /// Peer port.
    pub node_port: u16,
    /// Current block height.
    #[serde(default)]
    pub block_count: u64,
    /// Our total balance across channels.
    #[serde(default)]
    pub total_local_msat: u64,
}

/// `createinvoice` result.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateInvoiceResult {
    /// Payment hash.
    pub hash: String,
    /// BOLT11 string; some server versions omit it.
    #[serde(default)]
    pub bolt11: String,
}

/// One `listinvoices` record.
#[derive(Clone, Debug, Deserialize)]
pub struct InvoiceRecord {
    /// Payment hash.
    pub hash: String,
    /// Requested amount in msat.
    #[serde(default)]
    pub amount_msat: u64,
    /// BOLT11 string.
    #[serde(default)]
    pub bolt11: String,
    /// `unused`, `used` or `expired`.
    #[serde(default)]
    pub state: String,
    /// `yyyy-MM-ddTHH:mm:ssZ`
    pub creation_time: String,
    /// Seconds from creation until expiry.
    #[serde(default = "default_invoice_expiry")]
    pub expiry: i64,
}

fn default_invoice_expiry() -> i64 {
    3600
}

impl InvoiceRecord {
    /// Parsed creation time.
    pub fn created_at(&self) -> Result<DateTime<Utc>> {
        NaiveDateTime::parse_from_str(&self.creation_time, CREATION_TIME_FORMAT)
            .map(|naive| naive.and_utc())
            .map_err(|e| NodeBridgeError::decode("creation_time", e))
    }

    /// Creation time plus expiry.
    pub fn expires_at(&self) -> Result<DateTime<Utc>> {
        let created_at = self.created_at()?;
        chrono::Duration::try_seconds(self.expiry)
            .and_then(|expiry| created_at.checked_add_signed(expiry))
            .ok_or_else(|| NodeBridgeError::decode("invoice", "expiry out of range"))
    }

    /// Ptarmigan marks a paid invoice as `used`.
    pub fn is_used(&self) -> bool {
        self.state.eq_ignore_ascii_case("used")
    }
}

/// `sendpayment` result.
#[derive(Clone, Debug, Deserialize)]
pub struct SendPaymentResult {
    /// Payment id to poll with `listpayment`.
    pub payment_id: i64,
}

/// One `listpayment` record.
#[derive(Clone, Debug, Deserialize)]
pub struct PaymentRecord {
    /// Payment id.
    pub payment_id: i64,
    /// Payment hash.
    #[serde(default)]
    pub payment_hash: String,
    /// `processing`, `succeeded` or `failed`.
    pub state: String,
}
