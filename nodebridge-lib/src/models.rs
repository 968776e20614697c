//! Canonical domain model shared by every backend dialect.
//!
//! Backends report loosely-typed records; the dialect clients project them
//! into these types so callers never see dialect-specific shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network identity of a Lightning node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Hex-encoded node public key.
    pub node_id: String,
    /// Host name or IP address.
    pub host: String,
    /// Peer port.
    pub port: u16,
}

impl NodeInfo {
    /// Create a node info from its parts.
    pub fn new(node_id: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            node_id: node_id.into(),
            host: host.into(),
            port,
        }
    }

    /// Build from a `host:port` public address string.
    ///
    /// Bracketed IPv6 hosts (`[::1]:9735`) are unwrapped. Returns `None`
    /// when the address has no port or the port is not a number.
    pub fn from_address(node_id: impl Into<String>, address: &str) -> Option<Self> {
        let (host, port) = address.rsplit_once(':')?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return None;
        }
        let port = port.parse::<u16>().ok()?;
        Some(Self::new(node_id, host, port))
    }
}

impl fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}:{}", self.node_id, self.host, self.port)
    }
}

/// Node identity plus chain position.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInformation {
    /// Every reachable address the node advertises.
    pub nodes: Vec<NodeInfo>,
    /// Current block height seen by the node.
    pub block_height: u64,
}

/// Lifecycle state of an invoice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvoiceStatus {
    /// Awaiting payment.
    Unpaid,
    /// Received at least the requested amount.
    Paid,
    /// Expiry passed before payment.
    Expired,
}

/// A Lightning invoice as seen at lookup time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    /// Payment hash.
    pub id: String,
    /// Minimum payable amount in millisatoshis.
    pub amount_msat: u64,
    /// Encoded BOLT11 payment request.
    pub bolt11: String,
    /// When the invoice stops being payable.
    pub expires_at: DateTime<Utc>,
    /// Status computed from the other fields at lookup time.
    pub status: InvoiceStatus,
    /// Amount received so far in millisatoshis (0 when unknown).
    pub amount_received_msat: u64,
    /// When the payment arrived, if known.
    pub paid_at: Option<DateTime<Utc>>,
}

/// Reference to a transaction output funding a channel.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    /// Funding transaction id (hex).
    pub txid: String,
    /// Output index.
    pub vout: u32,
}

impl OutPoint {
    /// Parse a `txid:index` string.
    ///
    /// Returns `None` for anything malformed: missing separator, empty or
    /// non-hex txid, non-numeric index.
    pub fn parse(raw: &str) -> Option<Self> {
        let (txid, vout) = raw.trim().split_once(':')?;
        if txid.is_empty() || !txid.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        let vout = vout.parse::<u32>().ok()?;
        Some(Self {
            txid: txid.to_string(),
            vout,
        })
    }
}

impl fmt::Display for OutPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.txid, self.vout)
    }
}

/// Snapshot of one channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    /// Remote node public key.
    pub remote_node: String,
    /// Our balance in millisatoshis.
    pub local_balance_msat: u64,
    /// Total channel capacity in satoshis.
    pub capacity_sat: u64,
    /// Funding outpoint, absent when the backend value was malformed.
    pub channel_point: Option<OutPoint>,
    /// Channel is in normal operation.
    pub is_active: bool,
    /// Channel is announced to the network.
    pub is_public: bool,
}

/// Terminal outcome of a payment attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayOutcome {
    /// Payment settled.
    Ok,
    /// Payment definitively failed.
    CouldNotFindRoute,
}

/// Terminal outcome of an open-channel attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OpenChannelOutcome {
    /// Channel opened.
    Ok,
    /// Funding published, waiting for confirmations.
    NeedMoreConfirmations,
    /// Wallet cannot fund the channel.
    CannotAffordFunding,
    /// No live connection to the peer.
    PeerNotConnected,
    /// A channel with this peer already exists.
    AlreadyExists,
}

/// Normalized status of one payment record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentState {
    /// Still in flight.
    Pending,
    /// Settled.
    Succeeded,
    /// Failed.
    Failed,
    /// State string this crate does not recognize.
    Unknown(String),
}

impl PaymentState {
    /// Normalize a raw state string from any dialect.
    pub fn from_raw(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "pending" | "processing" | "in_flight" | "inflight" => Self::Pending,
            "succeeded" | "sent" | "success" => Self::Succeeded,
            "failed" | "failure" => Self::Failed,
            _ => Self::Unknown(raw.to_string()),
        }
    }
}

/// Parameters for opening a channel.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenChannelRequest {
    /// Peer to open the channel with.
    pub node: NodeInfo,
    /// Funding amount in satoshis.
    pub amount_sat: u64,
    /// Funding fee rate in sat/vB.
    pub fee_rate_sat_per_vb: u64,
}
