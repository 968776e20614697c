//! NodeBridge library.
//!
//! One client surface over Lightning nodes that speak different REST
//! dialects (Eclair and Ptarmigan). Callers create and look up invoices, pay
//! BOLT11 invoices, connect to peers, open channels and list channels
//! without knowing which node implementation sits behind the URL.
//!
//! # Example
//!
//! ```ignore
//! use nodebridge_lib::prelude::*;
//!
//! let client = build_client(BackendConfig::Eclair(EclairConfig::new(
//!     "http://localhost:8080",
//!     "password",
//! )))?;
//!
//! let invoice = client
//!     .create_invoice(50_000, "coffee", std::time::Duration::from_secs(600))
//!     .await?;
//! let outcome = client.pay(&invoice.bolt11, &CancelToken::never()).await?;
//! ```

pub mod classify;
pub mod client;
pub mod collaborators;
pub mod config;
pub mod dispatch;
pub mod eclair;
pub mod env;
pub mod errors;
pub mod models;
pub mod open_channel;
pub mod poller;
pub mod prelude;
pub mod ptarmigan;
pub mod retry;
pub mod status;

pub use client::{build_client, LightningClient};
pub use errors::{NodeBridgeError, NodeBridgeErrorCode};
pub use models::{
    Channel, Invoice, InvoiceStatus, NodeInfo, NodeInformation, OpenChannelOutcome,
    OpenChannelRequest, OutPoint, PayOutcome, PaymentState,
};
pub use poller::{CancelHandle, CancelToken, PollResult};

/// Common result alias for NodeBridge operations.
pub type Result<T> = std::result::Result<T, NodeBridgeError>;
