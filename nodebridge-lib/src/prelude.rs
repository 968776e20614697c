//! Prelude module for convenient imports.
//!
//! ```rust,ignore
//! use nodebridge_lib::prelude::*;
//! ```

// Client surface
pub use crate::client::{build_client, LightningClient};
pub use crate::eclair::EclairClient;
pub use crate::ptarmigan::PtarmiganClient;

// Configuration
pub use crate::config::{
    BackendConfig, BitcoindConfig, EclairConfig, PollConfig, PtarmiganConfig, RetryConfig,
};
pub use crate::env::backend_config_from_env;

// Error handling
pub use crate::errors::{NodeBridgeError, NodeBridgeErrorCode};
pub use crate::Result;

// Domain types
pub use crate::models::{
    Channel, Invoice, InvoiceStatus, NodeInfo, NodeInformation, OpenChannelOutcome,
    OpenChannelRequest, OutPoint, PayOutcome,
};

// Payments and collaborators
pub use crate::collaborators::{Collaborators, InvoiceEvents, InvoiceListener, WalletRpc};
pub use crate::poller::{CancelHandle, CancelToken, PollResult};
