//! Eclair backend dialect.
//!
//! Eclair exposes `POST /{method}` endpoints authenticated with HTTP basic
//! auth (empty user, API password). Payments are asynchronous: `payinvoice`
//! returns a reference id that `getsentinfo` resolves later.

mod api;
mod client;

pub use api::{
    ChannelData, ChannelResponse, CommitInput, CommitmentSpec, Commitments, EclairApi,
    GetInfoResponse, InvoiceResponse, LocalCommit, ReceivedInfoResponse, SentInfoResponse,
    SentStatus,
};
pub use client::EclairClient;
