//! Ptarmigan backend dialect.
//!
//! Ptarmigan's REST wrapper exposes `POST /{method}` endpoints with JSON
//! bodies and bearer-token auth. Payments are polled through `listpayment`
//! using the numeric id returned by `sendpayment`.

mod api;
mod client;

pub use api::{
    CreateInvoiceResult, GetInfoResult, InvoiceRecord, PaymentRecord, PtarmiganApi,
    SendPaymentResult,
};
pub use client::{sat_per_vb_to_per_kw, PtarmiganClient};
