//! Invoice status resolution.
//!
//! Status is never stored: every lookup derives it from the amounts and
//! expiry the backend reports at that moment.

use chrono::{DateTime, Utc};

use crate::models::InvoiceStatus;
use crate::Result;

/// Derive an invoice's status. First match wins: paid, then expired.
pub fn resolve(
    minimum_msat: u64,
    received_msat: u64,
    expires_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> InvoiceStatus {
    if received_msat >= minimum_msat {
        InvoiceStatus::Paid
    } else if now >= expires_at {
        InvoiceStatus::Expired
    } else {
        InvoiceStatus::Unpaid
    }
}

/// Amount received, or zero when the backend could not say.
///
/// An unknown amount means "not yet paid"; the failure is logged, not raised.
pub fn received_or_zero(lookup: Result<u64>, invoice_id: &str) -> u64 {
    match lookup {
        Ok(amount) => amount,
        Err(err) => {
            tracing::debug!("no received info for invoice {}: {}", invoice_id, err);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NodeBridgeError;
    use chrono::Duration;

    fn times() -> (DateTime<Utc>, DateTime<Utc>) {
        let now = Utc::now();
        (now, now + Duration::seconds(600))
    }

    #[test]
    fn test_paid_when_received_covers_minimum() {
        let (now, expiry) = times();
        assert_eq!(resolve(1000, 1000, expiry, now), InvoiceStatus::Paid);
        assert_eq!(resolve(1000, 1500, expiry, now), InvoiceStatus::Paid);
    }

    #[test]
    fn test_paid_wins_over_expired() {
        let (now, _) = times();
        let past = now - Duration::seconds(1);
        assert_eq!(resolve(1000, 1000, past, now), InvoiceStatus::Paid);
    }

    #[test]
    fn test_expired_at_boundary() {
        let (now, _) = times();
        assert_eq!(resolve(1000, 999, now, now), InvoiceStatus::Expired);
    }

    #[test]
    fn test_unpaid_before_expiry() {
        let (now, expiry) = times();
        assert_eq!(resolve(1000, 0, expiry, now), InvoiceStatus::Unpaid);
    }

    #[test]
    fn test_zero_amount_invoice_is_paid() {
        let (now, expiry) = times();
        assert_eq!(resolve(0, 0, expiry, now), InvoiceStatus::Paid);
    }

    #[test]
    fn test_failed_lookup_counts_as_zero() {
        let (now, expiry) = times();
        let failed: Result<u64> = Err(NodeBridgeError::Backend {
            status: 404,
            message: "not found".into(),
        });
        let received = received_or_zero(failed, "hash");
        assert_eq!(received, 0);
        assert_eq!(resolve(1000, received, expiry, now), InvoiceStatus::Unpaid);
    }
}
