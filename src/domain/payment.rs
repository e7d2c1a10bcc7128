use super::parcel::Parcel;
use crate::error::MarketplaceError;
use chrono::{DateTime, NaiveDate, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

const TRACKING_PREFIX: &str = "PRCL";

/// Human-facing parcel code issued once a payment is confirmed.
///
/// Format: `PRCL-<YYYYMMDD>-<6 uppercase hex chars>`, e.g. `PRCL-20250614-3FA09C`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TrackingId(String);

impl TrackingId {
    /// Generates an identifier for today's UTC date using the OS random source.
    pub fn generate() -> Self {
        Self::generate_with(Utc::now(), &mut OsRng)
    }

    pub fn generate_with<R: RngCore>(now: DateTime<Utc>, rng: &mut R) -> Self {
        let mut suffix = [0u8; 3];
        rng.fill_bytes(&mut suffix);
        let suffix: String = suffix.iter().map(|b| format!("{:02X}", b)).collect();
        Self(format!(
            "{}-{}-{}",
            TRACKING_PREFIX,
            now.format("%Y%m%d"),
            suffix
        ))
    }

    /// Validates a tracking identifier string.
    pub fn parse(value: &str) -> Result<Self, MarketplaceError> {
        let invalid = || MarketplaceError::ValidationError(format!("Invalid tracking id: {value}"));

        let mut parts = value.split('-');
        let (Some(prefix), Some(date), Some(suffix), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        if prefix != TRACKING_PREFIX
            || date.len() != 8
            || !date.bytes().all(|b| b.is_ascii_digit())
            || NaiveDate::parse_from_str(date, "%Y%m%d").is_err()
            || suffix.len() != 6
            || !suffix
                .bytes()
                .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(&b))
        {
            return Err(invalid());
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TrackingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TrackingId {
    type Error = MarketplaceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<TrackingId> for String {
    fn from(id: TrackingId) -> Self {
        id.0
    }
}

/// Payment status reported by the gateway for a checkout session.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum SessionPaymentStatus {
    Paid,
    Unpaid,
    NoPaymentRequired,
}

impl fmt::Display for SessionPaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SessionPaymentStatus::Paid => "paid",
            SessionPaymentStatus::Unpaid => "unpaid",
            SessionPaymentStatus::NoPaymentRequired => "no_payment_required",
        })
    }
}

/// Metadata embedded in a checkout session so confirmation can find the parcel.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct SessionMetadata {
    #[serde(default)]
    pub parcel_id: Option<String>,
    #[serde(default)]
    pub parcel_name: Option<String>,
}

/// A gateway-hosted checkout session.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
    pub payment_status: SessionPaymentStatus,
    pub payment_intent: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub customer_email: Option<String>,
    #[serde(default)]
    pub metadata: SessionMetadata,
}

/// Parameters for creating a hosted checkout session.
#[derive(Debug, Serialize, PartialEq, Clone)]
pub struct CheckoutRequest {
    pub line_item_name: String,
    pub unit_amount: i64,
    pub currency: String,
    pub customer_email: String,
    pub metadata: SessionMetadata,
    pub success_url: String,
    pub cancel_url: String,
}

/// The two checkout flavours offered to senders.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "lowercase")]
pub enum CheckoutVariant {
    /// Line item named after the parcel; metadata carries only the parcel id.
    Basic,
    /// Success URL carries the session id back, metadata also carries the parcel name.
    #[default]
    Tracked,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLink {
    pub session_id: String,
    pub url: Option<String>,
}

/// A confirmed payment. Exactly one exists per gateway payment reference.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub transition_id: String,
    /// Amount in minor currency units.
    pub amount: i64,
    pub currency: String,
    pub customer_email: String,
    pub parcel_id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parcel_name: Option<String>,
    pub payment_status: SessionPaymentStatus,
    pub tracking_id: TrackingId,
    pub paid_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum ConfirmationOutcome {
    Confirmed,
    AlreadyConfirmed,
}

/// Result of the payment confirmation workflow.
#[derive(Debug, Serialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct PaymentConfirmation {
    pub outcome: ConfirmationOutcome,
    pub tracking_id: TrackingId,
    pub transition_id: String,
    pub parcel: Option<Parcel>,
    pub payment: PaymentRecord,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::mock::StepRng;

    #[test]
    fn test_generated_tracking_id_format() {
        for _ in 0..100 {
            let id = TrackingId::generate();
            assert!(TrackingId::parse(id.as_str()).is_ok(), "bad id: {id}");
        }
    }

    #[test]
    fn test_tracking_id_uses_utc_date() {
        let now = Utc.with_ymd_and_hms(2025, 6, 14, 23, 59, 0).unwrap();
        let mut rng = StepRng::new(0xAB, 0);
        let id = TrackingId::generate_with(now, &mut rng);
        assert!(id.as_str().starts_with("PRCL-20250614-"));
        assert_eq!(id.as_str().len(), "PRCL-20250614-".len() + 6);
        assert!(id.as_str().ends_with("AB0000"));
    }

    #[test]
    fn test_tracking_id_parse_rejects_bad_input() {
        for bad in [
            "PRCL-20250614-abc123",
            "PRCL-20250614-ABC12",
            "PRCL-2025061-ABC123",
            "PRCL-20251340-ABC123",
            "TRCK-20250614-ABC123",
            "PRCL-20250614-ABC123-X",
            "",
        ] {
            assert!(TrackingId::parse(bad).is_err(), "accepted {bad}");
        }
        assert!(TrackingId::parse("PRCL-20250614-0F9A3C").is_ok());
    }

    #[test]
    fn test_session_status_wire_names() {
        let status: SessionPaymentStatus =
            serde_json::from_str("\"no_payment_required\"").unwrap();
        assert_eq!(status, SessionPaymentStatus::NoPaymentRequired);
        assert_eq!(status.to_string(), "no_payment_required");
    }
}
