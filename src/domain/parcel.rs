use super::payment::TrackingId;
use crate::error::MarketplaceError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shipping cost of a parcel in major currency units.
///
/// Always strictly positive. Converted to minor units (cents) only when a
/// checkout session is requested.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Cost(Decimal);

impl Cost {
    pub fn new(value: Decimal) -> Result<Self, MarketplaceError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(MarketplaceError::ValidationError(
                "Cost must be positive".to_string(),
            ))
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Cost in minor units, rounded to the nearest unit.
    pub fn minor_units(&self) -> Result<i64, MarketplaceError> {
        (self.0 * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .ok_or_else(|| MarketplaceError::ValidationError("Cost is out of range".to_string()))
    }
}

impl TryFrom<Decimal> for Cost {
    type Error = MarketplaceError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Cost> for Decimal {
    fn from(cost: Cost) -> Self {
        cost.0
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    PendingPayment,
    PendingPickup,
    RiderAssigned,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Unpaid,
    Paid,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Parcel {
    pub id: Uuid,
    pub parcel_name: String,
    pub cost: Cost,
    pub sender_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender_district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_district: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub receiver_address: Option<String>,
    pub delivery_status: DeliveryStatus,
    pub payment_status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rider_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rider_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rider_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tracking_id: Option<TrackingId>,
    pub created_at: DateTime<Utc>,
}

/// Parcel submission payload.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewParcel {
    pub parcel_name: String,
    pub cost: Cost,
    pub sender_email: String,
    #[serde(default)]
    pub sender_name: Option<String>,
    #[serde(default)]
    pub sender_district: Option<String>,
    #[serde(default)]
    pub receiver_name: Option<String>,
    #[serde(default)]
    pub receiver_district: Option<String>,
    #[serde(default)]
    pub receiver_address: Option<String>,
}

/// Rider details written onto a parcel on assignment.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RiderAssignment {
    pub rider_id: Uuid,
    pub rider_name: String,
    pub rider_email: String,
}

/// Filters for parcel listing. Absent fields match anything.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Default)]
#[serde(rename_all = "camelCase")]
pub struct ParcelQuery {
    #[serde(default)]
    pub sender_email: Option<String>,
    #[serde(default)]
    pub delivery_status: Option<DeliveryStatus>,
}

impl ParcelQuery {
    pub fn matches(&self, parcel: &Parcel) -> bool {
        self.sender_email
            .as_deref()
            .is_none_or(|email| parcel.sender_email.eq_ignore_ascii_case(email))
            && self
                .delivery_status
                .is_none_or(|status| parcel.delivery_status == status)
    }
}

impl Parcel {
    pub fn create(new_parcel: NewParcel) -> Self {
        Self {
            id: Uuid::new_v4(),
            parcel_name: new_parcel.parcel_name,
            cost: new_parcel.cost,
            sender_email: new_parcel.sender_email,
            sender_name: new_parcel.sender_name,
            sender_district: new_parcel.sender_district,
            receiver_name: new_parcel.receiver_name,
            receiver_district: new_parcel.receiver_district,
            receiver_address: new_parcel.receiver_address,
            delivery_status: DeliveryStatus::PendingPayment,
            payment_status: PaymentStatus::Unpaid,
            rider_id: None,
            rider_name: None,
            rider_email: None,
            tracking_id: None,
            created_at: Utc::now(),
        }
    }

    /// Stamps the parcel as paid. A parcel awaiting payment becomes ready for
    /// pickup; later delivery states are kept.
    pub fn mark_paid(&mut self, tracking_id: TrackingId) {
        self.payment_status = PaymentStatus::Paid;
        if self.delivery_status == DeliveryStatus::PendingPayment {
            self.delivery_status = DeliveryStatus::PendingPickup;
        }
        self.tracking_id = Some(tracking_id);
    }

    pub fn assign(&mut self, assignment: RiderAssignment) {
        self.rider_id = Some(assignment.rider_id);
        self.rider_name = Some(assignment.rider_name);
        self.rider_email = Some(assignment.rider_email);
        self.delivery_status = DeliveryStatus::RiderAssigned;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn new_parcel(cost: Decimal) -> NewParcel {
        NewParcel {
            parcel_name: "Books".to_string(),
            cost: Cost::new(cost).unwrap(),
            sender_email: "a@x.com".to_string(),
            sender_name: None,
            sender_district: None,
            receiver_name: None,
            receiver_district: None,
            receiver_address: None,
        }
    }

    #[test]
    fn test_cost_validation() {
        assert!(Cost::new(dec!(1.0)).is_ok());
        assert!(matches!(
            Cost::new(dec!(0.0)),
            Err(MarketplaceError::ValidationError(_))
        ));
        assert!(matches!(
            Cost::new(dec!(-1.0)),
            Err(MarketplaceError::ValidationError(_))
        ));
    }

    #[test]
    fn test_cost_minor_units() {
        assert_eq!(Cost::new(dec!(20)).unwrap().minor_units().unwrap(), 2000);
        assert_eq!(Cost::new(dec!(12.345)).unwrap().minor_units().unwrap(), 1234);
        assert_eq!(Cost::new(dec!(0.5)).unwrap().minor_units().unwrap(), 50);
    }

    #[test]
    fn test_cost_rejects_non_positive_json() {
        assert!(serde_json::from_str::<Cost>("20").is_ok());
        assert!(serde_json::from_str::<Cost>("0").is_err());
    }

    #[test]
    fn test_new_parcel_awaits_payment() {
        let parcel = Parcel::create(new_parcel(dec!(20)));
        assert_eq!(parcel.delivery_status, DeliveryStatus::PendingPayment);
        assert_eq!(parcel.payment_status, PaymentStatus::Unpaid);
        assert!(parcel.tracking_id.is_none());
    }

    #[test]
    fn test_mark_paid() {
        let mut parcel = Parcel::create(new_parcel(dec!(20)));
        let tracking_id = TrackingId::parse("PRCL-20250101-ABC123").unwrap();
        parcel.mark_paid(tracking_id.clone());
        assert_eq!(parcel.payment_status, PaymentStatus::Paid);
        assert_eq!(parcel.delivery_status, DeliveryStatus::PendingPickup);
        assert_eq!(parcel.tracking_id, Some(tracking_id));
    }

    #[test]
    fn test_mark_paid_keeps_assigned_rider() {
        let mut parcel = Parcel::create(new_parcel(dec!(20)));
        parcel.assign(RiderAssignment {
            rider_id: Uuid::new_v4(),
            rider_name: "Rita".to_string(),
            rider_email: "r@x.com".to_string(),
        });
        parcel.mark_paid(TrackingId::parse("PRCL-20250101-ABC123").unwrap());
        assert_eq!(parcel.delivery_status, DeliveryStatus::RiderAssigned);
        assert_eq!(parcel.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn test_assign_rider() {
        let mut parcel = Parcel::create(new_parcel(dec!(20)));
        let rider_id = Uuid::new_v4();
        parcel.assign(RiderAssignment {
            rider_id,
            rider_name: "Rita".to_string(),
            rider_email: "r@x.com".to_string(),
        });
        assert_eq!(parcel.delivery_status, DeliveryStatus::RiderAssigned);
        assert_eq!(parcel.rider_id, Some(rider_id));
    }
}
