use crate::domain::payment::PaymentRecord;
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

const HEADER: [&str; 9] = [
    "transition_id",
    "tracking_id",
    "parcel_id",
    "parcel_name",
    "customer_email",
    "amount",
    "currency",
    "payment_status",
    "paid_at",
];

/// Flat CSV row for a payment record.
#[derive(Serialize)]
struct PaymentRow<'a> {
    transition_id: &'a str,
    tracking_id: &'a str,
    parcel_id: String,
    parcel_name: &'a str,
    customer_email: &'a str,
    amount: i64,
    currency: &'a str,
    payment_status: String,
    paid_at: String,
}

impl<'a> From<&'a PaymentRecord> for PaymentRow<'a> {
    fn from(record: &'a PaymentRecord) -> Self {
        Self {
            transition_id: &record.transition_id,
            tracking_id: record.tracking_id.as_str(),
            parcel_id: record.parcel_id.to_string(),
            parcel_name: record.parcel_name.as_deref().unwrap_or_default(),
            customer_email: &record.customer_email,
            amount: record.amount,
            currency: &record.currency,
            payment_status: record.payment_status.to_string(),
            paid_at: record.paid_at.to_rfc3339(),
        }
    }
}

/// Writes payment history as CSV. The header row is written even when there
/// are no payments.
pub struct PaymentWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> PaymentWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(sink),
        }
    }

    pub fn write_payments<'a, I>(&mut self, payments: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a PaymentRecord>,
    {
        self.writer.write_record(HEADER)?;
        for payment in payments {
            self.writer.serialize(PaymentRow::from(payment))?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::{SessionPaymentStatus, TrackingId};
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    #[test]
    fn test_writes_header_and_rows() {
        let parcel_id = Uuid::new_v4();
        let record = PaymentRecord {
            transition_id: "pi_1".to_string(),
            amount: 2000,
            currency: "usd".to_string(),
            customer_email: "a@x.com".to_string(),
            parcel_id,
            parcel_name: None,
            payment_status: SessionPaymentStatus::Paid,
            tracking_id: TrackingId::parse("PRCL-20250614-0F9A3C").unwrap(),
            paid_at: Utc.with_ymd_and_hms(2025, 6, 14, 10, 0, 0).unwrap(),
        };

        let mut out = Vec::new();
        PaymentWriter::new(&mut out)
            .write_payments(&[record])
            .unwrap();
        let text = String::from_utf8(out).unwrap();

        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("transition_id,tracking_id,parcel_id,parcel_name,customer_email,amount,currency,payment_status,paid_at")
        );
        assert_eq!(
            lines.next().unwrap(),
            format!("pi_1,PRCL-20250614-0F9A3C,{parcel_id},,a@x.com,2000,usd,paid,2025-06-14T10:00:00+00:00")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_writes_header_without_rows() {
        let mut out = Vec::new();
        PaymentWriter::new(&mut out)
            .write_payments(&Vec::<PaymentRecord>::new())
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("{}\n", HEADER.join(","))
        );
    }
}
