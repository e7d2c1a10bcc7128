//! Payment confirmation: reconciles a finished checkout session with the
//! parcel and payment collections and issues the parcel's tracking id.

use super::marketplace::Marketplace;
use crate::domain::parcel::{Parcel, PaymentStatus};
use crate::domain::payment::{
    CheckoutSession, ConfirmationOutcome, PaymentConfirmation, PaymentRecord,
    SessionPaymentStatus, TrackingId,
};
use crate::domain::principal::{Access, Principal};
use crate::error::{MarketplaceError, Result};
use chrono::Utc;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

impl Marketplace {
    /// Confirms the payment behind `session_id`.
    ///
    /// Idempotent per gateway payment reference: the first successful call
    /// records the payment and stamps the parcel with a fresh tracking id;
    /// every later call returns that same tracking id without writing a new
    /// record. Sessions that are not `paid` fail with `PaymentNotCompleted`
    /// and leave no trace. A second paid session for a parcel that is already
    /// paid is recorded under the parcel's existing tracking id.
    ///
    /// The payment record is written before the parcel. It is the write that
    /// carries the unique key, so concurrent confirmations of one session
    /// converge on a single record. If the parcel update then fails the call
    /// reports `Inconsistency`, and the next confirmation re-stamps the parcel
    /// from the stored record.
    #[instrument(skip(self, credential))]
    pub async fn confirm_payment(
        &self,
        credential: &str,
        session_id: &str,
    ) -> Result<PaymentConfirmation> {
        let principal = self.authorize(credential, Access::Authenticated).await?;
        let session = self.gateway.retrieve_session(session_id).await?;
        self.ensure_session_customer(&principal, &session).await?;

        let transition_id = session.payment_intent.clone();
        if let Some(transition_id) = &transition_id
            && let Some(existing) = self.payments.get(transition_id).await?
        {
            debug!(transition_id = %transition_id, "payment already recorded");
            return self.already_confirmed(existing).await;
        }

        let fresh_tracking_id = TrackingId::generate();

        if session.payment_status != SessionPaymentStatus::Paid {
            warn!(session_id, status = %session.payment_status, "confirmation of unpaid session");
            return Err(MarketplaceError::PaymentNotCompleted(session.payment_status));
        }
        let transition_id = transition_id.ok_or_else(|| {
            MarketplaceError::InvalidSession(format!(
                "session {} is paid but carries no payment reference",
                session.id
            ))
        })?;

        let parcel_id = session_parcel_id(&session)?;
        let mut parcel = self.find_parcel(parcel_id).await?;

        // A parcel paid through another session keeps its tracking id.
        let tracking_id = match &parcel.tracking_id {
            Some(existing) if parcel.payment_status == PaymentStatus::Paid => {
                warn!(
                    parcel_id = %parcel_id,
                    transition_id = %transition_id,
                    tracking_id = %existing,
                    "parcel already paid through another session"
                );
                existing.clone()
            }
            _ => fresh_tracking_id,
        };
        let record = PaymentRecord {
            transition_id: transition_id.clone(),
            amount: session.amount_total.unwrap_or_default(),
            currency: session
                .currency
                .clone()
                .unwrap_or_else(|| self.checkout.currency.clone()),
            customer_email: session
                .customer_email
                .clone()
                .unwrap_or_else(|| parcel.sender_email.clone()),
            parcel_id,
            parcel_name: session.metadata.parcel_name.clone(),
            payment_status: session.payment_status,
            tracking_id: tracking_id.clone(),
            paid_at: Utc::now(),
        };

        match self.payments.insert(record.clone()).await {
            Ok(()) => {}
            Err(MarketplaceError::Conflict(_)) => {
                // A concurrent confirmation recorded this payment first.
                let existing = self.payments.get(&transition_id).await?.ok_or_else(|| {
                    MarketplaceError::StorageError(format!(
                        "payment {} reported as duplicate but not found",
                        transition_id
                    ))
                })?;
                return self.already_confirmed(existing).await;
            }
            Err(e) => return Err(e),
        }

        parcel.mark_paid(tracking_id.clone());
        self.stamp_parcel(&parcel, &record).await?;
        info!(
            parcel_id = %parcel_id,
            transition_id = %transition_id,
            tracking_id = %tracking_id,
            "payment confirmed"
        );

        Ok(PaymentConfirmation {
            outcome: ConfirmationOutcome::Confirmed,
            tracking_id,
            transition_id,
            parcel: Some(parcel),
            payment: record,
        })
    }

    /// Only the paying customer or an admin may confirm a session.
    async fn ensure_session_customer(
        &self,
        principal: &Principal,
        session: &CheckoutSession,
    ) -> Result<()> {
        match &session.customer_email {
            Some(customer) => self.ensure_owner_or_admin(principal, customer).await,
            None if self.is_admin(principal).await? => Ok(()),
            None => Err(MarketplaceError::Forbidden(format!(
                "session {} has no customer; only an admin may confirm it",
                session.id
            ))),
        }
    }

    /// Builds the response for a payment that is already on record and
    /// re-stamps the parcel if an earlier run stopped before doing so.
    async fn already_confirmed(&self, record: PaymentRecord) -> Result<PaymentConfirmation> {
        let parcel = match self.parcels.get(record.parcel_id).await? {
            Some(mut parcel)
                if parcel.payment_status != PaymentStatus::Paid
                    || parcel.tracking_id.as_ref() != Some(&record.tracking_id) =>
            {
                warn!(
                    parcel_id = %parcel.id,
                    transition_id = %record.transition_id,
                    "repairing parcel of recorded payment"
                );
                parcel.mark_paid(record.tracking_id.clone());
                self.stamp_parcel(&parcel, &record).await?;
                Some(parcel)
            }
            other => other,
        };

        Ok(PaymentConfirmation {
            outcome: ConfirmationOutcome::AlreadyConfirmed,
            tracking_id: record.tracking_id.clone(),
            transition_id: record.transition_id.clone(),
            parcel,
            payment: record,
        })
    }

    async fn stamp_parcel(&self, parcel: &Parcel, record: &PaymentRecord) -> Result<()> {
        let reason = match self.parcels.update(parcel.clone()).await {
            Ok(true) => return Ok(()),
            Ok(false) => "parcel no longer exists".to_string(),
            Err(e) => e.to_string(),
        };
        error!(
            parcel_id = %parcel.id,
            transition_id = %record.transition_id,
            reason = %reason,
            "payment recorded but parcel not updated"
        );
        Err(MarketplaceError::Inconsistency(format!(
            "payment {} is recorded with tracking id {} but parcel {} was not updated: {}",
            record.transition_id, record.tracking_id, parcel.id, reason
        )))
    }
}

fn session_parcel_id(session: &CheckoutSession) -> Result<Uuid> {
    let raw = session.metadata.parcel_id.as_deref().ok_or_else(|| {
        MarketplaceError::InvalidSession(format!("session {} has no parcel id", session.id))
    })?;
    Uuid::parse_str(raw).map_err(|_| {
        MarketplaceError::InvalidSession(format!(
            "session {} has malformed parcel id '{}'",
            session.id, raw
        ))
    })
}
