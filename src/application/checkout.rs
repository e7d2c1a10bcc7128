use super::marketplace::{CheckoutSettings, Marketplace};
use crate::domain::parcel::{Parcel, PaymentStatus};
use crate::domain::payment::{CheckoutLink, CheckoutRequest, CheckoutVariant, SessionMetadata};
use crate::domain::principal::Access;
use crate::error::{MarketplaceError, Result};
use tracing::info;
use uuid::Uuid;

const UNNAMED_PARCEL: &str = "Unnamed Parcel";

impl Marketplace {
    /// Opens a hosted checkout session for a parcel and returns the redirect.
    ///
    /// Amount, customer email and parcel name come from the stored parcel.
    /// Nothing is persisted: an abandoned checkout leaves no trace.
    pub async fn create_checkout_session(
        &self,
        credential: &str,
        parcel_id: Uuid,
        variant: CheckoutVariant,
    ) -> Result<CheckoutLink> {
        let principal = self.authorize(credential, Access::Authenticated).await?;
        let parcel = self.find_parcel(parcel_id).await?;
        self.ensure_owner_or_admin(&principal, &parcel.sender_email)
            .await?;
        if parcel.payment_status == PaymentStatus::Paid {
            return Err(MarketplaceError::ValidationError(format!(
                "parcel {} is already paid",
                parcel_id
            )));
        }

        let request = checkout_request(&self.checkout, &parcel, variant)?;
        let session = self.gateway.create_session(request).await?;
        info!(parcel_id = %parcel_id, session_id = %session.id, "checkout session created");

        Ok(CheckoutLink {
            session_id: session.id,
            url: session.url,
        })
    }
}

pub(crate) fn checkout_request(
    settings: &CheckoutSettings,
    parcel: &Parcel,
    variant: CheckoutVariant,
) -> Result<CheckoutRequest> {
    let unit_amount = parcel.cost.minor_units()?;
    let success = format!("{}/dashboard/payment-success", settings.site_domain);
    let cancel_url = format!("{}/dashboard/payment-cancel", settings.site_domain);

    let (line_item_name, metadata, success_url) = match variant {
        CheckoutVariant::Basic => (
            parcel.parcel_name.clone(),
            SessionMetadata {
                parcel_id: Some(parcel.id.to_string()),
                parcel_name: None,
            },
            success,
        ),
        CheckoutVariant::Tracked => {
            let name = if parcel.parcel_name.trim().is_empty() {
                UNNAMED_PARCEL.to_string()
            } else {
                parcel.parcel_name.clone()
            };
            (
                format!("Please Pay for :  {}", name),
                SessionMetadata {
                    parcel_id: Some(parcel.id.to_string()),
                    parcel_name: Some(name),
                },
                format!("{}?session_id={{CHECKOUT_SESSION_ID}}", success),
            )
        }
    };

    Ok(CheckoutRequest {
        line_item_name,
        unit_amount,
        currency: settings.currency.clone(),
        customer_email: parcel.sender_email.clone(),
        metadata,
        success_url,
        cancel_url,
    })
}
