use crate::domain::payment::{
    CheckoutRequest, CheckoutSession, SessionMetadata, SessionPaymentStatus,
};
use crate::domain::ports::PaymentGateway;
use crate::error::{MarketplaceError, Result};
use async_trait::async_trait;
use serde::Deserialize;

pub const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";

/// Stripe Checkout adapter talking to the REST API directly.
///
/// Holds a single pooled `reqwest::Client` for the process lifetime.
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    base_url: String,
}

#[derive(Deserialize)]
struct StripeCustomerDetails {
    email: Option<String>,
}

#[derive(Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    payment_status: SessionPaymentStatus,
    payment_intent: Option<String>,
    amount_total: Option<i64>,
    currency: Option<String>,
    customer_email: Option<String>,
    customer_details: Option<StripeCustomerDetails>,
    #[serde(default)]
    metadata: SessionMetadata,
}

impl From<StripeSession> for CheckoutSession {
    fn from(session: StripeSession) -> Self {
        let customer_email = session
            .customer_email
            .or_else(|| session.customer_details.and_then(|d| d.email));
        Self {
            id: session.id,
            url: session.url,
            payment_status: session.payment_status,
            payment_intent: session.payment_intent,
            amount_total: session.amount_total,
            currency: session.currency,
            customer_email,
            metadata: session.metadata,
        }
    }
}

#[derive(Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(secret_key: impl Into<String>) -> Result<Self> {
        Self::with_base_url(secret_key, STRIPE_API_BASE)
    }

    pub fn with_base_url(secret_key: impl Into<String>, base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("zapshift/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            client,
            secret_key: secret_key.into(),
            base_url: base_url.into(),
        })
    }

    async fn read_session(response: reqwest::Response) -> Result<CheckoutSession> {
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or_else(|| format!("Stripe responded with {}", status));
            return Err(MarketplaceError::GatewayError(message));
        }
        let session: StripeSession = serde_json::from_str(&body)?;
        Ok(session.into())
    }
}

/// Form fields for `POST /v1/checkout/sessions`.
pub(crate) fn session_form(request: &CheckoutRequest) -> Vec<(String, String)> {
    let mut form = vec![
        ("mode".to_string(), "payment".to_string()),
        (
            "line_items[0][price_data][currency]".to_string(),
            request.currency.clone(),
        ),
        (
            "line_items[0][price_data][unit_amount]".to_string(),
            request.unit_amount.to_string(),
        ),
        (
            "line_items[0][price_data][product_data][name]".to_string(),
            request.line_item_name.clone(),
        ),
        ("line_items[0][quantity]".to_string(), "1".to_string()),
        ("customer_email".to_string(), request.customer_email.clone()),
        ("success_url".to_string(), request.success_url.clone()),
        ("cancel_url".to_string(), request.cancel_url.clone()),
    ];
    if let Some(parcel_id) = &request.metadata.parcel_id {
        form.push(("metadata[parcelId]".to_string(), parcel_id.clone()));
    }
    if let Some(parcel_name) = &request.metadata.parcel_name {
        form.push(("metadata[parcelName]".to_string(), parcel_name.clone()));
    }
    form
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .bearer_auth(&self.secret_key)
            .form(&session_form(&request))
            .send()
            .await?;
        Self::read_session(response).await
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", self.base_url, session_id))
            .bearer_auth(&self.secret_key)
            .send()
            .await?;
        Self::read_session(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_form_fields() {
        let request = CheckoutRequest {
            line_item_name: "Please Pay for :  Books".to_string(),
            unit_amount: 2000,
            currency: "usd".to_string(),
            customer_email: "a@x.com".to_string(),
            metadata: SessionMetadata {
                parcel_id: Some("p1".to_string()),
                parcel_name: Some("Books".to_string()),
            },
            success_url: "http://s".to_string(),
            cancel_url: "http://c".to_string(),
        };

        let form = session_form(&request);
        let get = |key: &str| {
            form.iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("line_items[0][price_data][unit_amount]"), Some("2000"));
        assert_eq!(get("metadata[parcelId]"), Some("p1"));
        assert_eq!(get("metadata[parcelName]"), Some("Books"));
        assert_eq!(get("mode"), Some("payment"));
    }

    #[test]
    fn test_session_email_falls_back_to_customer_details() {
        let body = r#"{
            "id": "cs_1",
            "url": null,
            "payment_status": "paid",
            "payment_intent": "pi_1",
            "amount_total": 2000,
            "currency": "usd",
            "customer_email": null,
            "customer_details": {"email": "a@x.com"},
            "metadata": {"parcelId": "p1"}
        }"#;
        let session: CheckoutSession = serde_json::from_str::<StripeSession>(body).unwrap().into();
        assert_eq!(session.customer_email.as_deref(), Some("a@x.com"));
        assert_eq!(session.metadata.parcel_id.as_deref(), Some("p1"));
        assert_eq!(session.payment_status, SessionPaymentStatus::Paid);
    }
}
