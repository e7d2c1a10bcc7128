use crate::domain::payment::{CheckoutRequest, CheckoutSession, SessionPaymentStatus};
use crate::domain::ports::PaymentGateway;
use crate::error::{MarketplaceError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

const SANDBOX_CHECKOUT_URL: &str = "https://checkout.sandbox.local/pay";

/// In-process stand-in for a hosted checkout provider.
///
/// Sessions start `unpaid`; `complete` simulates the customer finishing the
/// hosted page. Clones share the same session table, so a handle can be kept
/// outside the marketplace to drive completions.
#[derive(Default, Clone)]
pub struct SandboxGateway {
    sessions: Arc<RwLock<HashMap<String, CheckoutSession>>>,
}

impl SandboxGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks a session as finished with the given status and payment reference.
    pub async fn complete(
        &self,
        session_id: &str,
        payment_intent: &str,
        status: SessionPaymentStatus,
    ) -> Result<CheckoutSession> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(session_id)
            .ok_or_else(|| no_such_session(session_id))?;
        session.payment_status = status;
        session.payment_intent = Some(payment_intent.to_string());
        Ok(session.clone())
    }

    /// Registers a session as-is, for simulating arbitrary gateway responses.
    pub async fn insert(&self, session: CheckoutSession) {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.id.clone(), session);
    }
}

fn no_such_session(session_id: &str) -> MarketplaceError {
    MarketplaceError::GatewayError(format!("No such checkout session: '{}'", session_id))
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_session(&self, request: CheckoutRequest) -> Result<CheckoutSession> {
        if request.unit_amount <= 0 {
            return Err(MarketplaceError::GatewayError(
                "unit_amount must be positive".to_string(),
            ));
        }

        let id = format!("cs_test_{}", Uuid::new_v4().simple());
        let session = CheckoutSession {
            url: Some(format!("{}/{}", SANDBOX_CHECKOUT_URL, id)),
            id: id.clone(),
            payment_status: SessionPaymentStatus::Unpaid,
            payment_intent: None,
            amount_total: Some(request.unit_amount),
            currency: Some(request.currency),
            customer_email: Some(request.customer_email),
            metadata: request.metadata,
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(id, session.clone());
        Ok(session)
    }

    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession> {
        let sessions = self.sessions.read().await;
        sessions
            .get(session_id)
            .cloned()
            .ok_or_else(|| no_such_session(session_id))
    }
}
