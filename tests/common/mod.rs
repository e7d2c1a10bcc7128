#![allow(dead_code)]

use chrono::Duration;
use rust_decimal::Decimal;
use zapshift::application::marketplace::{CheckoutSettings, Marketplace};
use zapshift::domain::parcel::{Cost, NewParcel, Parcel};
use zapshift::domain::payment::{CheckoutVariant, SessionPaymentStatus};
use zapshift::domain::ports::Stores;
use zapshift::domain::user::NewUser;
use zapshift::infrastructure::sandbox_gateway::SandboxGateway;
use zapshift::infrastructure::token::HmacTokenVerifier;

pub const ADMIN: &str = "admin@zap.test";

pub struct Fixture {
    pub marketplace: Marketplace,
    pub sandbox: SandboxGateway,
    pub verifier: HmacTokenVerifier,
}

impl Fixture {
    pub async fn new() -> Self {
        Self::with_stores(Stores::in_memory()).await
    }

    /// Builds a marketplace over `stores` with one bootstrapped admin.
    pub async fn with_stores(stores: Stores) -> Self {
        let sandbox = SandboxGateway::new();
        let verifier = HmacTokenVerifier::new("integration-secret", Duration::hours(1));
        let marketplace = Marketplace::new(
            stores,
            Box::new(sandbox.clone()),
            Box::new(verifier.clone()),
            CheckoutSettings {
                site_domain: "https://zap.test".to_string(),
                currency: "usd".to_string(),
            },
        );
        marketplace
            .bootstrap_admins(&[ADMIN.to_string()])
            .await
            .unwrap();
        Self {
            marketplace,
            sandbox,
            verifier,
        }
    }

    pub fn token(&self, email: &str) -> String {
        format!("Bearer {}", self.verifier.issue(email))
    }

    pub fn admin(&self) -> String {
        self.token(ADMIN)
    }

    /// Registers `email` and returns its token.
    pub async fn user(&self, email: &str) -> String {
        self.marketplace
            .register_user(NewUser {
                email: email.to_string(),
                display_name: email.to_string(),
                photo_url: None,
            })
            .await
            .unwrap();
        self.token(email)
    }

    pub async fn parcel(&self, sender: &str, cost: Decimal) -> Parcel {
        self.marketplace
            .create_parcel(&self.token(sender), new_parcel(sender, cost))
            .await
            .unwrap()
    }

    /// Opens a checkout for the parcel and lets the sandbox report it paid
    /// under `payment_intent`. Returns the session id.
    pub async fn paid_session(&self, parcel: &Parcel, payment_intent: &str) -> String {
        let link = self
            .marketplace
            .create_checkout_session(
                &self.token(&parcel.sender_email),
                parcel.id,
                CheckoutVariant::Tracked,
            )
            .await
            .unwrap();
        self.sandbox
            .complete(&link.session_id, payment_intent, SessionPaymentStatus::Paid)
            .await
            .unwrap();
        link.session_id
    }
}

pub fn new_parcel(sender: &str, cost: Decimal) -> NewParcel {
    NewParcel {
        parcel_name: "Books".to_string(),
        cost: Cost::new(cost).unwrap(),
        sender_email: sender.to_string(),
        sender_name: None,
        sender_district: Some("Dhaka".to_string()),
        receiver_name: Some("Bob".to_string()),
        receiver_district: Some("Sylhet".to_string()),
        receiver_address: None,
    }
}
