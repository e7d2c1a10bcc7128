use super::parcel::Parcel;
use super::payment::{CheckoutRequest, CheckoutSession, PaymentRecord};
use super::principal::{AuthError, Principal};
use super::rider::RiderApplication;
use super::user::User;
use crate::error::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Users and their roles. Email is an application-level unique key.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails with `Conflict` if the email is already registered.
    async fn insert(&self, user: User) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    /// Replaces an existing user. Returns `false` when no user has that id.
    async fn update(&self, user: User) -> Result<bool>;
    async fn get_all(&self) -> Result<Vec<User>>;
}

/// Rider applications. Email is unique across applications.
#[async_trait]
pub trait RiderStore: Send + Sync {
    /// Inserts an application. Fails with `Conflict` if the email already applied.
    async fn insert(&self, application: RiderApplication) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<RiderApplication>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<RiderApplication>>;
    async fn update(&self, application: RiderApplication) -> Result<bool>;
    async fn get_all(&self) -> Result<Vec<RiderApplication>>;
}

#[async_trait]
pub trait ParcelStore: Send + Sync {
    async fn insert(&self, parcel: Parcel) -> Result<()>;
    async fn get(&self, id: Uuid) -> Result<Option<Parcel>>;
    async fn update(&self, parcel: Parcel) -> Result<bool>;
    /// Removes a parcel. Returns `false` when nothing was removed.
    async fn delete(&self, id: Uuid) -> Result<bool>;
    async fn get_all(&self) -> Result<Vec<Parcel>>;
}

/// Confirmed payments keyed by the gateway payment reference.
#[async_trait]
pub trait PaymentStore: Send + Sync {
    /// Inserts a record. Fails with `Conflict` if the transition id is already recorded.
    ///
    /// Implementations must make the existence check and the write atomic.
    async fn insert(&self, record: PaymentRecord) -> Result<()>;
    async fn get(&self, transition_id: &str) -> Result<Option<PaymentRecord>>;
    async fn get_all(&self) -> Result<Vec<PaymentRecord>>;
}

/// Verifies an opaque bearer credential into a principal.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> std::result::Result<Principal, AuthError>;
}

/// Hosted checkout provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(&self, request: CheckoutRequest) -> Result<CheckoutSession>;
    async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession>;
}

pub type UserStoreBox = Box<dyn UserStore>;
pub type RiderStoreBox = Box<dyn RiderStore>;
pub type ParcelStoreBox = Box<dyn ParcelStore>;
pub type PaymentStoreBox = Box<dyn PaymentStore>;
pub type IdentityVerifierBox = Box<dyn IdentityVerifier>;
pub type PaymentGatewayBox = Box<dyn PaymentGateway>;

/// The four persistent collections, bundled for injection into the marketplace.
pub struct Stores {
    pub users: UserStoreBox,
    pub riders: RiderStoreBox,
    pub parcels: ParcelStoreBox,
    pub payments: PaymentStoreBox,
}
