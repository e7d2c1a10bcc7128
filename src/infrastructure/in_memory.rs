use crate::domain::parcel::Parcel;
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::{ParcelStore, PaymentStore, RiderStore, Stores, UserStore};
use crate::domain::rider::RiderApplication;
use crate::domain::user::User;
use crate::error::{MarketplaceError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// A thread-safe in-memory store for users.
///
/// Uses `Arc<RwLock<HashMap<Uuid, User>>>` to allow shared concurrent access.
/// Email uniqueness is checked under the write lock.
#[derive(Default, Clone)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn insert(&self, user: User) -> Result<()> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(MarketplaceError::Conflict(format!(
                "user {} already exists",
                user.email
            )));
        }
        users.insert(user.id, user);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, user: User) -> Result<bool> {
        let mut users = self.users.write().await;
        match users.get_mut(&user.id) {
            Some(existing) => {
                *existing = user;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_all(&self) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(users.values().cloned().collect())
    }
}

/// A thread-safe in-memory store for rider applications.
#[derive(Default, Clone)]
pub struct InMemoryRiderStore {
    riders: Arc<RwLock<HashMap<Uuid, RiderApplication>>>,
}

impl InMemoryRiderStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RiderStore for InMemoryRiderStore {
    async fn insert(&self, application: RiderApplication) -> Result<()> {
        let mut riders = self.riders.write().await;
        if riders
            .values()
            .any(|r| r.email.eq_ignore_ascii_case(&application.email))
        {
            return Err(MarketplaceError::Conflict(format!(
                "rider application for {} already exists",
                application.email
            )));
        }
        riders.insert(application.id, application);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<RiderApplication>> {
        let riders = self.riders.read().await;
        Ok(riders.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<RiderApplication>> {
        let riders = self.riders.read().await;
        Ok(riders
            .values()
            .find(|r| r.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn update(&self, application: RiderApplication) -> Result<bool> {
        let mut riders = self.riders.write().await;
        match riders.get_mut(&application.id) {
            Some(existing) => {
                *existing = application;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_all(&self) -> Result<Vec<RiderApplication>> {
        let riders = self.riders.read().await;
        Ok(riders.values().cloned().collect())
    }
}

/// A thread-safe in-memory store for parcels.
#[derive(Default, Clone)]
pub struct InMemoryParcelStore {
    parcels: Arc<RwLock<HashMap<Uuid, Parcel>>>,
}

impl InMemoryParcelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ParcelStore for InMemoryParcelStore {
    async fn insert(&self, parcel: Parcel) -> Result<()> {
        let mut parcels = self.parcels.write().await;
        parcels.insert(parcel.id, parcel);
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Parcel>> {
        let parcels = self.parcels.read().await;
        Ok(parcels.get(&id).cloned())
    }

    async fn update(&self, parcel: Parcel) -> Result<bool> {
        let mut parcels = self.parcels.write().await;
        match parcels.get_mut(&parcel.id) {
            Some(existing) => {
                *existing = parcel;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let mut parcels = self.parcels.write().await;
        Ok(parcels.remove(&id).is_some())
    }

    async fn get_all(&self) -> Result<Vec<Parcel>> {
        let parcels = self.parcels.read().await;
        Ok(parcels.values().cloned().collect())
    }
}

/// A thread-safe in-memory store for payment records, keyed by transition id.
#[derive(Default, Clone)]
pub struct InMemoryPaymentStore {
    payments: Arc<RwLock<HashMap<String, PaymentRecord>>>,
}

impl InMemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for InMemoryPaymentStore {
    async fn insert(&self, record: PaymentRecord) -> Result<()> {
        let mut payments = self.payments.write().await;
        if payments.contains_key(&record.transition_id) {
            return Err(MarketplaceError::Conflict(format!(
                "payment {} already recorded",
                record.transition_id
            )));
        }
        payments.insert(record.transition_id.clone(), record);
        Ok(())
    }

    async fn get(&self, transition_id: &str) -> Result<Option<PaymentRecord>> {
        let payments = self.payments.read().await;
        Ok(payments.get(transition_id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<PaymentRecord>> {
        let payments = self.payments.read().await;
        Ok(payments.values().cloned().collect())
    }
}

impl Stores {
    /// Fresh, empty in-memory collections.
    pub fn in_memory() -> Self {
        Self {
            users: Box::new(InMemoryUserStore::new()),
            riders: Box::new(InMemoryRiderStore::new()),
            parcels: Box::new(InMemoryParcelStore::new()),
            payments: Box::new(InMemoryPaymentStore::new()),
        }
    }
}
