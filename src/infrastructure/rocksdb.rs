use crate::domain::parcel::Parcel;
use crate::domain::payment::PaymentRecord;
use crate::domain::ports::{ParcelStore, PaymentStore, RiderStore, Stores, UserStore};
use crate::domain::rider::RiderApplication;
use crate::domain::user::User;
use crate::error::{MarketplaceError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, IteratorMode, Options};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Column Family for storing users.
pub const CF_USERS: &str = "users";
/// Column Family for storing rider applications.
pub const CF_RIDERS: &str = "riders";
/// Column Family for storing parcels.
pub const CF_PARCELS: &str = "parcels";
/// Column Family for storing payment records, keyed by transition id.
pub const CF_PAYMENTS: &str = "payments";

/// A persistent store implementation using RocksDB.
///
/// Each collection lives in its own Column Family and values are stored as
/// JSON. Unique-key inserts (user email, rider email, payment transition id)
/// are serialized through `insert_lock` so the existence check and the write
/// cannot interleave with another insert.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    insert_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path, creating
    /// missing column families.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_USERS, CF_RIDERS, CF_PARCELS, CF_PAYMENTS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            insert_lock: Arc::new(Mutex::new(())),
        })
    }

    /// Bundles this database as all four marketplace collections.
    pub fn into_stores(self) -> Stores {
        Stores {
            users: Box::new(self.clone()),
            riders: Box::new(self.clone()),
            parcels: Box::new(self.clone()),
            payments: Box::new(self),
        }
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db.cf_handle(name).ok_or_else(|| {
            MarketplaceError::StorageError(format!("{} column family not found", name))
        })
    }

    fn put_json<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let bytes = serde_json::to_vec(value)?;
        self.db.put_cf(cf, key, bytes)?;
        Ok(())
    }

    fn get_json<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        match self.db.get_cf(cf, key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn exists(&self, cf_name: &str, key: &[u8]) -> Result<bool> {
        let cf = self.cf(cf_name)?;
        Ok(self.db.get_pinned_cf(cf, key)?.is_some())
    }

    fn scan_json<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        let mut values = Vec::new();
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            let (_key, value) = item?;
            values.push(serde_json::from_slice(&value)?);
        }
        Ok(values)
    }

    /// Overwrites `key` only if it is already present.
    fn replace_json<T: Serialize>(&self, cf_name: &str, key: &[u8], value: &T) -> Result<bool> {
        if !self.exists(cf_name, key)? {
            return Ok(false);
        }
        self.put_json(cf_name, key, value)?;
        Ok(true)
    }
}

#[async_trait]
impl UserStore for RocksDBStore {
    async fn insert(&self, user: User) -> Result<()> {
        let _guard = self.insert_lock.lock().await;
        if UserStore::find_by_email(self, &user.email).await?.is_some() {
            return Err(MarketplaceError::Conflict(format!(
                "user {} already exists",
                user.email
            )));
        }
        self.put_json(CF_USERS, user.id.as_bytes(), &user)
    }

    async fn get(&self, id: Uuid) -> Result<Option<User>> {
        self.get_json(CF_USERS, id.as_bytes())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .scan_json::<User>(CF_USERS)?
            .into_iter()
            .find(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn update(&self, user: User) -> Result<bool> {
        self.replace_json(CF_USERS, user.id.as_bytes(), &user)
    }

    async fn get_all(&self) -> Result<Vec<User>> {
        self.scan_json(CF_USERS)
    }
}

#[async_trait]
impl RiderStore for RocksDBStore {
    async fn insert(&self, application: RiderApplication) -> Result<()> {
        let _guard = self.insert_lock.lock().await;
        if RiderStore::find_by_email(self, &application.email)
            .await?
            .is_some()
        {
            return Err(MarketplaceError::Conflict(format!(
                "rider application for {} already exists",
                application.email
            )));
        }
        self.put_json(CF_RIDERS, application.id.as_bytes(), &application)
    }

    async fn get(&self, id: Uuid) -> Result<Option<RiderApplication>> {
        self.get_json(CF_RIDERS, id.as_bytes())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<RiderApplication>> {
        Ok(self
            .scan_json::<RiderApplication>(CF_RIDERS)?
            .into_iter()
            .find(|r| r.email.eq_ignore_ascii_case(email)))
    }

    async fn update(&self, application: RiderApplication) -> Result<bool> {
        self.replace_json(CF_RIDERS, application.id.as_bytes(), &application)
    }

    async fn get_all(&self) -> Result<Vec<RiderApplication>> {
        self.scan_json(CF_RIDERS)
    }
}

#[async_trait]
impl ParcelStore for RocksDBStore {
    async fn insert(&self, parcel: Parcel) -> Result<()> {
        self.put_json(CF_PARCELS, parcel.id.as_bytes(), &parcel)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Parcel>> {
        self.get_json(CF_PARCELS, id.as_bytes())
    }

    async fn update(&self, parcel: Parcel) -> Result<bool> {
        self.replace_json(CF_PARCELS, parcel.id.as_bytes(), &parcel)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        if !self.exists(CF_PARCELS, id.as_bytes())? {
            return Ok(false);
        }
        let cf = self.cf(CF_PARCELS)?;
        self.db.delete_cf(cf, id.as_bytes())?;
        Ok(true)
    }

    async fn get_all(&self) -> Result<Vec<Parcel>> {
        self.scan_json(CF_PARCELS)
    }
}

#[async_trait]
impl PaymentStore for RocksDBStore {
    async fn insert(&self, record: PaymentRecord) -> Result<()> {
        let _guard = self.insert_lock.lock().await;
        let key = record.transition_id.as_bytes();
        if self.exists(CF_PAYMENTS, key)? {
            return Err(MarketplaceError::Conflict(format!(
                "payment {} already recorded",
                record.transition_id
            )));
        }
        self.put_json(CF_PAYMENTS, key, &record)
    }

    async fn get(&self, transition_id: &str) -> Result<Option<PaymentRecord>> {
        self.get_json(CF_PAYMENTS, transition_id.as_bytes())
    }

    async fn get_all(&self) -> Result<Vec<PaymentRecord>> {
        self.scan_json(CF_PAYMENTS)
    }
}
