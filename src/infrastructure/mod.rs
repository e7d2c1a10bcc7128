//! Adapters implementing the domain ports.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod sandbox_gateway;
#[cfg(feature = "gateway-stripe")]
pub mod stripe;
pub mod token;
