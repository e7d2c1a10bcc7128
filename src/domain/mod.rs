//! Domain layer: marketplace records, value objects and the ports that the
//! application layer talks to.

pub mod parcel;
pub mod payment;
pub mod ports;
pub mod principal;
pub mod rider;
pub mod user;
