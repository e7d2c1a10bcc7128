//! Application layer containing the marketplace operations.
//!
//! Everything hangs off [`marketplace::Marketplace`], which owns the injected
//! ports. Operations are split by area into separate `impl` blocks.

pub mod checkout;
pub mod confirmation;
pub mod marketplace;
pub mod parcels;
pub mod payments;
pub mod riders;
pub mod users;
