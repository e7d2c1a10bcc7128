//! JSON-lines command scripts replayed against a [`Marketplace`](crate::application::marketplace::Marketplace).

pub mod command;
pub mod runner;
