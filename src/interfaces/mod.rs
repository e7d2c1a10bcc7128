//! Process-facing adapters: the command script runner and CSV export.

pub mod csv;
pub mod script;
