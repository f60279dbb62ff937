// src/reference/mod.rs
pub mod provider;
pub mod table;

pub use provider::ReferenceTableProvider;
pub use table::ReferenceTable;
