// src/extractors/mod.rs
pub mod facts;

// Re-export key extraction types for convenience
pub use facts::{balance_facts, parse_facts};
