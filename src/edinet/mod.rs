// src/edinet/mod.rs
pub mod client;
pub mod locator;
pub mod models;
pub mod retriever;

pub use client::{DisclosureApi, EdinetClient};
