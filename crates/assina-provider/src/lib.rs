//! HTTP client for the external signing provider.

mod client;
mod config;
mod dto;

pub use client::BryProviderClient;
pub use config::ProviderConfig;
