mod client;
mod config;
mod envelope_repository;
mod models;
mod signer_repository;

pub use client::PostgresClient;
pub use config::PostgresConfig;
pub use envelope_repository::PostgresEnvelopeRepository;
pub use signer_repository::PostgresSignerRepository;
