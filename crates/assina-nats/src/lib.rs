mod artifact_store;
mod client;
mod completion_producer;

pub use artifact_store::NatsArtifactStore;
pub use client::NatsClient;
pub use completion_producer::CompletionEventProducer;
