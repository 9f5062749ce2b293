pub mod signatures;
pub mod webhooks;
