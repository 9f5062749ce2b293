//! HTTP surface for the signing service.

mod error;
mod router;
mod routes;
mod state;

pub use error::ApiError;
pub use router::api_router;
pub use state::ApiState;
