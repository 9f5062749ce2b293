use axum::routing::post;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::routes;
use crate::state::ApiState;

pub fn api_router(state: ApiState) -> Router {
    Router::new()
        .route("/signatures", post(routes::signatures::create))
        .route("/signatures/stamp", post(routes::signatures::stamp))
        .route("/signatures/sync", post(routes::signatures::sync))
        .route("/signatures/evidence", post(routes::signatures::evidence))
        .route("/webhooks/signature", post(routes::webhooks::signature))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
