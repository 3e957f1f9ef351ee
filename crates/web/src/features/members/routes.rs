use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use storage::BookingEngine;

use super::handlers::{create_member, get_member, list_reservations, list_waitlist};
use crate::middleware::auth::{ApiKeys, require_auth};

pub fn routes(api_keys: ApiKeys) -> Router<Arc<BookingEngine>> {
    let protected = Router::new()
        .route("/", post(create_member))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/:id", get(get_member))
        .route("/:id/reservations", get(list_reservations))
        .route("/:id/waitlist", get(list_waitlist))
        .merge(protected)
}
