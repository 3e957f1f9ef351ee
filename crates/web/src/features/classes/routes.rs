use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use storage::BookingEngine;

use super::handlers::{
    cancel_class, complete_class, create_class, get_availability, get_roster, get_waitlist,
    list_available, mark_attendance,
};
use crate::middleware::auth::{ApiKeys, require_auth};

pub fn routes(api_keys: ApiKeys) -> Router<Arc<BookingEngine>> {
    let protected = Router::new()
        .route("/", post(create_class))
        .route("/:id/reservations", get(get_roster))
        .route("/:id/cancel", post(cancel_class))
        .route("/:id/complete", post(complete_class))
        .route("/:id/attendance", post(mark_attendance))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/available", get(list_available))
        .route("/:id/availability", get(get_availability))
        .route("/:id/waitlist", get(get_waitlist))
        .merge(protected)
}
