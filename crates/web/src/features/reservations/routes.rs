use axum::{Router, middleware, routing::post};
use std::sync::Arc;
use storage::BookingEngine;

use super::handlers::{admin_cancel, book, cancel, mark_absent, mark_present};
use crate::middleware::auth::{ApiKeys, require_auth};

pub fn routes(api_keys: ApiKeys) -> Router<Arc<BookingEngine>> {
    let protected = Router::new()
        .route("/:id/attendance", post(mark_present))
        .route("/:id/no-show", post(mark_absent))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth));

    Router::new()
        .route("/", post(book))
        .route("/:id/cancel", post(cancel))
        .merge(protected)
}

/// Mounted under `/api/admin/reservations`.
pub fn admin_routes(api_keys: ApiKeys) -> Router<Arc<BookingEngine>> {
    Router::new()
        .route("/:id/cancel", post(admin_cancel))
        .route_layer(middleware::from_fn_with_state(api_keys, require_auth))
}
