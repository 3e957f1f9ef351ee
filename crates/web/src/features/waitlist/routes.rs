use axum::{Router, routing::post};
use std::sync::Arc;
use storage::BookingEngine;

use super::handlers::{join, leave};

pub fn routes() -> Router<Arc<BookingEngine>> {
    Router::new()
        .route("/", post(join))
        .route("/:id/leave", post(leave))
}
