use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use storage::{
    BookingEngine,
    dto::waitlist::{JoinWaitlistRequest, LeaveWaitlistRequest, WaitlistEntryResponse},
};
use uuid::Uuid;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    post,
    path = "/api/waitlist",
    request_body = JoinWaitlistRequest,
    responses(
        (status = 201, description = "Member queued", body = WaitlistEntryResponse),
        (status = 403, description = "Member blocked or membership inactive"),
        (status = 404, description = "Member or class not found"),
        (status = 409, description = "Seats still available, waitlist disabled or already queued")
    ),
    tag = "waitlist"
)]
pub async fn join(
    State(engine): State<Arc<BookingEngine>>,
    Json(req): Json<JoinWaitlistRequest>,
) -> Result<Response, WebError> {
    let entry = services::join(&engine, &req).await?;

    Ok((StatusCode::CREATED, Json(entry)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/waitlist/{id}/leave",
    params(
        ("id" = Uuid, Path, description = "Waitlist entry id")
    ),
    request_body = LeaveWaitlistRequest,
    responses(
        (status = 200, description = "Entry cancelled and the queue closed up",
            body = WaitlistEntryResponse),
        (status = 404, description = "Entry not found"),
        (status = 409, description = "Entry is no longer waiting")
    ),
    tag = "waitlist"
)]
pub async fn leave(
    State(engine): State<Arc<BookingEngine>>,
    Path(entry_id): Path<Uuid>,
    Json(req): Json<LeaveWaitlistRequest>,
) -> Result<Response, WebError> {
    let entry = services::leave(&engine, entry_id, req.member_id).await?;

    Ok(Json(entry).into_response())
}
