use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use storage::{
    BookingEngine,
    booking::Actor,
    dto::reservation::{
        AttendanceResponse, BookRequest, BookingResponse, CancelReservationRequest,
        CancellationResponse,
    },
};
use uuid::Uuid;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    post,
    path = "/api/reservations",
    request_body = BookRequest,
    responses(
        (status = 201, description = "Seat confirmed", body = BookingResponse),
        (status = 202, description = "Class full, member added to the waitlist",
            body = BookingResponse),
        (status = 403, description = "Member blocked or membership inactive"),
        (status = 404, description = "Member or class not found"),
        (status = 409, description = "Class full, already booked or not bookable"),
        (status = 503, description = "Class is busy, retry")
    ),
    tag = "reservations"
)]
pub async fn book(
    State(engine): State<Arc<BookingEngine>>,
    Json(req): Json<BookRequest>,
) -> Result<Response, WebError> {
    let (confirmed, response) = services::book(&engine, &req).await?;
    let status = if confirmed {
        StatusCode::CREATED
    } else {
        StatusCode::ACCEPTED
    };

    Ok((status, Json(response)).into_response())
}

#[utoipa::path(
    post,
    path = "/api/reservations/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Reservation id")
    ),
    request_body = CancelReservationRequest,
    responses(
        (status = 200,
            description = "Reservation cancelled, seat handed to the waitlist if anyone waits",
            body = CancellationResponse),
        (status = 403, description = "Too close to the class start"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation already closed")
    ),
    tag = "reservations"
)]
pub async fn cancel(
    State(engine): State<Arc<BookingEngine>>,
    Path(reservation_id): Path<Uuid>,
    Json(req): Json<CancelReservationRequest>,
) -> Result<Response, WebError> {
    let outcome = services::cancel(&engine, reservation_id, Actor::Member(req.member_id)).await?;

    Ok(Json(outcome).into_response())
}

#[utoipa::path(
    post,
    path = "/api/admin/reservations/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Reservation id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Reservation cancelled regardless of notice",
            body = CancellationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation already closed")
    ),
    tag = "reservations"
)]
pub async fn admin_cancel(
    State(engine): State<Arc<BookingEngine>>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let outcome = services::cancel(&engine, reservation_id, Actor::Admin).await?;

    Ok(Json(outcome).into_response())
}

#[utoipa::path(
    post,
    path = "/api/reservations/{id}/attendance",
    params(
        ("id" = Uuid, Path, description = "Reservation id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Attendance recorded", body = AttendanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation not confirmed or class not finished")
    ),
    tag = "reservations"
)]
pub async fn mark_present(
    State(engine): State<Arc<BookingEngine>>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let outcome = services::mark_present(&engine, reservation_id).await?;

    Ok(Json(outcome).into_response())
}

#[utoipa::path(
    post,
    path = "/api/reservations/{id}/no-show",
    params(
        ("id" = Uuid, Path, description = "Reservation id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "No-show recorded with the resulting penalty",
            body = AttendanceResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Reservation not found"),
        (status = 409, description = "Reservation not confirmed or class not finished")
    ),
    tag = "reservations"
)]
pub async fn mark_absent(
    State(engine): State<Arc<BookingEngine>>,
    Path(reservation_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let outcome = services::mark_absent(&engine, reservation_id).await?;

    Ok(Json(outcome).into_response())
}
