use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use storage::{
    BookingEngine,
    dto::{
        class::{
            AvailabilityResponse, BulkAttendanceRequest, BulkAttendanceResponse,
            ClassCancellationResponse, ClassResponse, CreateClassRequest,
        },
        reservation::ReservationResponse,
        waitlist::WaitlistEntryResponse,
    },
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    get,
    path = "/api/classes/available",
    responses(
        (status = 200, description = "Upcoming classes with free seats", body = Vec<ClassResponse>)
    ),
    tag = "classes"
)]
pub async fn list_available(
    State(engine): State<Arc<BookingEngine>>,
) -> Result<Response, WebError> {
    let classes = services::list_available(&engine).await?;

    Ok(Json(classes).into_response())
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}/availability",
    params(
        ("id" = Uuid, Path, description = "Class id")
    ),
    responses(
        (status = 200, description = "Seat counts of an active class", body = AvailabilityResponse),
        (status = 404, description = "Class not found or not active")
    ),
    tag = "classes"
)]
pub async fn get_availability(
    State(engine): State<Arc<BookingEngine>>,
    Path(class_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let availability = services::get_availability(&engine, class_id).await?;

    Ok(Json(availability).into_response())
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}/waitlist",
    params(
        ("id" = Uuid, Path, description = "Class id")
    ),
    responses(
        (status = 200, description = "Waiting members in queue order",
            body = Vec<WaitlistEntryResponse>),
        (status = 404, description = "Class not found")
    ),
    tag = "classes"
)]
pub async fn get_waitlist(
    State(engine): State<Arc<BookingEngine>>,
    Path(class_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let entries = services::get_waitlist(&engine, class_id).await?;

    Ok(Json(entries).into_response())
}

#[utoipa::path(
    post,
    path = "/api/classes",
    request_body = CreateClassRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Class scheduled", body = ClassResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized")
    ),
    tag = "classes"
)]
pub async fn create_class(
    State(engine): State<Arc<BookingEngine>>,
    Json(req): Json<CreateClassRequest>,
) -> Result<Response, WebError> {
    req.validate()?;
    req.validate_schedule()
        .map_err(|msg| WebError::BadRequest(msg.to_string()))?;

    let class = services::create_class(&engine, req).await?;

    Ok((StatusCode::CREATED, Json(class)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/classes/{id}/reservations",
    params(
        ("id" = Uuid, Path, description = "Class id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Every reservation of the class",
            body = Vec<ReservationResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Class not found")
    ),
    tag = "classes"
)]
pub async fn get_roster(
    State(engine): State<Arc<BookingEngine>>,
    Path(class_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let roster = services::get_roster(&engine, class_id).await?;

    Ok(Json(roster).into_response())
}

#[utoipa::path(
    post,
    path = "/api/classes/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Class id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Class cancelled, seats and waitlist released",
            body = ClassCancellationResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Class is not active or has already started")
    ),
    tag = "classes"
)]
pub async fn cancel_class(
    State(engine): State<Arc<BookingEngine>>,
    Path(class_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let cancellation = services::cancel_class(&engine, class_id).await?;

    Ok(Json(cancellation).into_response())
}

#[utoipa::path(
    post,
    path = "/api/classes/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Class id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Class closed", body = ClassResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Class not found"),
        (status = 409, description = "Class has not finished or is not active")
    ),
    tag = "classes"
)]
pub async fn complete_class(
    State(engine): State<Arc<BookingEngine>>,
    Path(class_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let class = services::complete_class(&engine, class_id).await?;

    Ok(Json(class).into_response())
}

#[utoipa::path(
    post,
    path = "/api/classes/{id}/attendance",
    params(
        ("id" = Uuid, Path, description = "Class id")
    ),
    request_body = BulkAttendanceRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Per-reservation attendance results",
            body = BulkAttendanceResponse),
        (status = 400,
            description = "Malformed body, or neither `all` nor `reservation_ids` given"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Class not found")
    ),
    tag = "classes"
)]
pub async fn mark_attendance(
    State(engine): State<Arc<BookingEngine>>,
    Path(class_id): Path<Uuid>,
    body: Result<Json<BulkAttendanceRequest>, JsonRejection>,
) -> Result<Response, WebError> {
    let Json(req) = body?;
    req.validate()?;
    let target = req
        .target()
        .map_err(|msg| WebError::BadRequest(msg.to_string()))?;

    let report = services::mark_attendance(&engine, class_id, target).await?;

    Ok(Json(report).into_response())
}
