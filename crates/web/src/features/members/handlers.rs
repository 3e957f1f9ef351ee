use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use storage::{
    BookingEngine,
    dto::{
        common::{PaginatedResponse, PaginationParams},
        member::{CreateMemberRequest, MemberResponse, ReservationFilter},
        reservation::ReservationResponse,
        waitlist::WaitlistEntryResponse,
    },
};
use uuid::Uuid;
use validator::Validate;

use crate::error::WebError;

use super::services;

#[utoipa::path(
    post,
    path = "/api/members",
    request_body = CreateMemberRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "Member registered", body = MemberResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "Email already registered")
    ),
    tag = "members"
)]
pub async fn create_member(
    State(engine): State<Arc<BookingEngine>>,
    Json(req): Json<CreateMemberRequest>,
) -> Result<Response, WebError> {
    req.validate()?;

    let member = services::create_member(&engine, req).await?;

    Ok((StatusCode::CREATED, Json(member)).into_response())
}

#[utoipa::path(
    get,
    path = "/api/members/{id}",
    params(
        ("id" = Uuid, Path, description = "Member id")
    ),
    responses(
        (status = 200, description = "Member status", body = MemberResponse),
        (status = 404, description = "Member not found")
    ),
    tag = "members"
)]
pub async fn get_member(
    State(engine): State<Arc<BookingEngine>>,
    Path(member_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let member = services::get_member(&engine, member_id).await?;

    Ok(Json(member).into_response())
}

#[utoipa::path(
    get,
    path = "/api/members/{id}/reservations",
    params(
        ("id" = Uuid, Path, description = "Member id"),
        ReservationFilter,
        PaginationParams
    ),
    responses(
        (status = 200, description = "Reservation history, newest first",
            body = PaginatedResponse<ReservationResponse>),
        (status = 400, description = "Invalid query parameters"),
        (status = 404, description = "Member not found")
    ),
    tag = "members"
)]
pub async fn list_reservations(
    State(engine): State<Arc<BookingEngine>>,
    Path(member_id): Path<Uuid>,
    Query(filter): Query<ReservationFilter>,
    Query(pagination): Query<PaginationParams>,
) -> Result<Response, WebError> {
    pagination.validate().map_err(WebError::BadRequest)?;

    let page = services::list_reservations(&engine, member_id, &filter, &pagination).await?;

    Ok(Json(page).into_response())
}

#[utoipa::path(
    get,
    path = "/api/members/{id}/waitlist",
    params(
        ("id" = Uuid, Path, description = "Member id")
    ),
    responses(
        (status = 200, description = "Waitlist spots the member holds",
            body = Vec<WaitlistEntryResponse>),
        (status = 404, description = "Member not found")
    ),
    tag = "members"
)]
pub async fn list_waitlist(
    State(engine): State<Arc<BookingEngine>>,
    Path(member_id): Path<Uuid>,
) -> Result<Response, WebError> {
    let entries = services::list_waitlist(&engine, member_id).await?;

    Ok(Json(entries).into_response())
}
