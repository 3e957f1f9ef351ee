use storage::{
    BookingEngine,
    booking::{Actor, BookingOutcome},
    dto::reservation::{AttendanceResponse, BookRequest, BookingResponse, CancellationResponse},
    error::BookingResult,
};
use uuid::Uuid;

/// Books a seat, falling back to the waitlist. Returns whether a seat was
/// confirmed alongside the response.
pub async fn book(
    engine: &BookingEngine,
    request: &BookRequest,
) -> BookingResult<(bool, BookingResponse)> {
    let outcome = engine.book(request.member_id, request.class_id).await?;
    let confirmed = matches!(outcome, BookingOutcome::Confirmed(_));
    Ok((confirmed, BookingResponse::from(outcome)))
}

pub async fn cancel(
    engine: &BookingEngine,
    reservation_id: Uuid,
    actor: Actor,
) -> BookingResult<CancellationResponse> {
    engine
        .cancel_reservation(reservation_id, actor)
        .await
        .map(CancellationResponse::from)
}

pub async fn mark_present(
    engine: &BookingEngine,
    reservation_id: Uuid,
) -> BookingResult<AttendanceResponse> {
    engine
        .mark_present(reservation_id)
        .await
        .map(AttendanceResponse::from)
}

pub async fn mark_absent(
    engine: &BookingEngine,
    reservation_id: Uuid,
) -> BookingResult<AttendanceResponse> {
    engine
        .mark_absent(reservation_id)
        .await
        .map(AttendanceResponse::from)
}
