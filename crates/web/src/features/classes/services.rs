use storage::{
    BookingEngine,
    booking::BulkTarget,
    dto::{
        class::{
            AvailabilityResponse, BulkAttendanceResponse, ClassCancellationResponse, ClassResponse,
            CreateClassRequest,
        },
        reservation::ReservationResponse,
        waitlist::WaitlistEntryResponse,
    },
    error::BookingResult,
};
use uuid::Uuid;

/// Classes open for booking, earliest first
pub async fn list_available(engine: &BookingEngine) -> BookingResult<Vec<ClassResponse>> {
    let classes = engine.list_available().await?;
    Ok(classes.into_iter().map(ClassResponse::from).collect())
}

pub async fn get_availability(
    engine: &BookingEngine,
    class_id: Uuid,
) -> BookingResult<AvailabilityResponse> {
    engine.availability(class_id).await.map(AvailabilityResponse::from)
}

pub async fn get_waitlist(
    engine: &BookingEngine,
    class_id: Uuid,
) -> BookingResult<Vec<WaitlistEntryResponse>> {
    let entries = engine.class_waitlist(class_id).await?;
    Ok(entries.into_iter().map(WaitlistEntryResponse::from).collect())
}

pub async fn create_class(
    engine: &BookingEngine,
    request: CreateClassRequest,
) -> BookingResult<ClassResponse> {
    engine.register_class(request.into()).await.map(ClassResponse::from)
}

pub async fn get_roster(
    engine: &BookingEngine,
    class_id: Uuid,
) -> BookingResult<Vec<ReservationResponse>> {
    let roster = engine.class_roster(class_id).await?;
    Ok(roster.into_iter().map(ReservationResponse::from).collect())
}

pub async fn cancel_class(
    engine: &BookingEngine,
    class_id: Uuid,
) -> BookingResult<ClassCancellationResponse> {
    engine.cancel_class(class_id).await.map(ClassCancellationResponse::from)
}

pub async fn complete_class(
    engine: &BookingEngine,
    class_id: Uuid,
) -> BookingResult<ClassResponse> {
    engine.complete_class(class_id).await.map(ClassResponse::from)
}

pub async fn mark_attendance(
    engine: &BookingEngine,
    class_id: Uuid,
    target: BulkTarget,
) -> BookingResult<BulkAttendanceResponse> {
    engine
        .mark_present_bulk(class_id, target)
        .await
        .map(BulkAttendanceResponse::from)
}
