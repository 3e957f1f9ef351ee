use storage::{
    BookingEngine,
    booking::Actor,
    dto::waitlist::{JoinWaitlistRequest, WaitlistEntryResponse},
    error::BookingResult,
};
use uuid::Uuid;

pub async fn join(
    engine: &BookingEngine,
    request: &JoinWaitlistRequest,
) -> BookingResult<WaitlistEntryResponse> {
    engine
        .join_waitlist(request.member_id, request.class_id)
        .await
        .map(WaitlistEntryResponse::from)
}

pub async fn leave(
    engine: &BookingEngine,
    entry_id: Uuid,
    member_id: Uuid,
) -> BookingResult<WaitlistEntryResponse> {
    engine
        .leave_waitlist(entry_id, Actor::Member(member_id))
        .await
        .map(WaitlistEntryResponse::from)
}
