use storage::{
    BookingEngine,
    dto::{
        common::{PaginatedResponse, PaginationParams},
        member::{CreateMemberRequest, MemberResponse, ReservationFilter},
        reservation::ReservationResponse,
        waitlist::WaitlistEntryResponse,
    },
    error::BookingResult,
};
use uuid::Uuid;

pub async fn create_member(
    engine: &BookingEngine,
    request: CreateMemberRequest,
) -> BookingResult<MemberResponse> {
    let member = engine.register_member(request.into()).await?;
    Ok(MemberResponse::new(member, engine.now(), engine.policy()))
}

/// Member status with the block and no-show counters as of now
pub async fn get_member(engine: &BookingEngine, member_id: Uuid) -> BookingResult<MemberResponse> {
    let member = engine.member(member_id).await?;
    Ok(MemberResponse::new(member, engine.now(), engine.policy()))
}

/// One page of a member's reservation history, newest first
pub async fn list_reservations(
    engine: &BookingEngine,
    member_id: Uuid,
    filter: &ReservationFilter,
    pagination: &PaginationParams,
) -> BookingResult<PaginatedResponse<ReservationResponse>> {
    let reservations = engine.member_reservations(member_id, filter.status).await?;
    let reservations = reservations.into_iter().map(ReservationResponse::from).collect();

    Ok(PaginatedResponse::from_items(reservations, pagination))
}

pub async fn list_waitlist(
    engine: &BookingEngine,
    member_id: Uuid,
) -> BookingResult<Vec<WaitlistEntryResponse>> {
    let entries = engine.member_waitlist(member_id).await?;
    Ok(entries.into_iter().map(WaitlistEntryResponse::from).collect())
}
