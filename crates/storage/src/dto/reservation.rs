use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::waitlist::WaitlistEntryResponse;
use crate::booking::{AttendanceOutcome, BookingOutcome, CancellationOutcome, PenaltyOutcome};
use crate::models::{Reservation, ReservationStatus};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookRequest {
    pub member_id: Uuid,
    pub class_id: Uuid,
}

/// Identifies the member asking to cancel their own reservation
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CancelReservationRequest {
    pub member_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationResponse {
    pub reservation_id: Uuid,
    pub member_id: Uuid,
    pub class_id: Uuid,
    pub status: ReservationStatus,
    pub from_waitlist: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            reservation_id: r.reservation_id,
            member_id: r.member_id,
            class_id: r.class_id,
            status: r.status,
            from_waitlist: r.from_waitlist,
            created_at: r.created_at,
            updated_at: r.updated_at,
            cancelled_at: r.cancelled_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BookingKind {
    Confirmed,
    Waitlisted,
}

/// Either a confirmed seat or a place on the waitlist
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BookingResponse {
    pub result: BookingKind,
    pub reservation: Option<ReservationResponse>,
    pub waitlist_entry: Option<WaitlistEntryResponse>,
}

impl From<BookingOutcome> for BookingResponse {
    fn from(outcome: BookingOutcome) -> Self {
        match outcome {
            BookingOutcome::Confirmed(reservation) => Self {
                result: BookingKind::Confirmed,
                reservation: Some(reservation.into()),
                waitlist_entry: None,
            },
            BookingOutcome::Waitlisted(entry) => Self {
                result: BookingKind::Waitlisted,
                reservation: None,
                waitlist_entry: Some(entry.into()),
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CancellationResponse {
    pub reservation: ReservationResponse,
    /// Reservation created for the member promoted into the freed seat
    pub promoted: Option<ReservationResponse>,
    pub reserved: i32,
    pub available_seats: i32,
    pub waiting: usize,
}

impl From<CancellationOutcome> for CancellationResponse {
    fn from(outcome: CancellationOutcome) -> Self {
        Self {
            reservation: outcome.reservation.into(),
            promoted: outcome.promoted.map(|p| p.reservation.into()),
            reserved: outcome.availability.reserved,
            available_seats: outcome.availability.available(),
            waiting: outcome.availability.waiting,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PenaltyResponse {
    pub member_id: Uuid,
    #[serde(rename = "total_noshow_mes")]
    pub monthly_noshows: u32,
    pub total_noshow: i32,
    pub blocked: bool,
    pub blocked_until: Option<DateTime<Utc>>,
}

impl From<PenaltyOutcome> for PenaltyResponse {
    fn from(p: PenaltyOutcome) -> Self {
        Self {
            member_id: p.member.member_id,
            monthly_noshows: p.monthly_noshows,
            total_noshow: p.member.total_noshow,
            blocked: p.blocked,
            blocked_until: p.blocked_until,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AttendanceResponse {
    pub reservation: ReservationResponse,
    pub penalty: Option<PenaltyResponse>,
}

impl From<AttendanceOutcome> for AttendanceResponse {
    fn from(outcome: AttendanceOutcome) -> Self {
        Self {
            reservation: outcome.reservation.into(),
            penalty: outcome.penalty.map(PenaltyResponse::from),
        }
    }
}

impl From<Reservation> for AttendanceResponse {
    fn from(reservation: Reservation) -> Self {
        Self {
            reservation: reservation.into(),
            penalty: None,
        }
    }
}
