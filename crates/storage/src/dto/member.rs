use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::booking::NewMember;
use crate::models::{Member, MembershipStatus, ReservationStatus};
use crate::services::noshow_policy::BookingPolicy;

/// Request payload for registering a member
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateMemberRequest {
    #[validate(length(
        min = 1,
        max = 150,
        message = "Full name must be between 1 and 150 characters"
    ))]
    pub full_name: String,

    #[validate(email(message = "Email is not valid"))]
    pub email: String,
}

impl From<CreateMemberRequest> for NewMember {
    fn from(req: CreateMemberRequest) -> Self {
        Self {
            full_name: req.full_name,
            email: req.email,
        }
    }
}

/// Member status as seen by the booking core
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MemberResponse {
    pub member_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub membership_status: MembershipStatus,
    pub blocked: bool,
    pub blocked_until: Option<DateTime<Utc>>,
    pub total_noshow: i32,
    /// No-shows counted towards the block threshold right now
    #[serde(rename = "total_noshow_mes")]
    pub noshows_this_period: u32,
    pub created_at: DateTime<Utc>,
}

impl MemberResponse {
    pub fn new(member: Member, now: DateTime<Utc>, policy: &BookingPolicy) -> Self {
        let since = policy.noshow_window.window_start(now);
        Self {
            membership_status: member.effective_status(now),
            blocked: member.is_blocked(now),
            blocked_until: member.blocked_until.filter(|until| now < *until),
            noshows_this_period: member.noshows_since(since),
            member_id: member.member_id,
            full_name: member.full_name,
            email: member.email,
            total_noshow: member.total_noshow,
            created_at: member.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ReservationFilter {
    /// Only reservations in this state
    pub status: Option<ReservationStatus>,
}
