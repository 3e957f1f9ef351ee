use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text")]
pub enum MembershipStatus {
    #[serde(rename = "activa")]
    #[sqlx(rename = "activa")]
    Active,
    #[serde(rename = "inactiva")]
    #[sqlx(rename = "inactiva")]
    Inactive,
    #[serde(rename = "suspendida")]
    #[sqlx(rename = "suspendida")]
    Suspended,
}

impl MembershipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "activa",
            Self::Inactive => "inactiva",
            Self::Suspended => "suspendida",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub member_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub membership_status: MembershipStatus,
    pub blocked_until: Option<DateTime<Utc>>,
    /// Lifetime no-show count; never reset.
    pub total_noshow: i32,
    pub created_at: DateTime<Utc>,
    /// No-shows still inside the policy window, oldest first.
    #[sqlx(skip)]
    #[serde(skip)]
    pub recent_noshows: Vec<DateTime<Utc>>,
}

impl Member {
    pub fn is_blocked(&self, now: DateTime<Utc>) -> bool {
        self.blocked_until.is_some_and(|until| now < until)
    }

    /// Status as seen at `now`: a suspension whose block has elapsed reads as active.
    pub fn effective_status(&self, now: DateTime<Utc>) -> MembershipStatus {
        match self.membership_status {
            MembershipStatus::Suspended if !self.is_blocked(now) => MembershipStatus::Active,
            status => status,
        }
    }

    pub fn noshows_since(&self, since: DateTime<Utc>) -> u32 {
        self.recent_noshows.iter().filter(|at| **at >= since).count() as u32
    }
}

/// One recorded no-show, kept so the monthly count survives restarts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct NoShowRecord {
    pub reservation_id: Uuid,
    pub member_id: Uuid,
    pub recorded_at: DateTime<Utc>,
}
