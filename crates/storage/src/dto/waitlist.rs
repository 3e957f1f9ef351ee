use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{WaitlistEntry, WaitlistStatus};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct JoinWaitlistRequest {
    pub member_id: Uuid,
    pub class_id: Uuid,
}

/// Identifies the member leaving their own waitlist spot
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LeaveWaitlistRequest {
    pub member_id: Uuid,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WaitlistEntryResponse {
    pub entry_id: Uuid,
    pub member_id: Uuid,
    pub class_id: Uuid,
    /// 1-based place in the queue while waiting
    pub position: i32,
    pub status: WaitlistStatus,
    pub joined_at: DateTime<Utc>,
    pub promoted_at: Option<DateTime<Utc>>,
}

impl From<WaitlistEntry> for WaitlistEntryResponse {
    fn from(e: WaitlistEntry) -> Self {
        Self {
            entry_id: e.entry_id,
            member_id: e.member_id,
            class_id: e.class_id,
            position: e.position,
            status: e.status,
            joined_at: e.joined_at,
            promoted_at: e.promoted_at,
        }
    }
}
