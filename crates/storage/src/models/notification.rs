use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    ReservationConfirmed,
    SeatAvailable,
    NoshowRecorded,
    NoshowWarning,
    AccountBlocked,
    ClassCancelled,
}

/// A decision that a member should be told something.
///
/// Intents are written to the outbox in the same commit as the state change
/// that produced them; delivering them is someone else's job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct NotificationIntent {
    pub notification_id: Uuid,
    pub member_id: Uuid,
    pub class_id: Option<Uuid>,
    pub kind: NotificationKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl NotificationIntent {
    pub fn new(
        member_id: Uuid,
        class_id: Option<Uuid>,
        kind: NotificationKind,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            notification_id: Uuid::new_v4(),
            member_id,
            class_id,
            kind,
            message: message.into(),
            created_at,
        }
    }
}
