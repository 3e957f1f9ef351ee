use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text")]
pub enum WaitlistStatus {
    #[serde(rename = "esperando")]
    #[sqlx(rename = "esperando")]
    Waiting,
    #[serde(rename = "promovido")]
    #[sqlx(rename = "promovido")]
    Promoted,
    #[serde(rename = "cancelado")]
    #[sqlx(rename = "cancelado")]
    Cancelled,
}

impl WaitlistStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "esperando",
            Self::Promoted => "promovido",
            Self::Cancelled => "cancelado",
        }
    }
}

impl fmt::Display for WaitlistStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A member queued for a seat in a full class.
///
/// `position` is only meaningful while the entry is waiting; it is 1-based
/// and the waiting entries of a class always occupy `1..=N`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct WaitlistEntry {
    pub entry_id: Uuid,
    pub member_id: Uuid,
    pub class_id: Uuid,
    pub position: i32,
    pub status: WaitlistStatus,
    pub joined_at: DateTime<Utc>,
    pub promoted_at: Option<DateTime<Utc>>,
}

impl WaitlistEntry {
    pub fn is_waiting(&self) -> bool {
        self.status == WaitlistStatus::Waiting
    }
}
