use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text")]
pub enum ReservationStatus {
    #[serde(rename = "confirmada")]
    #[sqlx(rename = "confirmada")]
    Confirmed,
    #[serde(rename = "completada")]
    #[sqlx(rename = "completada")]
    Completed,
    #[serde(rename = "cancelada")]
    #[sqlx(rename = "cancelada")]
    Cancelled,
    #[serde(rename = "noshow")]
    #[sqlx(rename = "noshow")]
    NoShow,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmada",
            Self::Completed => "completada",
            Self::Cancelled => "cancelada",
            Self::NoShow => "noshow",
        }
    }

    /// Completed, cancelled and no-show reservations never change again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Confirmed)
    }

    /// Whether a reservation in this state still occupies a seat.
    pub fn holds_seat(&self) -> bool {
        !matches!(self, Self::Cancelled)
    }
}

impl fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Reservation {
    pub reservation_id: Uuid,
    pub member_id: Uuid,
    pub class_id: Uuid,
    pub status: ReservationStatus,
    pub from_waitlist: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn is_confirmed(&self) -> bool {
        self.status == ReservationStatus::Confirmed
    }
}
