use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ClassType {
    Spinning,
    Yoga,
    Pilates,
    Musculacion,
    Cardio,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text")]
pub enum ClassStatus {
    #[serde(rename = "activa")]
    #[sqlx(rename = "activa")]
    Active,
    #[serde(rename = "cancelada")]
    #[sqlx(rename = "cancelada")]
    Cancelled,
    #[serde(rename = "completada")]
    #[sqlx(rename = "completada")]
    Completed,
}

impl ClassStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "activa",
            Self::Cancelled => "cancelada",
            Self::Completed => "completada",
        }
    }
}

impl fmt::Display for ClassStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled class with a fixed number of seats.
///
/// `reserved` is maintained incrementally by the booking core and always
/// equals the number of this class' reservations that are not cancelled.
/// Schedule fields are wall-clock values interpreted as UTC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ClassSession {
    pub class_id: Uuid,
    pub name: String,
    pub class_type: ClassType,
    pub instructor_id: Option<Uuid>,
    pub date: NaiveDate,
    #[schema(value_type = String, example = "18:00:00")]
    pub start_time: NaiveTime,
    #[schema(value_type = String, example = "19:00:00")]
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub reserved: i32,
    pub waitlist_enabled: bool,
    pub status: ClassStatus,
    pub created_at: DateTime<Utc>,
}

impl ClassSession {
    pub fn starts_at(&self) -> DateTime<Utc> {
        self.date.and_time(self.start_time).and_utc()
    }

    pub fn ends_at(&self) -> DateTime<Utc> {
        self.date.and_time(self.end_time).and_utc()
    }

    pub fn available_seats(&self) -> i32 {
        self.capacity - self.reserved
    }

    pub fn is_full(&self) -> bool {
        self.reserved >= self.capacity
    }

    pub fn has_started(&self, now: DateTime<Utc>) -> bool {
        now >= self.starts_at()
    }

    pub fn has_finished(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at()
    }

    /// Closed and dated before `cutoff`: no longer kept in memory.
    pub fn is_archived(&self, cutoff: NaiveDate) -> bool {
        self.status != ClassStatus::Active && self.date < cutoff
    }
}
