use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::booking::{Availability, BulkAttendanceReport, BulkTarget, ClassCancellation, NewClass};
use crate::models::{ClassSession, ClassStatus, ClassType, ReservationStatus};

fn default_waitlist_enabled() -> bool {
    true
}

/// Request payload for scheduling a class
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateClassRequest {
    #[validate(length(
        min = 1,
        max = 100,
        message = "Name must be between 1 and 100 characters"
    ))]
    pub name: String,

    pub class_type: ClassType,

    pub instructor_id: Option<Uuid>,

    pub date: NaiveDate,

    #[schema(value_type = String, example = "18:00:00")]
    pub start_time: NaiveTime,

    #[schema(value_type = String, example = "19:00:00")]
    pub end_time: NaiveTime,

    #[validate(range(min = 1, max = 500, message = "Capacity must be between 1 and 500"))]
    pub capacity: i32,

    #[serde(default = "default_waitlist_enabled")]
    pub waitlist_enabled: bool,
}

impl CreateClassRequest {
    /// Additional validation that requires multiple fields
    pub fn validate_schedule(&self) -> Result<(), &'static str> {
        if self.end_time <= self.start_time {
            return Err("End time must be after start time");
        }
        Ok(())
    }
}

impl From<CreateClassRequest> for NewClass {
    fn from(req: CreateClassRequest) -> Self {
        Self {
            name: req.name,
            class_type: req.class_type,
            instructor_id: req.instructor_id,
            date: req.date,
            start_time: req.start_time,
            end_time: req.end_time,
            capacity: req.capacity,
            waitlist_enabled: req.waitlist_enabled,
        }
    }
}

/// Response containing class details and its seat counts
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassResponse {
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
    pub available_seats: i32,
    pub waitlist_enabled: bool,
    pub status: ClassStatus,
    pub created_at: DateTime<Utc>,
}

impl From<ClassSession> for ClassResponse {
    fn from(session: ClassSession) -> Self {
        Self {
            available_seats: session.available_seats(),
            class_id: session.class_id,
            name: session.name,
            class_type: session.class_type,
            instructor_id: session.instructor_id,
            date: session.date,
            start_time: session.start_time,
            end_time: session.end_time,
            capacity: session.capacity,
            reserved: session.reserved,
            waitlist_enabled: session.waitlist_enabled,
            status: session.status,
            created_at: session.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AvailabilityResponse {
    pub class_id: Uuid,
    pub capacity: i32,
    pub reserved: i32,
    pub available_seats: i32,
    pub waitlist_enabled: bool,
    /// Members currently waiting
    pub waiting: usize,
}

impl From<Availability> for AvailabilityResponse {
    fn from(availability: Availability) -> Self {
        Self {
            class_id: availability.class_id,
            capacity: availability.capacity,
            reserved: availability.reserved,
            available_seats: availability.available(),
            waitlist_enabled: availability.waitlist_enabled,
            waiting: availability.waiting,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ClassCancellationResponse {
    pub class: ClassResponse,
    pub cancelled_reservations: usize,
    pub cancelled_waitlist_entries: usize,
}

impl From<ClassCancellation> for ClassCancellationResponse {
    fn from(cancellation: ClassCancellation) -> Self {
        Self {
            cancelled_reservations: cancellation.cancelled_reservations.len(),
            cancelled_waitlist_entries: cancellation.cancelled_entries.len(),
            class: ClassResponse::from(cancellation.session),
        }
    }
}

/// Request payload for bulk attendance: either `{"all": true}` for every
/// confirmed reservation of the class, or an explicit `reservation_ids` list.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BulkAttendanceRequest {
    #[serde(default)]
    pub all: bool,

    #[validate(length(min = 1, message = "Provide at least one reservation id"))]
    pub reservation_ids: Option<Vec<Uuid>>,
}

impl BulkAttendanceRequest {
    pub fn target(self) -> Result<BulkTarget, &'static str> {
        match (self.all, self.reservation_ids) {
            (true, None) => Ok(BulkTarget::AllConfirmed),
            (false, Some(ids)) => Ok(BulkTarget::Reservations(ids)),
            (true, Some(_)) => Err("Send either `all` or `reservation_ids`, not both"),
            (false, None) => Err("Send `all: true` or a list of `reservation_ids`"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkAttendanceItem {
    pub reservation_id: Uuid,
    pub success: bool,
    pub status: Option<ReservationStatus>,
    pub error: Option<String>,
    pub code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BulkAttendanceResponse {
    pub completed: usize,
    pub failed: usize,
    pub items: Vec<BulkAttendanceItem>,
}

impl From<BulkAttendanceReport> for BulkAttendanceResponse {
    fn from(report: BulkAttendanceReport) -> Self {
        let completed = report.completed();
        let failed = report.failed();
        let items = report
            .items
            .into_iter()
            .map(|item| match item.result {
                Ok(reservation) => BulkAttendanceItem {
                    reservation_id: item.reservation_id,
                    success: true,
                    status: Some(reservation.status),
                    error: None,
                    code: None,
                },
                Err(e) => BulkAttendanceItem {
                    reservation_id: item.reservation_id,
                    success: false,
                    status: None,
                    code: Some(e.code().to_string()),
                    error: Some(e.to_string()),
                },
            })
            .collect();

        Self {
            completed,
            failed,
            items,
        }
    }
}
