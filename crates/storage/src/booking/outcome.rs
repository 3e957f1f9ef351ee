use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::BookingError;
use crate::models::{ClassSession, Member, Reservation, WaitlistEntry};

/// Seat counts of one class at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Availability {
    pub class_id: Uuid,
    pub capacity: i32,
    pub reserved: i32,
    pub waitlist_enabled: bool,
    pub waiting: usize,
}

impl Availability {
    pub fn available(&self) -> i32 {
        self.capacity - self.reserved
    }
}

/// Result of a booking request: a seat, or a place in the queue.
#[derive(Debug, Clone, PartialEq)]
pub enum BookingOutcome {
    Confirmed(Reservation),
    Waitlisted(WaitlistEntry),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub entry: WaitlistEntry,
    pub reservation: Reservation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CancellationOutcome {
    pub reservation: Reservation,
    /// The waitlisted member who received the freed seat, if any.
    pub promoted: Option<Promotion>,
    pub availability: Availability,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PenaltyOutcome {
    pub member: Member,
    pub monthly_noshows: u32,
    pub blocked: bool,
    pub blocked_until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceOutcome {
    pub reservation: Reservation,
    /// Present only for no-shows.
    pub penalty: Option<PenaltyOutcome>,
}

#[derive(Debug)]
pub struct BulkItemResult {
    pub reservation_id: Uuid,
    pub result: Result<Reservation, BookingError>,
}

/// Per-reservation results of a bulk attendance call.
#[derive(Debug, Default)]
pub struct BulkAttendanceReport {
    pub items: Vec<BulkItemResult>,
}

impl BulkAttendanceReport {
    pub fn completed(&self) -> usize {
        self.items.iter().filter(|i| i.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.items.len() - self.completed()
    }
}

/// Which reservations a bulk attendance call targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BulkTarget {
    AllConfirmed,
    Reservations(Vec<Uuid>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassCancellation {
    pub session: ClassSession,
    pub cancelled_reservations: Vec<Reservation>,
    pub cancelled_entries: Vec<WaitlistEntry>,
}
