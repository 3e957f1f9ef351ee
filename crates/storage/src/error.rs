use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::models::{ClassStatus, MembershipStatus, ReservationStatus, WaitlistStatus};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            StorageError::Database(sqlx::Error::Database(e))
                if e.code().as_deref() == Some("23505")
        )
    }

    /// Replaces a unique-key violation with a `ConstraintViolation`
    /// carrying `message`; any other error is returned unchanged.
    pub fn on_unique_violation(self, message: &str) -> Self {
        if self.is_unique_violation() {
            StorageError::ConstraintViolation(message.to_string())
        } else {
            self
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Member,
    Class,
    Reservation,
    WaitlistEntry,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Member => "Member",
            Self::Class => "Class",
            Self::Reservation => "Reservation",
            Self::WaitlistEntry => "Waitlist entry",
        })
    }
}

/// Coarse classification used by callers to pick a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Validation,
    Conflict,
    Policy,
    Unavailable,
    Internal,
}

/// Every way a booking-core operation can fail.
///
/// None of these leave partial state behind: an operation either commits
/// completely or returns one of these with nothing changed.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("{0} not found")]
    NotFound(Entity),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Class has no free seats")]
    ClassFull,

    #[error("Member already holds a confirmed reservation for this class")]
    DuplicateActiveReservation,

    #[error("Member is already on the waitlist for this class")]
    AlreadyWaiting,

    #[error("Class still has free seats, book it instead")]
    SeatsAvailable,

    #[error("Class does not accept a waitlist")]
    WaitlistDisabled,

    #[error("Email is already registered")]
    EmailTaken,

    #[error("Class is {status}")]
    ClassNotActive { status: ClassStatus },

    #[error("Class has already started")]
    ClassAlreadyStarted,

    #[error("Class has not finished yet")]
    ClassNotFinished,

    #[error("Reservation is already {status}")]
    AlreadyTerminal { status: ReservationStatus },

    #[error("Reservation is {status}, only confirmed reservations can be marked")]
    NotConfirmed { status: ReservationStatus },

    #[error("Waitlist entry is {status}")]
    NotWaiting { status: WaitlistStatus },

    #[error(
        "Reservations can only be cancelled up to {notice_minutes} minutes before the class starts"
    )]
    LateCancellation { notice_minutes: i64 },

    #[error("Member is blocked until {until}")]
    MemberBlocked { until: DateTime<Utc> },

    #[error("Membership is {status}")]
    MembershipInactive { status: MembershipStatus },

    #[error("Timed out waiting for the class lock")]
    LockTimeout,

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl BookingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::ClassFull
            | Self::DuplicateActiveReservation
            | Self::AlreadyWaiting
            | Self::SeatsAvailable
            | Self::WaitlistDisabled
            | Self::EmailTaken
            | Self::ClassNotActive { .. }
            | Self::ClassAlreadyStarted
            | Self::ClassNotFinished
            | Self::AlreadyTerminal { .. }
            | Self::NotConfirmed { .. }
            | Self::NotWaiting { .. } => ErrorKind::Conflict,
            Self::LateCancellation { .. }
            | Self::MemberBlocked { .. }
            | Self::MembershipInactive { .. } => ErrorKind::Policy,
            Self::LockTimeout => ErrorKind::Unavailable,
            Self::Invariant(_) | Self::Storage(_) => ErrorKind::Internal,
        }
    }

    /// Stable machine-readable code for API consumers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::ClassFull => "CLASS_FULL",
            Self::DuplicateActiveReservation => "DUPLICATE_ACTIVE_RESERVATION",
            Self::AlreadyWaiting => "ALREADY_WAITING",
            Self::SeatsAvailable => "SEATS_AVAILABLE",
            Self::WaitlistDisabled => "WAITLIST_DISABLED",
            Self::EmailTaken => "EMAIL_TAKEN",
            Self::ClassNotActive { .. } => "CLASS_NOT_ACTIVE",
            Self::ClassAlreadyStarted => "CLASS_ALREADY_STARTED",
            Self::ClassNotFinished => "CLASS_NOT_FINISHED",
            Self::AlreadyTerminal { .. } => "ALREADY_TERMINAL",
            Self::NotConfirmed { .. } => "NOT_CONFIRMED",
            Self::NotWaiting { .. } => "NOT_WAITING",
            Self::LateCancellation { .. } => "LATE_CANCELLATION",
            Self::MemberBlocked { .. } => "MEMBER_BLOCKED",
            Self::MembershipInactive { .. } => "MEMBERSHIP_INACTIVE",
            Self::LockTimeout => "LOCK_TIMEOUT",
            Self::Invariant(_) => "INVARIANT_VIOLATION",
            Self::Storage(_) => "STORAGE_ERROR",
        }
    }
}

pub type BookingResult<T> = std::result::Result<T, BookingError>;
