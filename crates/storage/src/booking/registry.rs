use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::outcome::{Availability, ClassCancellation};
use super::{BookingEngine, ChangeSet, ClassBook};
use crate::error::{BookingError, BookingResult, Entity};
use crate::models::{ClassSession, ClassStatus, ClassType, Reservation, WaitlistEntry};

/// Definition of a class to schedule.
#[derive(Debug, Clone)]
pub struct NewClass {
    pub name: String,
    pub class_type: ClassType,
    pub instructor_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub capacity: i32,
    pub waitlist_enabled: bool,
}

impl NewClass {
    fn validate(&self) -> BookingResult<()> {
        if self.name.trim().is_empty() {
            return Err(BookingError::Validation("Class name is required".to_string()));
        }
        if self.end_time <= self.start_time {
            return Err(BookingError::Validation(
                "Class must end after it starts".to_string(),
            ));
        }
        if self.capacity < 1 {
            return Err(BookingError::Validation(
                "Capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl BookingEngine {
    pub async fn register_class(&self, definition: NewClass) -> BookingResult<ClassSession> {
        definition.validate()?;

        let session = ClassSession {
            class_id: Uuid::new_v4(),
            name: definition.name.trim().to_string(),
            class_type: definition.class_type,
            instructor_id: definition.instructor_id,
            date: definition.date,
            start_time: definition.start_time,
            end_time: definition.end_time,
            capacity: definition.capacity,
            reserved: 0,
            waitlist_enabled: definition.waitlist_enabled,
            status: ClassStatus::Active,
            created_at: self.clock.now(),
        };

        let mut changes = ChangeSet::default();
        changes.record_class(&session);
        self.commit(&changes).await?;

        self.classes.insert(
            session.class_id,
            Arc::new(Mutex::new(ClassBook::new(session.clone()))),
        );
        tracing::info!(
            "Registered class {} ({}) on {} with {} seats",
            session.class_id,
            session.name,
            session.date,
            session.capacity
        );

        Ok(session)
    }

    /// Any class, whatever its status. Archived classes come from the store.
    pub async fn class(&self, class_id: Uuid) -> BookingResult<ClassSession> {
        match self.read_class(class_id, |book| book.session().clone()).await {
            Err(BookingError::NotFound(Entity::Class)) => self.archived_class(class_id).await,
            result => result,
        }
    }

    /// Seat counts of an active class. Cancelled and completed classes are
    /// reported as not found.
    pub async fn availability(&self, class_id: Uuid) -> BookingResult<Availability> {
        let (status, availability) = self
            .read_class(class_id, |book| (book.session().status, book.availability()))
            .await?;
        if status != ClassStatus::Active {
            return Err(BookingError::NotFound(Entity::Class));
        }
        Ok(availability)
    }

    /// Active classes that have not started and still have a free seat,
    /// earliest first.
    pub async fn list_available(&self) -> BookingResult<Vec<ClassSession>> {
        let now = self.clock.now();
        let mut available = Vec::new();
        for slot in self.class_slots() {
            let book = self.lock(slot).await?;
            let session = book.session();
            if session.status == ClassStatus::Active
                && !session.has_started(now)
                && !session.is_full()
            {
                available.push(session.clone());
            }
        }
        available.sort_by_key(|s| (s.starts_at(), s.name.clone()));
        Ok(available)
    }

    /// Every reservation of a class in booking order.
    pub async fn class_roster(&self, class_id: Uuid) -> BookingResult<Vec<Reservation>> {
        let resident = self
            .read_class(class_id, |book| book.ledger().iter().cloned().collect::<Vec<_>>())
            .await;
        let mut roster = match resident {
            Err(BookingError::NotFound(Entity::Class)) => {
                self.archived_class(class_id).await?;
                self.store.class_reservations(class_id).await?
            }
            result => result?,
        };
        roster.sort_by_key(|r| r.created_at);
        Ok(roster)
    }

    async fn archived_class(&self, class_id: Uuid) -> BookingResult<ClassSession> {
        self.store
            .find_class(class_id)
            .await?
            .ok_or(BookingError::NotFound(Entity::Class))
    }

    /// Members still waiting for a class, front of the queue first.
    pub async fn class_waitlist(&self, class_id: Uuid) -> BookingResult<Vec<WaitlistEntry>> {
        self.read_class(class_id, |book| book.waitlist().waiting().cloned().collect())
            .await
    }

    pub async fn cancel_class(&self, class_id: Uuid) -> BookingResult<ClassCancellation> {
        let now = self.clock.now();
        let cancellation = self
            .transact(class_id, |book, changes| book.cancel_class(now, changes))
            .await?;

        tracing::info!(
            "Cancelled class {}: {} reservations and {} waitlist entries released",
            class_id,
            cancellation.cancelled_reservations.len(),
            cancellation.cancelled_entries.len()
        );
        Ok(cancellation)
    }

    pub async fn complete_class(&self, class_id: Uuid) -> BookingResult<ClassSession> {
        let now = self.clock.now();
        let session = self
            .transact(class_id, |book, changes| {
                book.complete_class(now, changes)?;
                Ok(book.session().clone())
            })
            .await?;

        tracing::info!("Completed class {}", class_id);
        Ok(session)
    }
}
