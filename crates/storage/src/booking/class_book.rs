use chrono::{DateTime, Duration, Utc};
use std::collections::HashSet;
use uuid::Uuid;

use super::changes::ChangeSet;
use super::ledger::ReservationLedger;
use super::outcome::{
    Availability, BookingOutcome, CancellationOutcome, ClassCancellation, Promotion,
};
use super::waitlist::WaitlistQueue;
use crate::error::{BookingError, BookingResult};
use crate::models::{
    ClassSession, ClassStatus, NotificationIntent, NotificationKind, Reservation, WaitlistEntry,
};

/// Everything the booking core knows about one class: the session with its
/// seat counter, the reservation ledger and the waitlist.
///
/// All seat-affecting operations of a class go through this type, and the
/// caller holds the class lock while they run. Methods either succeed and
/// record what they touched in the [`ChangeSet`], or fail and leave `self`
/// in an unspecified state; callers work on a clone.
#[derive(Debug, Clone)]
pub struct ClassBook {
    session: ClassSession,
    ledger: ReservationLedger,
    waitlist: WaitlistQueue,
}

impl ClassBook {
    pub fn new(session: ClassSession) -> Self {
        Self {
            session,
            ledger: ReservationLedger::default(),
            waitlist: WaitlistQueue::default(),
        }
    }

    /// Rebuilds a class from persisted rows and audits the result.
    pub fn from_rows(
        session: ClassSession,
        reservations: Vec<Reservation>,
        entries: Vec<WaitlistEntry>,
    ) -> BookingResult<Self> {
        let book = Self {
            session,
            ledger: ReservationLedger::from_rows(reservations)?,
            waitlist: WaitlistQueue::from_rows(entries)?,
        };
        book.audit()?;
        Ok(book)
    }

    pub fn class_id(&self) -> Uuid {
        self.session.class_id
    }

    pub fn session(&self) -> &ClassSession {
        &self.session
    }

    pub fn ledger(&self) -> &ReservationLedger {
        &self.ledger
    }

    pub fn waitlist(&self) -> &WaitlistQueue {
        &self.waitlist
    }

    pub fn availability(&self) -> Availability {
        Availability {
            class_id: self.session.class_id,
            capacity: self.session.capacity,
            reserved: self.session.reserved,
            waitlist_enabled: self.session.waitlist_enabled,
            waiting: self.waitlist.waiting_len(),
        }
    }

    pub fn book(
        &mut self,
        member_id: Uuid,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<BookingOutcome> {
        self.ensure_open_for_booking(now)?;
        self.ensure_not_holding(member_id)?;

        if !self.session.is_full() {
            return self.confirm(member_id, false, now, changes).map(BookingOutcome::Confirmed);
        }

        if !self.session.waitlist_enabled {
            return Err(BookingError::ClassFull);
        }

        let entry = self
            .waitlist
            .join(member_id, self.session.class_id, now, changes)?;
        Ok(BookingOutcome::Waitlisted(entry))
    }

    pub fn join_waitlist(
        &mut self,
        member_id: Uuid,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<WaitlistEntry> {
        self.ensure_open_for_booking(now)?;
        self.ensure_not_holding(member_id)?;

        if !self.session.waitlist_enabled {
            return Err(BookingError::WaitlistDisabled);
        }
        if !self.session.is_full() {
            return Err(BookingError::SeatsAvailable);
        }

        self.waitlist
            .join(member_id, self.session.class_id, now, changes)
    }

    /// Cancels a confirmed reservation and hands the seat to the front of
    /// the waitlist. `notice` is the minimum lead time before class start,
    /// `None` when the caller is exempt.
    pub fn cancel_reservation(
        &mut self,
        reservation_id: Uuid,
        now: DateTime<Utc>,
        notice: Option<Duration>,
        changes: &mut ChangeSet,
    ) -> BookingResult<CancellationOutcome> {
        let status = self.ledger.get(reservation_id)?.status;
        if status.is_terminal() {
            return Err(BookingError::AlreadyTerminal { status });
        }
        if let Some(notice) = notice
            && now > self.session.starts_at() - notice
        {
            return Err(BookingError::LateCancellation {
                notice_minutes: notice.num_minutes(),
            });
        }

        let reservation = self.ledger.cancel(reservation_id, now, changes)?;
        self.release_seat(changes)?;

        let promoted = if self.session.status == ClassStatus::Active
            && !self.session.has_started(now)
        {
            self.promote_next(now, changes)?
        } else {
            None
        };

        Ok(CancellationOutcome {
            reservation,
            promoted,
            availability: self.availability(),
        })
    }

    pub fn leave_waitlist(
        &mut self,
        entry_id: Uuid,
        changes: &mut ChangeSet,
    ) -> BookingResult<WaitlistEntry> {
        self.waitlist.leave(entry_id, changes)
    }

    pub fn complete_reservation(
        &mut self,
        reservation_id: Uuid,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<Reservation> {
        self.ensure_markable(reservation_id, now)?;
        self.ledger.complete(reservation_id, now, changes)
    }

    /// Marks a no-show. The seat stays counted: the class is over.
    pub fn mark_noshow(
        &mut self,
        reservation_id: Uuid,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<Reservation> {
        self.ensure_markable(reservation_id, now)?;
        self.ledger.mark_noshow(reservation_id, now, changes)
    }

    /// Cancels a class that has not started yet. Once it has started,
    /// attendance and penalties belong to it and it can only be completed.
    pub fn cancel_class(
        &mut self,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<ClassCancellation> {
        self.ensure_open_for_booking(now)?;

        let mut cancelled_reservations = Vec::new();
        for reservation_id in self.ledger.confirmed_ids() {
            let reservation = self.ledger.cancel(reservation_id, now, changes)?;
            self.release_seat(changes)?;
            changes.notify(NotificationIntent::new(
                reservation.member_id,
                Some(self.session.class_id),
                NotificationKind::ClassCancelled,
                format!("{} on {} has been cancelled.", self.session.name, self.session.date),
                now,
            ));
            cancelled_reservations.push(reservation);
        }

        let cancelled_entries = self.waitlist.cancel_all(changes);
        for entry in &cancelled_entries {
            changes.notify(NotificationIntent::new(
                entry.member_id,
                Some(self.session.class_id),
                NotificationKind::ClassCancelled,
                format!(
                    "{} on {} has been cancelled; you were removed from its waitlist.",
                    self.session.name, self.session.date
                ),
                now,
            ));
        }

        self.session.status = ClassStatus::Cancelled;
        changes.record_class(&self.session);

        Ok(ClassCancellation {
            session: self.session.clone(),
            cancelled_reservations,
            cancelled_entries,
        })
    }

    /// Closes a finished class. Whoever is still waiting will not get a seat.
    pub fn complete_class(
        &mut self,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<()> {
        if self.session.status != ClassStatus::Active {
            return Err(BookingError::ClassNotActive {
                status: self.session.status,
            });
        }
        if !self.session.has_finished(now) {
            return Err(BookingError::ClassNotFinished);
        }

        self.waitlist.cancel_all(changes);
        self.session.status = ClassStatus::Completed;
        changes.record_class(&self.session);
        Ok(())
    }

    /// Re-derives the seat counter from the ledger and checks every
    /// per-class invariant. Only used for audits, never on the hot path.
    pub fn audit(&self) -> BookingResult<()> {
        let session = &self.session;
        if session.reserved < 0 || session.reserved > session.capacity {
            return Err(BookingError::Invariant(format!(
                "class {} has {} reserved seats out of {}",
                session.class_id, session.reserved, session.capacity
            )));
        }

        let held = self.ledger.seats_held() as i32;
        if held != session.reserved {
            return Err(BookingError::Invariant(format!(
                "class {} counter says {} reserved but the ledger holds {}",
                session.class_id, session.reserved, held
            )));
        }

        self.waitlist.check_contiguous()?;

        let mut waiting = HashSet::new();
        for entry in self.waitlist.waiting() {
            if !waiting.insert(entry.member_id) {
                return Err(BookingError::Invariant(format!(
                    "member {} is waiting twice for class {}",
                    entry.member_id, session.class_id
                )));
            }
            if self.ledger.active_for(entry.member_id).is_some() {
                return Err(BookingError::Invariant(format!(
                    "member {} is both booked and waiting for class {}",
                    entry.member_id, session.class_id
                )));
            }
        }

        Ok(())
    }

    fn confirm(
        &mut self,
        member_id: Uuid,
        from_waitlist: bool,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<Reservation> {
        let reservation = self
            .ledger
            .create(member_id, self.session.class_id, from_waitlist, now, changes)?;
        self.take_seat(changes)?;
        Ok(reservation)
    }

    fn promote_next(
        &mut self,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<Option<Promotion>> {
        let Some(entry) = self.waitlist.promote_next(now, changes) else {
            return Ok(None);
        };

        let reservation = self.confirm(entry.member_id, true, now, changes)?;
        changes.notify(NotificationIntent::new(
            entry.member_id,
            Some(self.session.class_id),
            NotificationKind::SeatAvailable,
            format!(
                "A seat opened up in {} on {} at {}; your reservation is confirmed.",
                self.session.name, self.session.date, self.session.start_time
            ),
            now,
        ));

        Ok(Some(Promotion { entry, reservation }))
    }

    fn take_seat(&mut self, changes: &mut ChangeSet) -> BookingResult<()> {
        if self.session.is_full() {
            return Err(BookingError::Invariant(format!(
                "class {} would exceed its {} seats",
                self.session.class_id, self.session.capacity
            )));
        }
        self.session.reserved += 1;
        changes.record_class(&self.session);
        Ok(())
    }

    fn release_seat(&mut self, changes: &mut ChangeSet) -> BookingResult<()> {
        if self.session.reserved <= 0 {
            return Err(BookingError::Invariant(format!(
                "class {} has no reserved seat to release",
                self.session.class_id
            )));
        }
        self.session.reserved -= 1;
        changes.record_class(&self.session);
        Ok(())
    }

    fn ensure_open_for_booking(&self, now: DateTime<Utc>) -> BookingResult<()> {
        if self.session.status != ClassStatus::Active {
            return Err(BookingError::ClassNotActive {
                status: self.session.status,
            });
        }
        if self.session.has_started(now) {
            return Err(BookingError::ClassAlreadyStarted);
        }
        Ok(())
    }

    fn ensure_not_holding(&self, member_id: Uuid) -> BookingResult<()> {
        if self.ledger.active_for(member_id).is_some() {
            return Err(BookingError::DuplicateActiveReservation);
        }
        if self.waitlist.is_waiting(member_id) {
            return Err(BookingError::AlreadyWaiting);
        }
        Ok(())
    }

    fn ensure_markable(&self, reservation_id: Uuid, now: DateTime<Utc>) -> BookingResult<()> {
        let status = self.ledger.get(reservation_id)?.status;
        if status.is_terminal() {
            return Err(BookingError::NotConfirmed { status });
        }
        if !self.session.has_finished(now) {
            return Err(BookingError::ClassNotFinished);
        }
        Ok(())
    }
}
