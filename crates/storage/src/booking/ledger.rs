use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use super::changes::ChangeSet;
use crate::error::{BookingError, BookingResult, Entity};
use crate::models::{Reservation, ReservationStatus};

/// Reservations of a single class.
#[derive(Debug, Clone, Default)]
pub struct ReservationLedger {
    reservations: HashMap<Uuid, Reservation>,
    /// member_id -> reservation_id of the member's confirmed reservation.
    active: HashMap<Uuid, Uuid>,
}

impl ReservationLedger {
    pub fn from_rows(rows: impl IntoIterator<Item = Reservation>) -> BookingResult<Self> {
        let mut ledger = Self::default();
        for row in rows {
            if row.is_confirmed()
                && ledger.active.insert(row.member_id, row.reservation_id).is_some()
            {
                return Err(BookingError::Invariant(format!(
                    "member {} holds two confirmed reservations for class {}",
                    row.member_id, row.class_id
                )));
            }
            ledger.reservations.insert(row.reservation_id, row);
        }
        Ok(ledger)
    }

    pub fn get(&self, reservation_id: Uuid) -> BookingResult<&Reservation> {
        self.reservations
            .get(&reservation_id)
            .ok_or(BookingError::NotFound(Entity::Reservation))
    }

    pub fn active_for(&self, member_id: Uuid) -> Option<&Reservation> {
        self.active
            .get(&member_id)
            .and_then(|id| self.reservations.get(id))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reservation> {
        self.reservations.values()
    }

    pub fn confirmed_ids(&self) -> Vec<Uuid> {
        let mut confirmed: Vec<&Reservation> =
            self.reservations.values().filter(|r| r.is_confirmed()).collect();
        confirmed.sort_by_key(|r| r.created_at);
        confirmed.into_iter().map(|r| r.reservation_id).collect()
    }

    /// Reservations that still hold a seat (anything but cancelled).
    pub fn seats_held(&self) -> usize {
        self.reservations
            .values()
            .filter(|r| r.status.holds_seat())
            .count()
    }

    pub fn create(
        &mut self,
        member_id: Uuid,
        class_id: Uuid,
        from_waitlist: bool,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<Reservation> {
        if self.active.contains_key(&member_id) {
            return Err(BookingError::DuplicateActiveReservation);
        }

        let reservation = Reservation {
            reservation_id: Uuid::new_v4(),
            member_id,
            class_id,
            status: ReservationStatus::Confirmed,
            from_waitlist,
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        };

        self.active.insert(member_id, reservation.reservation_id);
        self.reservations
            .insert(reservation.reservation_id, reservation.clone());
        changes.record_reservation(&reservation);

        Ok(reservation)
    }

    pub fn cancel(
        &mut self,
        reservation_id: Uuid,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<Reservation> {
        let current = self.get(reservation_id)?.status;
        if current.is_terminal() {
            return Err(BookingError::AlreadyTerminal { status: current });
        }
        self.transition(reservation_id, ReservationStatus::Cancelled, now, changes)
    }

    pub fn complete(
        &mut self,
        reservation_id: Uuid,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<Reservation> {
        self.ensure_confirmed(reservation_id)?;
        self.transition(reservation_id, ReservationStatus::Completed, now, changes)
    }

    pub fn mark_noshow(
        &mut self,
        reservation_id: Uuid,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<Reservation> {
        self.ensure_confirmed(reservation_id)?;
        self.transition(reservation_id, ReservationStatus::NoShow, now, changes)
    }

    fn ensure_confirmed(&self, reservation_id: Uuid) -> BookingResult<()> {
        let status = self.get(reservation_id)?.status;
        if status != ReservationStatus::Confirmed {
            return Err(BookingError::NotConfirmed { status });
        }
        Ok(())
    }

    fn transition(
        &mut self,
        reservation_id: Uuid,
        to: ReservationStatus,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<Reservation> {
        let reservation = self
            .reservations
            .get_mut(&reservation_id)
            .ok_or(BookingError::NotFound(Entity::Reservation))?;

        reservation.status = to;
        reservation.updated_at = now;
        if to == ReservationStatus::Cancelled {
            reservation.cancelled_at = Some(now);
        }
        self.active.remove(&reservation.member_id);

        changes.record_reservation(reservation);
        Ok(reservation.clone())
    }
}
