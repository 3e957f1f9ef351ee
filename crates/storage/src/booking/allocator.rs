use uuid::Uuid;

use super::outcome::{BookingOutcome, CancellationOutcome};
use super::BookingEngine;
use crate::error::{BookingError, BookingResult, Entity};
use crate::models::{NotificationIntent, NotificationKind, WaitlistEntry};
use crate::services::noshow_policy::ensure_can_book;

/// Who is asking for a cancellation or a waitlist exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    /// The member themselves: bound by the cancellation notice and only
    /// allowed to touch their own records.
    Member(Uuid),
    Admin,
}

impl Actor {
    fn owns(&self, member_id: Uuid) -> bool {
        match self {
            Self::Member(id) => *id == member_id,
            Self::Admin => true,
        }
    }
}

impl BookingEngine {
    /// Takes a seat if one is free, otherwise queues the member when the
    /// class allows it.
    pub async fn book(&self, member_id: Uuid, class_id: Uuid) -> BookingResult<BookingOutcome> {
        let now = self.clock.now();
        let member = self.member(member_id).await?;
        ensure_can_book(&member, now)?;

        let outcome = self
            .transact(class_id, |book, changes| {
                let outcome = book.book(member_id, now, changes)?;
                if let BookingOutcome::Confirmed(reservation) = &outcome {
                    let session = book.session();
                    changes.notify(NotificationIntent::new(
                        reservation.member_id,
                        Some(session.class_id),
                        NotificationKind::ReservationConfirmed,
                        format!(
                            "Your seat in {} on {} at {} is confirmed.",
                            session.name, session.date, session.start_time
                        ),
                        now,
                    ));
                }
                Ok(outcome)
            })
            .await?;

        match &outcome {
            BookingOutcome::Confirmed(reservation) => tracing::info!(
                "Member {} booked class {} (reservation {})",
                member_id,
                class_id,
                reservation.reservation_id
            ),
            BookingOutcome::Waitlisted(entry) => tracing::info!(
                "Class {} is full, member {} waitlisted at position {}",
                class_id,
                member_id,
                entry.position
            ),
        }

        Ok(outcome)
    }

    pub async fn join_waitlist(
        &self,
        member_id: Uuid,
        class_id: Uuid,
    ) -> BookingResult<WaitlistEntry> {
        let now = self.clock.now();
        let member = self.member(member_id).await?;
        ensure_can_book(&member, now)?;

        let entry = self
            .transact(class_id, |book, changes| book.join_waitlist(member_id, now, changes))
            .await?;

        tracing::info!(
            "Member {} joined the waitlist of class {} at position {}",
            member_id,
            class_id,
            entry.position
        );
        Ok(entry)
    }

    /// Cancels a confirmed reservation and promotes the first waiting member.
    ///
    /// Members must cancel at least the policy's notice before the class
    /// starts; administrators are exempt.
    pub async fn cancel_reservation(
        &self,
        reservation_id: Uuid,
        actor: Actor,
    ) -> BookingResult<CancellationOutcome> {
        let now = self.clock.now();
        let class_id = self.class_of_reservation(reservation_id)?;
        let notice = match actor {
            Actor::Member(_) => Some(self.policy.cancellation_notice),
            Actor::Admin => None,
        };

        let outcome = self
            .transact(class_id, |book, changes| {
                let owner = book.ledger().get(reservation_id)?.member_id;
                if !actor.owns(owner) {
                    return Err(BookingError::NotFound(Entity::Reservation));
                }
                book.cancel_reservation(reservation_id, now, notice, changes)
            })
            .await?;

        match &outcome.promoted {
            Some(promotion) => tracing::info!(
                "Reservation {} cancelled, member {} promoted from the waitlist of class {}",
                reservation_id,
                promotion.entry.member_id,
                class_id
            ),
            None => tracing::info!(
                "Reservation {} cancelled, class {} now has {} free seats",
                reservation_id,
                class_id,
                outcome.availability.available()
            ),
        }

        Ok(outcome)
    }

    /// Removes a waiting entry and closes the gap it leaves in the queue.
    pub async fn leave_waitlist(
        &self,
        entry_id: Uuid,
        actor: Actor,
    ) -> BookingResult<WaitlistEntry> {
        let class_id = self.class_of_entry(entry_id)?;

        let entry = self
            .transact(class_id, |book, changes| {
                let owner = book.waitlist().get(entry_id)?.member_id;
                if !actor.owns(owner) {
                    return Err(BookingError::NotFound(Entity::WaitlistEntry));
                }
                book.leave_waitlist(entry_id, changes)
            })
            .await?;

        tracing::info!("Member {} left the waitlist of class {}", entry.member_id, class_id);
        Ok(entry)
    }
}
