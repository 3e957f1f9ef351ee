use uuid::Uuid;

use super::outcome::{
    AttendanceOutcome, BulkAttendanceReport, BulkItemResult, BulkTarget, PenaltyOutcome,
};
use super::{BookingEngine, ChangeSet};
use crate::error::{BookingError, BookingResult, Entity};
use crate::models::{NoShowRecord, NotificationIntent, NotificationKind, Reservation};
use crate::services::noshow_policy::record_noshow;

impl BookingEngine {
    /// Records that the member attended.
    pub async fn mark_present(&self, reservation_id: Uuid) -> BookingResult<Reservation> {
        let now = self.clock.now();
        let class_id = self.class_of_reservation(reservation_id)?;

        let reservation = self
            .transact(class_id, |book, changes| {
                book.complete_reservation(reservation_id, now, changes)
            })
            .await?;

        tracing::debug!("Reservation {} marked present", reservation_id);
        Ok(reservation)
    }

    /// Records a no-show and applies the penalty policy to the member.
    ///
    /// The reservation, the member's counters and any block are committed
    /// together.
    pub async fn mark_absent(&self, reservation_id: Uuid) -> BookingResult<AttendanceOutcome> {
        let now = self.clock.now();
        let class_id = self.class_of_reservation(reservation_id)?;

        let mut live_class = self.lock_class(class_id).await?;
        let mut class_draft = live_class.clone();
        let mut changes = ChangeSet::default();

        let reservation = class_draft.mark_noshow(reservation_id, now, &mut changes)?;
        class_draft.audit()?;

        let member_slot = self.member_slot(reservation.member_id)?;
        let mut live_member = self.lock(member_slot).await?;
        let mut member = live_member.clone();

        let decision = record_noshow(&mut member, now, &self.policy);
        changes.record_member(&member);
        changes.noshows.push(NoShowRecord {
            reservation_id,
            member_id: member.member_id,
            recorded_at: now,
        });

        let session = class_draft.session();
        changes.notify(NotificationIntent::new(
            member.member_id,
            Some(class_id),
            NotificationKind::NoshowRecorded,
            format!(
                "You missed {} on {}. No-shows this period: {}.",
                session.name, session.date, decision.monthly_noshows
            ),
            now,
        ));
        if decision.warn {
            changes.notify(NotificationIntent::new(
                member.member_id,
                Some(class_id),
                NotificationKind::NoshowWarning,
                "One more no-show this period will block new bookings.",
                now,
            ));
        }
        if let Some(until) = decision.blocked_until {
            changes.notify(NotificationIntent::new(
                member.member_id,
                Some(class_id),
                NotificationKind::AccountBlocked,
                format!("New bookings are blocked until {}.", until.to_rfc3339()),
                now,
            ));
        }

        self.commit(&changes).await?;
        *live_member = member.clone();
        *live_class = class_draft;
        self.publish(&changes);
        drop(live_member);
        drop(live_class);

        if let Some(until) = decision.blocked_until {
            tracing::warn!(
                "Member {} blocked until {} after {} no-shows",
                member.member_id,
                until,
                decision.monthly_noshows
            );
        } else {
            tracing::info!(
                "No-show recorded for member {} ({} this period)",
                member.member_id,
                decision.monthly_noshows
            );
        }

        // Reported from the member record: an older block may still be running.
        let blocked_until = member.blocked_until.filter(|until| now < *until);
        Ok(AttendanceOutcome {
            reservation,
            penalty: Some(PenaltyOutcome {
                monthly_noshows: decision.monthly_noshows,
                blocked: blocked_until.is_some(),
                blocked_until,
                member,
            }),
        })
    }

    /// Marks several reservations of one class present. Every reservation
    /// is its own transaction; a failure is reported and the rest carry on.
    pub async fn mark_present_bulk(
        &self,
        class_id: Uuid,
        target: BulkTarget,
    ) -> BookingResult<BulkAttendanceReport> {
        let targets = match target {
            BulkTarget::AllConfirmed => {
                self.read_class(class_id, |book| book.ledger().confirmed_ids())
                    .await?
            }
            BulkTarget::Reservations(ids) => {
                self.class_slot(class_id)?;
                ids
            }
        };

        let mut report = BulkAttendanceReport::default();
        for reservation_id in targets {
            let result = match self.class_of_reservation(reservation_id) {
                Ok(owner) if owner == class_id => self.mark_present(reservation_id).await,
                _ => Err(BookingError::NotFound(Entity::Reservation)),
            };
            report.items.push(BulkItemResult {
                reservation_id,
                result,
            });
        }

        tracing::info!(
            "Bulk attendance for class {}: {} completed, {} failed",
            class_id,
            report.completed(),
            report.failed()
        );
        Ok(report)
    }
}
