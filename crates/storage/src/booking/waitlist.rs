use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::changes::ChangeSet;
use crate::error::{BookingError, BookingResult, Entity};
use crate::models::{WaitlistEntry, WaitlistStatus};

/// FIFO queue of members waiting for a seat in one class.
///
/// Entries are kept in join order, including the ones that already left or
/// were promoted. Waiting entries always carry positions `1..=N` in that
/// same order.
#[derive(Debug, Clone, Default)]
pub struct WaitlistQueue {
    entries: Vec<WaitlistEntry>,
}

impl WaitlistQueue {
    pub fn from_rows(rows: impl IntoIterator<Item = WaitlistEntry>) -> BookingResult<Self> {
        let mut entries: Vec<WaitlistEntry> = rows.into_iter().collect();
        entries.sort_by_key(|e| (e.joined_at, e.position));
        let queue = Self { entries };
        queue.check_contiguous()?;
        Ok(queue)
    }

    pub fn get(&self, entry_id: Uuid) -> BookingResult<&WaitlistEntry> {
        self.entries
            .iter()
            .find(|e| e.entry_id == entry_id)
            .ok_or(BookingError::NotFound(Entity::WaitlistEntry))
    }

    pub fn iter(&self) -> impl Iterator<Item = &WaitlistEntry> {
        self.entries.iter()
    }

    /// Waiting entries, front of the queue first.
    pub fn waiting(&self) -> impl Iterator<Item = &WaitlistEntry> {
        self.entries.iter().filter(|e| e.is_waiting())
    }

    pub fn waiting_len(&self) -> usize {
        self.waiting().count()
    }

    pub fn is_waiting(&self, member_id: Uuid) -> bool {
        self.waiting().any(|e| e.member_id == member_id)
    }

    pub fn join(
        &mut self,
        member_id: Uuid,
        class_id: Uuid,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> BookingResult<WaitlistEntry> {
        if self.is_waiting(member_id) {
            return Err(BookingError::AlreadyWaiting);
        }

        let entry = WaitlistEntry {
            entry_id: Uuid::new_v4(),
            member_id,
            class_id,
            position: self.waiting_len() as i32 + 1,
            status: WaitlistStatus::Waiting,
            joined_at: now,
            promoted_at: None,
        };

        changes.record_waitlist(&entry);
        self.entries.push(entry.clone());
        Ok(entry)
    }

    /// Takes `entry_id` out of the queue and closes the gap it leaves.
    pub fn leave(
        &mut self,
        entry_id: Uuid,
        changes: &mut ChangeSet,
    ) -> BookingResult<WaitlistEntry> {
        let entry = self.get(entry_id)?;
        if !entry.is_waiting() {
            return Err(BookingError::NotWaiting {
                status: entry.status,
            });
        }
        self.remove(entry_id, WaitlistStatus::Cancelled, None, changes)
            .ok_or(BookingError::NotFound(Entity::WaitlistEntry))
    }

    /// Promotes the front of the queue, if anyone is waiting.
    pub fn promote_next(
        &mut self,
        now: DateTime<Utc>,
        changes: &mut ChangeSet,
    ) -> Option<WaitlistEntry> {
        let front = self.waiting().min_by_key(|e| e.position)?.entry_id;
        self.remove(front, WaitlistStatus::Promoted, Some(now), changes)
    }

    /// Cancels every waiting entry; used when the class itself is cancelled.
    pub fn cancel_all(&mut self, changes: &mut ChangeSet) -> Vec<WaitlistEntry> {
        let mut cancelled = Vec::new();
        for entry in self.entries.iter_mut().filter(|e| e.is_waiting()) {
            entry.status = WaitlistStatus::Cancelled;
            changes.record_waitlist(entry);
            cancelled.push(entry.clone());
        }
        cancelled
    }

    fn remove(
        &mut self,
        entry_id: Uuid,
        to: WaitlistStatus,
        promoted_at: Option<DateTime<Utc>>,
        changes: &mut ChangeSet,
    ) -> Option<WaitlistEntry> {
        let entry = self.entries.iter_mut().find(|e| e.entry_id == entry_id)?;
        let vacated = entry.position;
        entry.status = to;
        entry.promoted_at = promoted_at;
        changes.record_waitlist(entry);
        let removed = entry.clone();

        for later in self
            .entries
            .iter_mut()
            .filter(|e| e.is_waiting() && e.position > vacated)
        {
            later.position -= 1;
            changes.record_waitlist(later);
        }

        Some(removed)
    }

    /// Verifies waiting positions are exactly `1..=N` in join order.
    pub fn check_contiguous(&self) -> BookingResult<()> {
        for (index, entry) in self.waiting().enumerate() {
            let expected = index as i32 + 1;
            if entry.position != expected {
                return Err(BookingError::Invariant(format!(
                    "waitlist entry {} has position {} but should be {}",
                    entry.entry_id, entry.position, expected
                )));
            }
        }
        Ok(())
    }
}
