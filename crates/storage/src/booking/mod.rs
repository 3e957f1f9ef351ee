//! The booking core: per-class aggregates behind individual locks, and the
//! engine that runs every operation as a commit-or-nothing transaction.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, broadcast};
use uuid::Uuid;

pub mod allocator;
pub mod attendance;
pub mod changes;
pub mod class_book;
pub mod ledger;
pub mod members;
pub mod outcome;
pub mod registry;
pub mod waitlist;

pub use allocator::Actor;
pub use changes::ChangeSet;
pub use class_book::ClassBook;
pub use ledger::ReservationLedger;
pub use members::NewMember;
pub use outcome::{
    AttendanceOutcome, Availability, BookingOutcome, BulkAttendanceReport, BulkItemResult,
    BulkTarget, CancellationOutcome, ClassCancellation, PenaltyOutcome, Promotion,
};
pub use registry::NewClass;
pub use waitlist::WaitlistQueue;

use crate::clock::Clock;
use crate::error::{BookingError, BookingResult, Entity};
use crate::models::{Member, NotificationIntent, Reservation, WaitlistEntry};
use crate::repository::{BookingStore, LoadScope};
use crate::services::noshow_policy::BookingPolicy;

const NOTIFICATION_BUFFER: usize = 256;

/// Entry point of the booking core.
///
/// Each class is an independently locked [`ClassBook`]. An operation locks
/// its class, works on a copy, commits the copy's changes to the store and
/// only then replaces the live aggregate, so a failure at any step leaves
/// nothing behind. Member records have their own locks, always taken after
/// the class lock.
pub struct BookingEngine {
    classes: DashMap<Uuid, Arc<Mutex<ClassBook>>>,
    members: DashMap<Uuid, Arc<Mutex<Member>>>,
    emails: DashMap<String, Uuid>,
    reservation_index: DashMap<Uuid, Uuid>,
    entry_index: DashMap<Uuid, Uuid>,
    store: Arc<dyn BookingStore>,
    clock: Arc<dyn Clock>,
    policy: BookingPolicy,
    notifications: broadcast::Sender<NotificationIntent>,
}

impl BookingEngine {
    /// Rebuilds the arena from `store`: every member, and every class that
    /// is still active or closed too recently to be archived.
    ///
    /// Refuses to start when the stored data breaks a per-class invariant.
    pub async fn open(
        store: Arc<dyn BookingStore>,
        clock: Arc<dyn Clock>,
        policy: BookingPolicy,
    ) -> BookingResult<Self> {
        let now = clock.now();
        let since = policy.noshow_window.window_start(now);
        let scope = LoadScope {
            classes_from: policy.archive_cutoff(now),
            noshows_since: since,
        };
        let snapshot = store.load(&scope).await?;
        let (notifications, _) = broadcast::channel(NOTIFICATION_BUFFER);

        let engine = Self {
            classes: DashMap::new(),
            members: DashMap::new(),
            emails: DashMap::new(),
            reservation_index: DashMap::new(),
            entry_index: DashMap::new(),
            store,
            clock,
            policy,
            notifications,
        };

        let mut noshows: HashMap<Uuid, Vec<_>> = HashMap::new();
        for record in snapshot.noshows {
            if record.recorded_at >= since {
                noshows.entry(record.member_id).or_default().push(record.recorded_at);
            }
        }

        for mut member in snapshot.members {
            let mut recent = noshows.remove(&member.member_id).unwrap_or_default();
            recent.sort();
            member.recent_noshows = recent;
            engine
                .emails
                .insert(member.email.to_lowercase(), member.member_id);
            engine
                .members
                .insert(member.member_id, Arc::new(Mutex::new(member)));
        }

        let mut reservations: HashMap<Uuid, Vec<Reservation>> = HashMap::new();
        for reservation in snapshot.reservations {
            reservations
                .entry(reservation.class_id)
                .or_default()
                .push(reservation);
        }
        let mut entries: HashMap<Uuid, Vec<WaitlistEntry>> = HashMap::new();
        for entry in snapshot.waitlist {
            entries.entry(entry.class_id).or_default().push(entry);
        }

        for session in snapshot.classes {
            let class_id = session.class_id;
            let book = ClassBook::from_rows(
                session,
                reservations.remove(&class_id).unwrap_or_default(),
                entries.remove(&class_id).unwrap_or_default(),
            )?;
            engine.index(&book);
            engine.classes.insert(class_id, Arc::new(Mutex::new(book)));
        }

        if let Some(class_id) = reservations.keys().chain(entries.keys()).next() {
            return Err(BookingError::Invariant(format!(
                "stored rows reference unknown class {}",
                class_id
            )));
        }

        tracing::info!(
            "Booking core loaded: {} classes, {} members",
            engine.classes.len(),
            engine.members.len()
        );

        Ok(engine)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Notification intents as they are committed.
    ///
    /// Receivers that fall behind lose the oldest intents; the store's
    /// outbox keeps all of them.
    pub fn subscribe(&self) -> broadcast::Receiver<NotificationIntent> {
        self.notifications.subscribe()
    }

    /// Classes currently held in memory.
    pub fn resident_classes(&self) -> usize {
        self.classes.len()
    }

    /// Drops cancelled and completed classes older than the policy's
    /// archive horizon from memory. Their rows stay in the store.
    pub async fn archive_closed(&self) -> BookingResult<usize> {
        let cutoff = self.policy.archive_cutoff(self.clock.now());
        let mut archived = 0;

        for slot in self.class_slots() {
            let book = self.lock(Arc::clone(&slot)).await?;
            if !book.session().is_archived(cutoff) {
                continue;
            }
            let class_id = book.session().class_id;
            self.classes
                .remove_if(&class_id, |_, live| Arc::ptr_eq(live, &slot));
            for reservation in book.ledger().iter() {
                self.reservation_index.remove(&reservation.reservation_id);
            }
            for entry in book.waitlist().iter() {
                self.entry_index.remove(&entry.entry_id);
            }
            archived += 1;
        }

        if archived > 0 {
            tracing::info!(
                "Archived {} closed classes, {} remain in memory",
                archived,
                self.classes.len()
            );
        }
        Ok(archived)
    }

    /// Re-checks the invariants of every class.
    pub async fn audit(&self) -> BookingResult<()> {
        for slot in self.class_slots() {
            let book = self.lock(slot).await?;
            book.audit()?;
        }
        Ok(())
    }

    fn index(&self, book: &ClassBook) {
        for reservation in book.ledger().iter() {
            self.reservation_index
                .insert(reservation.reservation_id, reservation.class_id);
        }
        for entry in book.waitlist().iter() {
            self.entry_index.insert(entry.entry_id, entry.class_id);
        }
    }

    fn class_slot(&self, class_id: Uuid) -> BookingResult<Arc<Mutex<ClassBook>>> {
        self.classes
            .get(&class_id)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or(BookingError::NotFound(Entity::Class))
    }

    fn class_slots(&self) -> Vec<Arc<Mutex<ClassBook>>> {
        self.classes
            .iter()
            .map(|slot| Arc::clone(slot.value()))
            .collect()
    }

    fn member_slot(&self, member_id: Uuid) -> BookingResult<Arc<Mutex<Member>>> {
        self.members
            .get(&member_id)
            .map(|slot| Arc::clone(slot.value()))
            .ok_or(BookingError::NotFound(Entity::Member))
    }

    fn class_of_reservation(&self, reservation_id: Uuid) -> BookingResult<Uuid> {
        self.reservation_index
            .get(&reservation_id)
            .map(|class_id| *class_id)
            .ok_or(BookingError::NotFound(Entity::Reservation))
    }

    fn class_of_entry(&self, entry_id: Uuid) -> BookingResult<Uuid> {
        self.entry_index
            .get(&entry_id)
            .map(|class_id| *class_id)
            .ok_or(BookingError::NotFound(Entity::WaitlistEntry))
    }

    async fn lock<T>(&self, slot: Arc<Mutex<T>>) -> BookingResult<OwnedMutexGuard<T>> {
        tokio::time::timeout(self.policy.lock_timeout, slot.lock_owned())
            .await
            .map_err(|_| {
                tracing::warn!(
                    "Gave up waiting for a lock after {:?}",
                    self.policy.lock_timeout
                );
                BookingError::LockTimeout
            })
    }

    /// Locks a resident class. A class archived while this call waited for
    /// the lock is reported as not found.
    async fn lock_class(&self, class_id: Uuid) -> BookingResult<OwnedMutexGuard<ClassBook>> {
        let slot = self.class_slot(class_id)?;
        let book = self.lock(Arc::clone(&slot)).await?;
        let resident = self
            .classes
            .get(&class_id)
            .is_some_and(|live| Arc::ptr_eq(live.value(), &slot));
        if !resident {
            return Err(BookingError::NotFound(Entity::Class));
        }
        Ok(book)
    }

    /// Current state of one class, taken under its lock.
    async fn read_class<T>(
        &self,
        class_id: Uuid,
        read: impl FnOnce(&ClassBook) -> T,
    ) -> BookingResult<T> {
        let book = self.lock_class(class_id).await?;
        Ok(read(&book))
    }

    /// Runs `op` against a copy of the class and installs the copy once the
    /// store accepted its changes.
    async fn transact<T>(
        &self,
        class_id: Uuid,
        op: impl FnOnce(&mut ClassBook, &mut ChangeSet) -> BookingResult<T>,
    ) -> BookingResult<T> {
        let mut live = self.lock_class(class_id).await?;
        let mut draft = live.clone();
        let mut changes = ChangeSet::default();

        let value = op(&mut draft, &mut changes)?;
        draft.audit()?;
        self.commit(&changes).await?;

        *live = draft;
        self.publish(&changes);
        Ok(value)
    }

    async fn commit(&self, changes: &ChangeSet) -> BookingResult<()> {
        if changes.is_empty() {
            return Ok(());
        }
        self.store.commit(changes).await.map_err(|e| {
            tracing::error!("Failed to commit booking changes: {:?}", e);
            BookingError::from(e)
        })
    }

    /// Makes committed rows discoverable by id and fans out notifications.
    /// Called while the class lock is still held.
    fn publish(&self, changes: &ChangeSet) {
        for (reservation_id, reservation) in &changes.reservations {
            self.reservation_index
                .insert(*reservation_id, reservation.class_id);
        }
        for (entry_id, entry) in &changes.waitlist {
            self.entry_index.insert(*entry_id, entry.class_id);
        }
        for intent in &changes.notifications {
            // Nobody listening is fine; the outbox has it.
            let _ = self.notifications.send(intent.clone());
        }
    }
}
