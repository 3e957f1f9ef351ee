use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::booking::ChangeSet;
use crate::error::Result;
use crate::models::{
    ClassSession, Member, NoShowRecord, NotificationIntent, Reservation, WaitlistEntry,
};

pub mod postgres;

pub use postgres::PgBookingStore;

/// Everything needed to rebuild the booking core after a restart.
#[derive(Debug, Default, Clone)]
pub struct Snapshot {
    pub classes: Vec<ClassSession>,
    pub reservations: Vec<Reservation>,
    pub waitlist: Vec<WaitlistEntry>,
    pub members: Vec<Member>,
    pub noshows: Vec<NoShowRecord>,
}

/// Which rows [`BookingStore::load`] brings back into memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadScope {
    /// Active classes are always loaded; closed ones only from this day on.
    pub classes_from: NaiveDate,
    pub noshows_since: DateTime<Utc>,
}

impl LoadScope {
    pub fn includes(&self, class: &ClassSession) -> bool {
        !class.is_archived(self.classes_from)
    }
}

/// Durable side of the booking core.
///
/// `commit` must apply the whole change set or nothing: the core only
/// publishes a transaction's result after `commit` returned `Ok`.
#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Every member, plus the classes in `scope` with their reservations
    /// and waitlist entries.
    async fn load(&self, scope: &LoadScope) -> Result<Snapshot>;

    async fn commit(&self, changes: &ChangeSet) -> Result<()>;

    async fn find_class(&self, class_id: Uuid) -> Result<Option<ClassSession>>;

    async fn class_reservations(&self, class_id: Uuid) -> Result<Vec<Reservation>>;

    async fn member_reservations(&self, member_id: Uuid) -> Result<Vec<Reservation>>;
}

#[derive(Debug, Default)]
struct MemoryTables {
    classes: HashMap<Uuid, ClassSession>,
    reservations: HashMap<Uuid, Reservation>,
    waitlist: HashMap<Uuid, WaitlistEntry>,
    members: HashMap<Uuid, Member>,
    noshows: Vec<NoShowRecord>,
    outbox: Vec<NotificationIntent>,
}

/// Store that keeps committed rows in process memory.
///
/// Used when no database is configured and throughout the tests.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: Mutex<MemoryTables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notification intents committed so far, oldest first.
    pub async fn outbox(&self) -> Vec<NotificationIntent> {
        self.tables.lock().await.outbox.clone()
    }
}

#[async_trait]
impl BookingStore for InMemoryStore {
    async fn load(&self, scope: &LoadScope) -> Result<Snapshot> {
        let tables = self.tables.lock().await;
        let in_scope = |class_id: &Uuid| {
            tables
                .classes
                .get(class_id)
                .is_some_and(|class| scope.includes(class))
        };

        Ok(Snapshot {
            classes: tables
                .classes
                .values()
                .filter(|class| scope.includes(class))
                .cloned()
                .collect(),
            reservations: tables
                .reservations
                .values()
                .filter(|r| in_scope(&r.class_id))
                .cloned()
                .collect(),
            waitlist: tables
                .waitlist
                .values()
                .filter(|e| in_scope(&e.class_id))
                .cloned()
                .collect(),
            members: tables.members.values().cloned().collect(),
            noshows: tables
                .noshows
                .iter()
                .filter(|n| n.recorded_at >= scope.noshows_since)
                .cloned()
                .collect(),
        })
    }

    async fn commit(&self, changes: &ChangeSet) -> Result<()> {
        let mut tables = self.tables.lock().await;
        for (id, class) in &changes.classes {
            tables.classes.insert(*id, class.clone());
        }
        for (id, member) in &changes.members {
            tables.members.insert(*id, member.clone());
        }
        for (id, reservation) in &changes.reservations {
            tables.reservations.insert(*id, reservation.clone());
        }
        for (id, entry) in &changes.waitlist {
            tables.waitlist.insert(*id, entry.clone());
        }
        tables.noshows.extend(changes.noshows.iter().cloned());
        tables.outbox.extend(changes.notifications.iter().cloned());
        Ok(())
    }

    async fn find_class(&self, class_id: Uuid) -> Result<Option<ClassSession>> {
        Ok(self.tables.lock().await.classes.get(&class_id).cloned())
    }

    async fn class_reservations(&self, class_id: Uuid) -> Result<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reservations
            .values()
            .filter(|r| r.class_id == class_id)
            .cloned()
            .collect())
    }

    async fn member_reservations(&self, member_id: Uuid) -> Result<Vec<Reservation>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .reservations
            .values()
            .filter(|r| r.member_id == member_id)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassStatus, ClassType, ReservationStatus};
    use chrono::{NaiveTime, TimeZone};

    fn class_on(date: NaiveDate, status: ClassStatus) -> ClassSession {
        ClassSession {
            class_id: Uuid::new_v4(),
            name: "Pilates".to_string(),
            class_type: ClassType::Pilates,
            instructor_id: None,
            date,
            start_time: NaiveTime::from_hms_opt(7, 0, 0).unwrap(),
            end_time: NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            capacity: 10,
            reserved: 1,
            waitlist_enabled: true,
            status,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn reservation_for(class: &ClassSession) -> Reservation {
        Reservation {
            reservation_id: Uuid::new_v4(),
            member_id: Uuid::new_v4(),
            class_id: class.class_id,
            status: ReservationStatus::Completed,
            from_waitlist: false,
            created_at: class.created_at,
            updated_at: class.created_at,
            cancelled_at: None,
        }
    }

    #[tokio::test]
    async fn test_load_leaves_old_closed_classes_in_the_store() {
        let store = InMemoryStore::new();
        let day = |d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap();
        let old_done = class_on(day(1), ClassStatus::Completed);
        let old_active = class_on(day(2), ClassStatus::Active);
        let recent_done = class_on(day(20), ClassStatus::Completed);

        let mut changes = ChangeSet::default();
        for class in [&old_done, &old_active, &recent_done] {
            changes.record_class(class);
            changes.record_reservation(&reservation_for(class));
        }
        store.commit(&changes).await.unwrap();

        let scope = LoadScope {
            classes_from: day(10),
            noshows_since: Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap(),
        };
        let snapshot = store.load(&scope).await.unwrap();

        let mut loaded: Vec<Uuid> = snapshot.classes.iter().map(|c| c.class_id).collect();
        loaded.sort();
        let mut expected = vec![old_active.class_id, recent_done.class_id];
        expected.sort();
        assert_eq!(loaded, expected);
        assert_eq!(snapshot.reservations.len(), 2);
        assert!(snapshot.reservations.iter().all(|r| r.class_id != old_done.class_id));

        assert_eq!(
            store.find_class(old_done.class_id).await.unwrap(),
            Some(old_done.clone())
        );
        assert_eq!(store.class_reservations(old_done.class_id).await.unwrap().len(), 1);
    }
}
