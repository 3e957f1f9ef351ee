#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};
use uuid::Uuid;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use storage::booking::{BookingEngine, ChangeSet, NewClass, NewMember};
use storage::clock::{Clock, ManualClock};
use storage::error::{Result, StorageError};
use storage::models::{ClassSession, ClassType, Member, Reservation};
use storage::repository::{BookingStore, InMemoryStore, LoadScope, Snapshot};
use storage::services::noshow_policy::BookingPolicy;

/// Monday 2 June 2025, 09:00 UTC.
pub fn monday_morning() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, 9, 0, 0).unwrap()
}

/// In-memory store that can be told to reject commits.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: InMemoryStore,
    failing: AtomicBool,
}

impl FlakyStore {
    pub fn fail_commits(&self, fail: bool) {
        self.failing.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl BookingStore for FlakyStore {
    async fn load(&self, scope: &LoadScope) -> Result<Snapshot> {
        self.inner.load(scope).await
    }

    async fn commit(&self, changes: &ChangeSet) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StorageError::ConstraintViolation("store is down".to_string()));
        }
        self.inner.commit(changes).await
    }

    async fn find_class(&self, class_id: Uuid) -> Result<Option<ClassSession>> {
        self.inner.find_class(class_id).await
    }

    async fn class_reservations(&self, class_id: Uuid) -> Result<Vec<Reservation>> {
        self.inner.class_reservations(class_id).await
    }

    async fn member_reservations(&self, member_id: Uuid) -> Result<Vec<Reservation>> {
        self.inner.member_reservations(member_id).await
    }
}

pub struct Gym {
    pub engine: Arc<BookingEngine>,
    pub clock: Arc<ManualClock>,
    pub store: Arc<FlakyStore>,
}

impl Gym {
    pub async fn open() -> Self {
        Self::with_policy(BookingPolicy::default()).await
    }

    pub async fn with_policy(policy: BookingPolicy) -> Self {
        let clock = Arc::new(ManualClock::new(monday_morning()));
        let store = Arc::new(FlakyStore::default());
        let engine = BookingEngine::open(store.clone(), clock.clone(), policy)
            .await
            .unwrap();

        Self {
            engine: Arc::new(engine),
            clock,
            store,
        }
    }

    /// Reopens the engine over the same store, as after a restart.
    pub async fn restart(&self) -> BookingEngine {
        BookingEngine::open(
            self.store.clone(),
            self.clock.clone(),
            self.engine.policy().clone(),
        )
        .await
        .unwrap()
    }

    pub async fn member(&self, name: &str) -> Member {
        self.engine
            .register_member(NewMember {
                full_name: name.to_string(),
                email: format!("{}@gym.test", name.to_lowercase().replace(' ', ".")),
            })
            .await
            .unwrap()
    }

    /// A class today from 18:00 to 19:00.
    pub async fn evening_class(&self, capacity: i32, waitlist_enabled: bool) -> ClassSession {
        self.engine
            .register_class(NewClass {
                name: "Spinning".to_string(),
                class_type: ClassType::Spinning,
                instructor_id: None,
                date: monday_morning().date_naive(),
                start_time: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
                capacity,
                waitlist_enabled,
            })
            .await
            .unwrap()
    }

    pub fn clock_now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Moves the clock past the end of today's evening class.
    pub fn after_class(&self) {
        self.clock
            .set(monday_morning() + Duration::hours(10) + Duration::minutes(5));
    }
}
