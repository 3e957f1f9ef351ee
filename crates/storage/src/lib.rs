use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

pub mod booking;
pub mod clock;
pub mod dto;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use booking::BookingEngine;
pub use clock::{Clock, ManualClock, SystemClock};
pub use repository::{BookingStore, InMemoryStore, LoadScope, PgBookingStore};
pub use services::noshow_policy::{BookingPolicy, NoShowWindow};

/// Connection pool to the booking database.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> error::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn run_migrations(&self) -> error::Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// A [`BookingStore`] writing through this pool.
    pub fn booking_store(&self) -> PgBookingStore {
        PgBookingStore::new(self.pool.clone())
    }
}
