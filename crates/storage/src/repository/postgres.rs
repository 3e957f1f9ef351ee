use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{BookingStore, LoadScope, Snapshot};
use crate::booking::ChangeSet;
use crate::error::{Result, StorageError};
use crate::models::{
    ClassSession, Member, NoShowRecord, NotificationIntent, Reservation, WaitlistEntry,
};

/// PostgreSQL-backed [`BookingStore`].
#[derive(Clone)]
pub struct PgBookingStore {
    pool: PgPool,
}

impl PgBookingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn upsert_class(tx: &mut Transaction<'_, Postgres>, class: &ClassSession) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO classes (
                class_id, name, class_type, instructor_id, date, start_time, end_time,
                capacity, reserved, waitlist_enabled, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (class_id) DO UPDATE SET
                reserved = EXCLUDED.reserved,
                waitlist_enabled = EXCLUDED.waitlist_enabled,
                status = EXCLUDED.status
            "#,
        )
        .bind(class.class_id)
        .bind(&class.name)
        .bind(class.class_type)
        .bind(class.instructor_id)
        .bind(class.date)
        .bind(class.start_time)
        .bind(class.end_time)
        .bind(class.capacity)
        .bind(class.reserved)
        .bind(class.waitlist_enabled)
        .bind(class.status)
        .bind(class.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn upsert_member(tx: &mut Transaction<'_, Postgres>, member: &Member) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO members (
                member_id, full_name, email, membership_status, blocked_until,
                total_noshow, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (member_id) DO UPDATE SET
                membership_status = EXCLUDED.membership_status,
                blocked_until = EXCLUDED.blocked_until,
                total_noshow = EXCLUDED.total_noshow
            "#,
        )
        .bind(member.member_id)
        .bind(&member.full_name)
        .bind(&member.email)
        .bind(member.membership_status)
        .bind(member.blocked_until)
        .bind(member.total_noshow)
        .bind(member.created_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| StorageError::from(e).on_unique_violation("Email already registered"))?;

        Ok(())
    }

    async fn upsert_reservation(
        tx: &mut Transaction<'_, Postgres>,
        reservation: &Reservation,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO reservations (
                reservation_id, member_id, class_id, status, from_waitlist,
                created_at, updated_at, cancelled_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (reservation_id) DO UPDATE SET
                status = EXCLUDED.status,
                updated_at = EXCLUDED.updated_at,
                cancelled_at = EXCLUDED.cancelled_at
            "#,
        )
        .bind(reservation.reservation_id)
        .bind(reservation.member_id)
        .bind(reservation.class_id)
        .bind(reservation.status)
        .bind(reservation.from_waitlist)
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .bind(reservation.cancelled_at)
        .execute(&mut **tx)
        .await
        .map_err(|e| {
            StorageError::from(e)
                .on_unique_violation("Member already holds a confirmed reservation for this class")
        })?;

        Ok(())
    }

    async fn upsert_waitlist_entry(
        tx: &mut Transaction<'_, Postgres>,
        entry: &WaitlistEntry,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO waitlist_entries (
                entry_id, member_id, class_id, position, status, joined_at, promoted_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (entry_id) DO UPDATE SET
                position = EXCLUDED.position,
                status = EXCLUDED.status,
                promoted_at = EXCLUDED.promoted_at
            "#,
        )
        .bind(entry.entry_id)
        .bind(entry.member_id)
        .bind(entry.class_id)
        .bind(entry.position)
        .bind(entry.status)
        .bind(entry.joined_at)
        .bind(entry.promoted_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn insert_noshow(
        tx: &mut Transaction<'_, Postgres>,
        record: &NoShowRecord,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO member_noshows (reservation_id, member_id, recorded_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (reservation_id) DO NOTHING
            "#,
        )
        .bind(record.reservation_id)
        .bind(record.member_id)
        .bind(record.recorded_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    async fn insert_notification(
        tx: &mut Transaction<'_, Postgres>,
        intent: &NotificationIntent,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO notification_outbox (
                notification_id, member_id, class_id, kind, message, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(intent.notification_id)
        .bind(intent.member_id)
        .bind(intent.class_id)
        .bind(intent.kind)
        .bind(&intent.message)
        .bind(intent.created_at)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn load(&self, scope: &LoadScope) -> Result<Snapshot> {
        let classes = sqlx::query_as::<_, ClassSession>(
            r#"
            SELECT class_id, name, class_type, instructor_id, date, start_time, end_time,
                   capacity, reserved, waitlist_enabled, status, created_at
            FROM classes
            WHERE status = 'activa' OR date >= $1
            ORDER BY date, start_time
            "#,
        )
        .bind(scope.classes_from)
        .fetch_all(&self.pool)
        .await?;

        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT r.reservation_id, r.member_id, r.class_id, r.status, r.from_waitlist,
                   r.created_at, r.updated_at, r.cancelled_at
            FROM reservations r
            JOIN classes c ON c.class_id = r.class_id
            WHERE c.status = 'activa' OR c.date >= $1
            ORDER BY r.created_at
            "#,
        )
        .bind(scope.classes_from)
        .fetch_all(&self.pool)
        .await?;

        let waitlist = sqlx::query_as::<_, WaitlistEntry>(
            r#"
            SELECT w.entry_id, w.member_id, w.class_id, w.position, w.status,
                   w.joined_at, w.promoted_at
            FROM waitlist_entries w
            JOIN classes c ON c.class_id = w.class_id
            WHERE c.status = 'activa' OR c.date >= $1
            ORDER BY w.class_id, w.joined_at, w.position
            "#,
        )
        .bind(scope.classes_from)
        .fetch_all(&self.pool)
        .await?;

        let members = sqlx::query_as::<_, Member>(
            r#"
            SELECT member_id, full_name, email, membership_status, blocked_until,
                   total_noshow, created_at
            FROM members
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let noshows = sqlx::query_as::<_, NoShowRecord>(
            r#"
            SELECT reservation_id, member_id, recorded_at
            FROM member_noshows
            WHERE recorded_at >= $1
            ORDER BY recorded_at
            "#,
        )
        .bind(scope.noshows_since)
        .fetch_all(&self.pool)
        .await?;

        Ok(Snapshot {
            classes,
            reservations,
            waitlist,
            members,
            noshows,
        })
    }

    async fn commit(&self, changes: &ChangeSet) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        for class in changes.classes.values() {
            Self::upsert_class(&mut tx, class).await?;
        }
        for member in changes.members.values() {
            Self::upsert_member(&mut tx, member).await?;
        }
        for reservation in changes.reservations.values() {
            Self::upsert_reservation(&mut tx, reservation).await?;
        }
        for entry in changes.waitlist.values() {
            Self::upsert_waitlist_entry(&mut tx, entry).await?;
        }
        for record in &changes.noshows {
            Self::insert_noshow(&mut tx, record).await?;
        }
        for intent in &changes.notifications {
            Self::insert_notification(&mut tx, intent).await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_class(&self, class_id: Uuid) -> Result<Option<ClassSession>> {
        let class = sqlx::query_as::<_, ClassSession>(
            r#"
            SELECT class_id, name, class_type, instructor_id, date, start_time, end_time,
                   capacity, reserved, waitlist_enabled, status, created_at
            FROM classes
            WHERE class_id = $1
            "#,
        )
        .bind(class_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(class)
    }

    async fn class_reservations(&self, class_id: Uuid) -> Result<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT reservation_id, member_id, class_id, status, from_waitlist,
                   created_at, updated_at, cancelled_at
            FROM reservations
            WHERE class_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(class_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }

    async fn member_reservations(&self, member_id: Uuid) -> Result<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(
            r#"
            SELECT reservation_id, member_id, class_id, status, from_waitlist,
                   created_at, updated_at, cancelled_at
            FROM reservations
            WHERE member_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(reservations)
    }
}
