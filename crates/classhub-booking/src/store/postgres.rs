//! PostgreSQL reservation store using row-level session locks.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use classhub_core::config::BookingConfig;
use classhub_core::error::{AppError, ErrorKind};
use classhub_core::result::AppResult;
use classhub_core::types::id::{BookingId, ClassSessionId, MemberId};
use classhub_database::repositories::{BookingRepository, SessionRepository};
use classhub_database::DatabasePool;
use classhub_entity::booking::Booking;

use crate::admission;
use crate::store::ReservationStore;

/// Reservation store backed by PostgreSQL row-level locking.
///
/// A reservation attempt runs in one transaction: `SELECT ... FOR UPDATE`
/// on the session row freezes it against concurrent attempts for the same
/// session, the admission rules are evaluated against counts read under
/// that lock, and the booking insert commits together with the lock
/// release. Dropping the transaction on any error path rolls everything
/// back, so a rejected or failed attempt leaves no trace.
#[derive(Debug, Clone)]
pub struct PostgresReservationStore {
    pool: PgPool,
    sessions: SessionRepository,
    bookings: BookingRepository,
    lock_timeout_ms: u64,
}

impl PostgresReservationStore {
    /// Create a new PostgreSQL reservation store.
    pub fn new(db: &DatabasePool, config: &BookingConfig) -> Self {
        let pool = db.pool().clone();
        Self {
            sessions: SessionRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool.clone()),
            pool,
            lock_timeout_ms: config.lock_timeout_ms,
        }
    }
}

#[async_trait]
impl ReservationStore for PostgresReservationStore {
    async fn reserve(
        &self,
        session_id: ClassSessionId,
        member_id: MemberId,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        // Bound the row-lock wait for this transaction only.
        sqlx::query("SELECT set_config('lock_timeout', $1, true)")
            .bind(format!("{}ms", self.lock_timeout_ms))
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to set lock timeout", e)
            })?;

        let session = self
            .sessions
            .lock_for_booking(&mut tx, session_id.into_uuid())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Session {session_id} not found")))?;

        let confirmed = self.bookings.count_confirmed(&mut tx, session.id).await?;
        let duplicate = self
            .bookings
            .exists_confirmed(&mut tx, session.id, member_id.into_uuid())
            .await?;

        admission::check_reserve(&session, confirmed, duplicate, now)?;

        let booking = self
            .bookings
            .insert_confirmed(&mut tx, session.id, member_id.into_uuid())
            .await?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit reservation", e)
        })?;

        Ok(booking)
    }

    async fn cancel(
        &self,
        booking_id: BookingId,
        member_id: MemberId,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let existing = self
            .bookings
            .find_with_session(booking_id.into_uuid())
            .await?
            .ok_or_else(|| AppError::not_found(format!("Booking {booking_id} not found")))?;

        admission::check_cancel(
            existing.status,
            existing.member_id,
            existing.starts_at,
            member_id.into_uuid(),
            now,
        )?;

        // The guarded UPDATE re-checks status, so a cancel racing another
        // status write is observed as already-cancelled.
        match self.bookings.cancel_confirmed(booking_id.into_uuid()).await? {
            Some(booking) => Ok(booking),
            None => Err(AppError::already_cancelled(format!(
                "Booking {booking_id} is no longer confirmed"
            ))),
        }
    }

    async fn available_spots(&self, session_id: ClassSessionId) -> AppResult<u32> {
        self.sessions.available_spots(session_id.into_uuid()).await
    }
}
