//! Booking repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use classhub_core::error::{AppError, ErrorKind};
use classhub_core::result::AppResult;
use classhub_entity::booking::{Booking, BookingStatus, BookingWithSession};

/// Repository for booking CRUD, status transitions, and the in-transaction
/// reads and writes of the reservation critical section.
#[derive(Debug, Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    /// Create a new booking repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a booking by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, Booking>("SELECT * FROM bookings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find booking", e))
    }

    /// Find a booking joined with its session schedule and class name.
    pub async fn find_with_session(&self, id: Uuid) -> AppResult<Option<BookingWithSession>> {
        sqlx::query_as::<_, BookingWithSession>(
            "SELECT b.id, b.session_id, b.member_id, b.status, cs.starts_at, \
                    c.name AS class_name, b.created_at \
             FROM bookings b \
             JOIN class_sessions cs ON cs.id = b.session_id \
             JOIN gym_classes c ON c.id = cs.class_id \
             WHERE b.id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find booking", e))
    }

    /// Count confirmed bookings for a session, inside the caller's
    /// transaction (and therefore under the session lock).
    pub async fn count_confirmed(
        &self,
        conn: &mut PgConnection,
        session_id: Uuid,
    ) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM bookings WHERE session_id = $1 AND status = 'confirmed'",
        )
        .bind(session_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to count confirmed bookings", e)
        })
    }

    /// Whether the member already holds a confirmed booking for the
    /// session, inside the caller's transaction.
    pub async fn exists_confirmed(
        &self,
        conn: &mut PgConnection,
        session_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS( \
                SELECT 1 FROM bookings \
                WHERE session_id = $1 AND member_id = $2 AND status = 'confirmed')",
        )
        .bind(session_id)
        .bind(member_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to check existing booking", e)
        })
    }

    /// Insert a confirmed booking inside the caller's transaction.
    pub async fn insert_confirmed(
        &self,
        conn: &mut PgConnection,
        session_id: Uuid,
        member_id: Uuid,
    ) -> AppResult<Booking> {
        sqlx::query_as::<_, Booking>(
            "INSERT INTO bookings (session_id, member_id, status) \
             VALUES ($1, $2, 'confirmed') RETURNING *",
        )
        .bind(session_id)
        .bind(member_id)
        .fetch_one(&mut *conn)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to insert booking", e))
    }

    /// Transition a confirmed booking to `cancelled`.
    ///
    /// Returns `None` when the booking is not currently confirmed, so a
    /// concurrent cancel is observed as already-cancelled rather than
    /// applied twice.
    pub async fn cancel_confirmed(&self, id: Uuid) -> AppResult<Option<Booking>> {
        sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = 'cancelled', updated_at = NOW() \
             WHERE id = $1 AND status = 'confirmed' RETURNING *",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to cancel booking", e))
    }

    /// Attendance transition: `confirmed` to `completed` or `no_show`.
    ///
    /// Fails with `Conflict` when the booking exists but has already left
    /// the confirmed state, and `NotFound` when it does not exist.
    pub async fn transition_status(&self, id: Uuid, to: BookingStatus) -> AppResult<Booking> {
        if !matches!(to, BookingStatus::Completed | BookingStatus::NoShow) {
            return Err(AppError::validation(format!(
                "Invalid target status {to} for attendance marking"
            )));
        }

        let updated = sqlx::query_as::<_, Booking>(
            "UPDATE bookings SET status = $2, updated_at = NOW() \
             WHERE id = $1 AND status = 'confirmed' RETURNING *",
        )
        .bind(id)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to update booking status", e)
        })?;

        match updated {
            Some(booking) => Ok(booking),
            None => match self.find_by_id(id).await? {
                Some(existing) => Err(AppError::conflict(format!(
                    "Booking {id} is {} and cannot become {to}",
                    existing.status
                ))),
                None => Err(AppError::not_found(format!("Booking {id} not found"))),
            },
        }
    }

    /// A member's upcoming bookings: confirmed, session not yet started.
    pub async fn find_upcoming_by_member(
        &self,
        member_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<BookingWithSession>> {
        sqlx::query_as::<_, BookingWithSession>(
            "SELECT b.id, b.session_id, b.member_id, b.status, cs.starts_at, \
                    c.name AS class_name, b.created_at \
             FROM bookings b \
             JOIN class_sessions cs ON cs.id = b.session_id \
             JOIN gym_classes c ON c.id = cs.class_id \
             WHERE b.member_id = $1 AND b.status = 'confirmed' AND cs.starts_at >= $2 \
             ORDER BY cs.starts_at",
        )
        .bind(member_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list upcoming bookings", e)
        })
    }

    /// A member's past bookings: sessions already started, or bookings in
    /// any terminal state. Newest first.
    pub async fn find_past_by_member(
        &self,
        member_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<BookingWithSession>> {
        sqlx::query_as::<_, BookingWithSession>(
            "SELECT b.id, b.session_id, b.member_id, b.status, cs.starts_at, \
                    c.name AS class_name, b.created_at \
             FROM bookings b \
             JOIN class_sessions cs ON cs.id = b.session_id \
             JOIN gym_classes c ON c.id = cs.class_id \
             WHERE b.member_id = $1 AND (cs.starts_at < $2 OR b.status <> 'confirmed') \
             ORDER BY cs.starts_at DESC",
        )
        .bind(member_id)
        .bind(now)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list past bookings", e)
        })
    }
}
