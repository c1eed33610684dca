//! Class session repository implementation.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use classhub_core::error::{AppError, ErrorKind};
use classhub_core::result::AppResult;
use classhub_entity::session::{BookableSession, ClassSession, CreateClassSession, LockedSession};

/// Repository for class session records and the session-scoped lock
/// acquisition used by the reservation critical section.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: PgPool,
}

impl SessionRepository {
    /// Create a new session repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a session by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<ClassSession>> {
        sqlx::query_as::<_, ClassSession>("SELECT * FROM class_sessions WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find session", e))
    }

    /// Lock a session row for the duration of the caller's transaction.
    ///
    /// Acquires `FOR UPDATE OF cs` on the session row only — locking the
    /// parent class row as well would serialize reservations across every
    /// session of that class. The effective capacity and both active flags
    /// are read in the same statement so the caller validates against the
    /// state that is now frozen under the lock.
    pub async fn lock_for_booking(
        &self,
        conn: &mut PgConnection,
        id: Uuid,
    ) -> AppResult<Option<LockedSession>> {
        sqlx::query_as::<_, LockedSession>(
            "SELECT cs.id, cs.class_id, cs.starts_at, \
                    COALESCE(cs.capacity_override, c.default_capacity) AS effective_capacity, \
                    cs.is_active, c.is_active AS class_active \
             FROM class_sessions cs \
             JOIN gym_classes c ON c.id = cs.class_id \
             WHERE cs.id = $1 \
             FOR UPDATE OF cs",
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(map_lock_error)
    }

    /// List bookable sessions: active sessions of active classes starting
    /// after `now` (and before `until`, when a horizon applies), each with
    /// its current availability snapshot.
    pub async fn find_bookable(
        &self,
        now: DateTime<Utc>,
        until: Option<DateTime<Utc>>,
    ) -> AppResult<Vec<BookableSession>> {
        sqlx::query_as::<_, BookableSession>(
            "SELECT cs.id, cs.class_id, c.name AS class_name, cs.starts_at, \
                    COALESCE(cs.capacity_override, c.default_capacity) AS effective_capacity, \
                    GREATEST(COALESCE(cs.capacity_override, c.default_capacity)::bigint \
                        - COUNT(b.id) FILTER (WHERE b.status = 'confirmed'), 0) AS available_spots \
             FROM class_sessions cs \
             JOIN gym_classes c ON c.id = cs.class_id \
             LEFT JOIN bookings b ON b.session_id = cs.id \
             WHERE cs.is_active AND c.is_active \
               AND cs.starts_at > $1 \
               AND ($2::timestamptz IS NULL OR cs.starts_at <= $2) \
             GROUP BY cs.id, c.name, c.default_capacity \
             ORDER BY cs.starts_at",
        )
        .bind(now)
        .bind(until)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to list bookable sessions", e)
        })
    }

    /// Availability snapshot for one session, floored at zero.
    ///
    /// Lock-free read for display; never used as the admission gate.
    pub async fn available_spots(&self, id: Uuid) -> AppResult<u32> {
        let spots: Option<i64> = sqlx::query_scalar(
            "SELECT GREATEST(COALESCE(cs.capacity_override, c.default_capacity)::bigint \
                 - COUNT(b.id) FILTER (WHERE b.status = 'confirmed'), 0) \
             FROM class_sessions cs \
             JOIN gym_classes c ON c.id = cs.class_id \
             LEFT JOIN bookings b ON b.session_id = cs.id \
             WHERE cs.id = $1 \
             GROUP BY cs.capacity_override, c.default_capacity",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to read available spots", e)
        })?;

        match spots {
            Some(n) => Ok(n as u32),
            None => Err(AppError::not_found(format!("Session {id} not found"))),
        }
    }

    /// Create a new class session.
    pub async fn create(&self, data: &CreateClassSession) -> AppResult<ClassSession> {
        sqlx::query_as::<_, ClassSession>(
            "INSERT INTO class_sessions (class_id, starts_at, capacity_override) \
             VALUES ($1, $2, $3) RETURNING *",
        )
        .bind(data.class_id)
        .bind(data.starts_at)
        .bind(data.capacity_override)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to create session", e))
    }

    /// Deactivate a session, closing it to new bookings.
    ///
    /// Existing confirmed bookings are untouched; cancellation remains
    /// available to their holders until the session starts.
    pub async fn deactivate(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE class_sessions SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to deactivate session", e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Session {id} not found")));
        }
        Ok(())
    }
}

/// Classify a `FOR UPDATE` failure.
///
/// `55P03` (lock_not_available, raised when `lock_timeout` elapses) and
/// `40P01` (deadlock_detected) map to `Busy`; everything else is a
/// storage fault.
fn map_lock_error(e: sqlx::Error) -> AppError {
    let contended = match &e {
        sqlx::Error::Database(db) => db
            .code()
            .is_some_and(|code| matches!(code.as_ref(), "55P03" | "40P01")),
        _ => false,
    };

    if contended {
        AppError::with_source(ErrorKind::Busy, "Session lock wait timed out", e)
    } else {
        AppError::with_source(ErrorKind::Database, "Failed to lock session", e)
    }
}
