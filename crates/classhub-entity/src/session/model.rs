//! Class session entity model and query projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A single scheduled occurrence of a gym class.
///
/// Sessions are what members actually book. The session may override the
/// parent class's capacity; otherwise the class default applies.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClassSession {
    /// Unique session identifier.
    pub id: Uuid,
    /// The class this session is an occurrence of.
    pub class_id: Uuid,
    /// Scheduled start date and time.
    pub starts_at: DateTime<Utc>,
    /// Capacity override for this occurrence (null uses the class default).
    pub capacity_override: Option<i32>,
    /// Whether this session is open for booking.
    pub is_active: bool,
    /// When the session was created.
    pub created_at: DateTime<Utc>,
    /// When the session was last updated.
    pub updated_at: DateTime<Utc>,
}

impl ClassSession {
    /// The capacity that applies to this session, given its class default.
    pub fn effective_capacity(&self, class_default: i32) -> i32 {
        self.capacity_override.unwrap_or(class_default)
    }
}

/// Data required to create a new class session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateClassSession {
    /// The parent class.
    pub class_id: Uuid,
    /// Scheduled start date and time.
    pub starts_at: DateTime<Utc>,
    /// Capacity override (None uses the class default).
    pub capacity_override: Option<i32>,
}

/// Projection of a session row read under an exclusive row lock.
///
/// Produced by the `SELECT ... FOR UPDATE` join against the parent class,
/// with the effective capacity already resolved in SQL.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LockedSession {
    /// Unique session identifier.
    pub id: Uuid,
    /// The parent class.
    pub class_id: Uuid,
    /// Scheduled start date and time.
    pub starts_at: DateTime<Utc>,
    /// `COALESCE(capacity_override, class default)`.
    pub effective_capacity: i32,
    /// Whether the session row is active.
    pub is_active: bool,
    /// Whether the parent class is active.
    pub class_active: bool,
}

impl LockedSession {
    /// Whether the session can accept new bookings at `now`.
    ///
    /// A session is bookable while it and its class are active and its
    /// start time has not passed.
    pub fn is_bookable(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.class_active && self.starts_at > now
    }
}

/// Listing projection for the booking catalog: a future session with its
/// current availability snapshot. Display only; availability is
/// re-validated under lock on every reservation attempt.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookableSession {
    /// Unique session identifier.
    pub id: Uuid,
    /// The parent class.
    pub class_id: Uuid,
    /// Class display name.
    pub class_name: String,
    /// Scheduled start date and time.
    pub starts_at: DateTime<Utc>,
    /// `COALESCE(capacity_override, class default)`.
    pub effective_capacity: i32,
    /// Spots still open at snapshot time, floored at zero.
    pub available_spots: i64,
}
