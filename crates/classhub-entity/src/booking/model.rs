//! Booking entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::status::BookingStatus;

/// A member's claim on one unit of a class session's capacity.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Booking {
    /// Unique booking identifier.
    pub id: Uuid,
    /// The session this booking is for.
    pub session_id: Uuid,
    /// The member who holds the booking.
    pub member_id: Uuid,
    /// Current booking status.
    pub status: BookingStatus,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
    /// When the booking was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Whether this booking currently holds a spot in its session.
    pub fn is_confirmed(&self) -> bool {
        self.status == BookingStatus::Confirmed
    }
}

/// A booking joined with its session's schedule, used for ownership and
/// temporal checks on cancellation and for member-facing listings.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BookingWithSession {
    /// Unique booking identifier.
    pub id: Uuid,
    /// The session this booking is for.
    pub session_id: Uuid,
    /// The member who holds the booking.
    pub member_id: Uuid,
    /// Current booking status.
    pub status: BookingStatus,
    /// When the session starts.
    pub starts_at: DateTime<Utc>,
    /// Class display name.
    pub class_name: String,
    /// When the booking was created.
    pub created_at: DateTime<Utc>,
}
