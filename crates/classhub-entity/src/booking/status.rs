//! Booking status enumeration.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of a booking.
///
/// Every booking is created as `Confirmed`. The holder may transition it
/// to `Cancelled`; attendance marking transitions it to `Completed` or
/// `NoShow`. All three are terminal. Only `Confirmed` bookings count
/// toward a session's capacity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Holds one unit of the session's capacity.
    Confirmed,
    /// Cancelled by the holder; no longer counts toward capacity.
    Cancelled,
    /// The member attended the session.
    Completed,
    /// The member did not show up.
    NoShow,
}

impl BookingStatus {
    /// Check if the booking is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled | Self::Completed | Self::NoShow)
    }

    /// Whether this status counts toward the session's capacity.
    pub fn occupies_spot(&self) -> bool {
        matches!(self, Self::Confirmed)
    }

    /// Whether a transition from this status to `next` is allowed.
    pub fn can_transition_to(&self, next: BookingStatus) -> bool {
        match self {
            Self::Confirmed => next != Self::Confirmed,
            _ => false,
        }
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::NoShow => "no_show",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
