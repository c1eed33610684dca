//! Booking and schedule services — the surface exposed to the
//! surrounding request-handling layer.
//!
//! Services follow constructor injection; the booking service is generic
//! over the store backend via `Arc<dyn ReservationStore>`.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use classhub_core::config::BookingConfig;
use classhub_core::error::ErrorKind;
use classhub_core::result::AppResult;
use classhub_core::types::id::{BookingId, ClassSessionId, MemberId};
use classhub_database::repositories::{BookingRepository, SessionRepository};
use classhub_database::DatabasePool;
use classhub_entity::booking::{Booking, BookingWithSession};
use classhub_entity::session::BookableSession;

use crate::store::ReservationStore;

/// The reservation manager's public API.
///
/// Each call is a single all-or-nothing attempt; the temporal reference
/// for validity checks is taken once per call.
#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn ReservationStore>,
}

impl std::fmt::Debug for BookingService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BookingService").finish()
    }
}

impl BookingService {
    /// Creates a new booking service over the given store backend.
    pub fn new(store: Arc<dyn ReservationStore>) -> Self {
        Self { store }
    }

    /// Reserve one spot in a session for a member.
    pub async fn reserve(
        &self,
        session_id: ClassSessionId,
        member_id: MemberId,
    ) -> AppResult<Booking> {
        match self.store.reserve(session_id, member_id, Utc::now()).await {
            Ok(booking) => {
                info!(
                    session_id = %session_id,
                    member_id = %member_id,
                    booking_id = %booking.id,
                    "Booking confirmed"
                );
                Ok(booking)
            }
            Err(e) => {
                log_failure("Reservation", session_id.into_uuid(), &e);
                Err(e)
            }
        }
    }

    /// Cancel a confirmed booking on behalf of its holder.
    pub async fn cancel(&self, booking_id: BookingId, member_id: MemberId) -> AppResult<Booking> {
        match self.store.cancel(booking_id, member_id, Utc::now()).await {
            Ok(booking) => {
                info!(
                    booking_id = %booking.id,
                    session_id = %booking.session_id,
                    member_id = %member_id,
                    "Booking cancelled"
                );
                Ok(booking)
            }
            Err(e) => {
                log_failure("Cancellation", booking_id.into_uuid(), &e);
                Err(e)
            }
        }
    }

    /// Availability snapshot for display.
    pub async fn available_spots(&self, session_id: ClassSessionId) -> AppResult<u32> {
        self.store.available_spots(session_id).await
    }
}

fn log_failure(operation: &str, target: uuid::Uuid, e: &classhub_core::error::AppError) {
    match e.kind {
        ErrorKind::Database | ErrorKind::Internal => {
            error!(
                operation = operation,
                target_id = %target,
                error = %e,
                "Booking operation failed"
            );
        }
        _ => {
            warn!(
                operation = operation,
                target_id = %target,
                kind = %e.kind,
                "Booking operation rejected"
            );
        }
    }
}

/// A member's bookings split into upcoming and past.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberBookings {
    /// Confirmed bookings for sessions that have not started.
    pub upcoming: Vec<BookingWithSession>,
    /// Everything else: finished sessions and terminal bookings.
    pub past: Vec<BookingWithSession>,
}

/// Read-only schedule and booking-history queries.
///
/// Backed directly by the PostgreSQL repositories; none of these reads
/// participate in the reservation critical section.
#[derive(Debug, Clone)]
pub struct ScheduleService {
    sessions: SessionRepository,
    bookings: BookingRepository,
    horizon_days: u32,
}

impl ScheduleService {
    /// Creates a new schedule service.
    pub fn new(db: &DatabasePool, config: &BookingConfig) -> Self {
        let pool = db.pool().clone();
        Self {
            sessions: SessionRepository::new(pool.clone()),
            bookings: BookingRepository::new(pool),
            horizon_days: config.booking_horizon_days,
        }
    }

    /// List sessions currently open for booking, with availability
    /// snapshots, inside the configured booking horizon.
    pub async fn list_bookable(&self) -> AppResult<Vec<BookableSession>> {
        let now = Utc::now();
        let until = if self.horizon_days > 0 {
            Some(now + TimeDelta::days(i64::from(self.horizon_days)))
        } else {
            None
        };
        self.sessions.find_bookable(now, until).await
    }

    /// A member's bookings split into upcoming and past.
    pub async fn member_bookings(&self, member_id: MemberId) -> AppResult<MemberBookings> {
        let now = Utc::now();
        Ok(MemberBookings {
            upcoming: self
                .bookings
                .find_upcoming_by_member(member_id.into_uuid(), now)
                .await?,
            past: self
                .bookings
                .find_past_by_member(member_id.into_uuid(), now)
                .await?,
        })
    }
}
