//! In-memory reservation store using a Tokio mutex for single-node use.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tokio::time::timeout;
use uuid::Uuid;

use classhub_core::config::BookingConfig;
use classhub_core::error::AppError;
use classhub_core::result::AppResult;
use classhub_core::types::id::{BookingId, ClassSessionId, MemberId};
use classhub_entity::booking::{Booking, BookingStatus};
use classhub_entity::session::LockedSession;

use crate::admission;
use crate::store::ReservationStore;

/// A seeded session in the in-memory store.
#[derive(Debug, Clone)]
struct MemorySession {
    class_id: Uuid,
    starts_at: DateTime<Utc>,
    effective_capacity: i32,
    is_active: bool,
}

/// Internal state for the memory-based reservation store.
#[derive(Debug, Default)]
struct MemoryState {
    sessions: HashMap<Uuid, MemorySession>,
    bookings: HashMap<Uuid, Booking>,
}

/// In-memory reservation store using a Tokio mutex for thread safety.
///
/// Suitable for single-node deployments and tests only. One mutex guards
/// the whole store, so attempts against different sessions serialize too;
/// per-session lock granularity is the PostgreSQL backend's territory.
/// Lock acquisition is bounded by the configured deadline the same way
/// the row-lock wait is, surfacing `Busy` when it elapses.
#[derive(Debug, Clone)]
pub struct MemoryReservationStore {
    state: Arc<Mutex<MemoryState>>,
    lock_timeout: Duration,
}

impl MemoryReservationStore {
    /// Creates a new memory-based reservation store.
    pub fn new(config: &BookingConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            lock_timeout: Duration::from_millis(config.lock_timeout_ms),
        }
    }

    /// Seed a bookable session.
    pub async fn add_session(
        &self,
        id: ClassSessionId,
        starts_at: DateTime<Utc>,
        capacity: i32,
    ) {
        let mut state = self.state.lock().await;
        state.sessions.insert(
            id.into_uuid(),
            MemorySession {
                class_id: Uuid::new_v4(),
                starts_at,
                effective_capacity: capacity,
                is_active: true,
            },
        );
    }

    /// Close a seeded session to new bookings.
    pub async fn deactivate_session(&self, id: ClassSessionId) {
        let mut state = self.state.lock().await;
        if let Some(session) = state.sessions.get_mut(id.as_uuid()) {
            session.is_active = false;
        }
    }

    /// Number of confirmed bookings for a session.
    pub async fn confirmed_count(&self, id: ClassSessionId) -> usize {
        let state = self.state.lock().await;
        state
            .bookings
            .values()
            .filter(|b| b.session_id == id.into_uuid() && b.status.occupies_spot())
            .count()
    }
}

fn locked_view(id: Uuid, session: &MemorySession) -> LockedSession {
    LockedSession {
        id,
        class_id: session.class_id,
        starts_at: session.starts_at,
        effective_capacity: session.effective_capacity,
        is_active: session.is_active,
        class_active: true,
    }
}

#[async_trait]
impl ReservationStore for MemoryReservationStore {
    async fn reserve(
        &self,
        session_id: ClassSessionId,
        member_id: MemberId,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let mut state = timeout(self.lock_timeout, self.state.lock())
            .await
            .map_err(|_| AppError::busy("Reservation lock wait timed out"))?;

        let sid = session_id.into_uuid();
        let session = state
            .sessions
            .get(&sid)
            .ok_or_else(|| AppError::not_found(format!("Session {session_id} not found")))?;
        let locked = locked_view(sid, session);

        let confirmed = state
            .bookings
            .values()
            .filter(|b| b.session_id == sid && b.status.occupies_spot())
            .count() as i64;
        let duplicate = state
            .bookings
            .values()
            .any(|b| {
                b.session_id == sid
                    && b.member_id == member_id.into_uuid()
                    && b.status.occupies_spot()
            });

        admission::check_reserve(&locked, confirmed, duplicate, now)?;

        let booking = Booking {
            id: Uuid::new_v4(),
            session_id: sid,
            member_id: member_id.into_uuid(),
            status: BookingStatus::Confirmed,
            created_at: now,
            updated_at: now,
        };
        state.bookings.insert(booking.id, booking.clone());

        Ok(booking)
    }

    async fn cancel(
        &self,
        booking_id: BookingId,
        member_id: MemberId,
        now: DateTime<Utc>,
    ) -> AppResult<Booking> {
        let mut state = self.state.lock().await;

        let (status, owner, session_id) = {
            let booking = state
                .bookings
                .get(booking_id.as_uuid())
                .ok_or_else(|| AppError::not_found(format!("Booking {booking_id} not found")))?;
            (booking.status, booking.member_id, booking.session_id)
        };

        let starts_at = state
            .sessions
            .get(&session_id)
            .map(|s| s.starts_at)
            .ok_or_else(|| {
                AppError::internal(format!("Booking {booking_id} references a missing session"))
            })?;

        admission::check_cancel(status, owner, starts_at, member_id.into_uuid(), now)?;

        match state.bookings.get_mut(booking_id.as_uuid()) {
            Some(booking) => {
                booking.status = BookingStatus::Cancelled;
                booking.updated_at = now;
                Ok(booking.clone())
            }
            None => Err(AppError::internal(format!(
                "Booking {booking_id} disappeared during cancellation"
            ))),
        }
    }

    async fn available_spots(&self, session_id: ClassSessionId) -> AppResult<u32> {
        let state = self.state.lock().await;

        let sid = session_id.into_uuid();
        let session = state
            .sessions
            .get(&sid)
            .ok_or_else(|| AppError::not_found(format!("Session {session_id} not found")))?;

        let confirmed = state
            .bookings
            .values()
            .filter(|b| b.session_id == sid && b.status.occupies_spot())
            .count() as i64;

        Ok(i64::from(session.effective_capacity)
            .saturating_sub(confirmed)
            .max(0) as u32)
    }
}
