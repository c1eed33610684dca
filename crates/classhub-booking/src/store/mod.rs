//! Reservation store backends.
//!
//! The trait is the serialization boundary of the reservation manager:
//! each backend runs the read-count-validate-insert sequence of a
//! reservation attempt inside an exclusive critical section scoped to one
//! session, and rolls the whole attempt back on any failure. Two
//! implementations are provided:
//! - PostgreSQL (row-level `FOR UPDATE` lock inside a transaction)
//! - In-memory (single `tokio::sync::Mutex`, for single-node use and tests)

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use classhub_core::result::AppResult;
use classhub_core::types::id::{BookingId, ClassSessionId, MemberId};
use classhub_entity::booking::Booking;

/// Storage backend for reservation attempts.
///
/// Implementations must guarantee that `reserve` is atomic and totally
/// ordered per session: either a confirmed booking is persisted with both
/// invariants re-validated under the session lock, or no state changes at
/// all. Waiting on the session lock is bounded; exceeding the deadline
/// fails with `Busy` rather than blocking indefinitely.
#[async_trait]
pub trait ReservationStore: Send + Sync + 'static {
    /// Attempt to reserve one spot in a session for a member.
    ///
    /// `now` is the temporal-validity reference for the attempt.
    async fn reserve(
        &self,
        session_id: ClassSessionId,
        member_id: MemberId,
        now: DateTime<Utc>,
    ) -> AppResult<Booking>;

    /// Cancel a confirmed booking on behalf of its holder.
    ///
    /// Frees one unit of the session's capacity from the moment the
    /// status write commits.
    async fn cancel(
        &self,
        booking_id: BookingId,
        member_id: MemberId,
        now: DateTime<Utc>,
    ) -> AppResult<Booking>;

    /// Availability snapshot for display. Lock-free and eventually
    /// consistent; never the admission gate.
    async fn available_spots(&self, session_id: ClassSessionId) -> AppResult<u32>;
}
