//! Admission rules for reservation and cancellation attempts.
//!
//! Pure decision functions evaluated by every store backend *inside* its
//! session-scoped critical section, against state frozen under the lock.
//! Keeping them here means the PostgreSQL and in-memory backends cannot
//! disagree about what is bookable or cancellable.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use classhub_core::error::AppError;
use classhub_core::result::AppResult;
use classhub_entity::booking::BookingStatus;
use classhub_entity::session::LockedSession;

/// Decide whether a reservation attempt may proceed.
///
/// `confirmed_count` and `member_already_booked` must have been read under
/// the same lock that froze `session`.
///
/// A member who already holds a spot hears `AlreadyReserved` even when the
/// session is also full; the duplicate check therefore runs before the
/// capacity check.
pub fn check_reserve(
    session: &LockedSession,
    confirmed_count: i64,
    member_already_booked: bool,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if !session.is_bookable(now) {
        return Err(AppError::not_found(format!(
            "Session {} is not open for booking",
            session.id
        )));
    }

    if member_already_booked {
        return Err(AppError::already_reserved(format!(
            "Member already has a confirmed booking for session {}",
            session.id
        )));
    }

    if confirmed_count >= i64::from(session.effective_capacity) {
        return Err(AppError::capacity_exceeded(format!(
            "Session {} is fully booked ({} spots)",
            session.id, session.effective_capacity
        )));
    }

    Ok(())
}

/// Decide whether a cancellation attempt may proceed.
///
/// Ownership is checked first so that non-owners learn nothing about the
/// booking's state. Terminal statuses (`cancelled`, `completed`,
/// `no_show`) all report `AlreadyCancelled`; past sessions are immutable
/// history and report `PastSession`.
pub fn check_cancel(
    status: BookingStatus,
    owner: Uuid,
    session_starts_at: DateTime<Utc>,
    requesting_member: Uuid,
    now: DateTime<Utc>,
) -> AppResult<()> {
    if owner != requesting_member {
        return Err(AppError::forbidden(
            "Only the booking's holder may cancel it",
        ));
    }

    if !status.can_transition_to(BookingStatus::Cancelled) {
        return Err(AppError::already_cancelled(format!(
            "Booking is already {status}"
        )));
    }

    if session_starts_at <= now {
        return Err(AppError::past_session(
            "Bookings for past sessions cannot be cancelled",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;
    use classhub_core::error::ErrorKind;

    fn session(capacity: i32) -> LockedSession {
        LockedSession {
            id: Uuid::new_v4(),
            class_id: Uuid::new_v4(),
            starts_at: Utc::now() + TimeDelta::hours(3),
            effective_capacity: capacity,
            is_active: true,
            class_active: true,
        }
    }

    #[test]
    fn test_reserve_with_spots_left() {
        assert!(check_reserve(&session(5), 4, false, Utc::now()).is_ok());
    }

    #[test]
    fn test_reserve_full_session() {
        let err = check_reserve(&session(5), 5, false, Utc::now()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CapacityExceeded);
    }

    #[test]
    fn test_reserve_zero_capacity_session() {
        let err = check_reserve(&session(0), 0, false, Utc::now()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::CapacityExceeded);
    }

    #[test]
    fn test_reserve_duplicate_member() {
        let err = check_reserve(&session(5), 1, true, Utc::now()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyReserved);
    }

    #[test]
    fn test_duplicate_reported_before_capacity() {
        // Member already in a full session: AlreadyReserved, not CapacityExceeded.
        let err = check_reserve(&session(2), 2, true, Utc::now()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::AlreadyReserved);
    }

    #[test]
    fn test_reserve_past_session() {
        let mut s = session(5);
        s.starts_at = Utc::now() - TimeDelta::hours(1);
        let err = check_reserve(&s, 0, false, Utc::now()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_reserve_inactive_session_or_class() {
        let mut s = session(5);
        s.is_active = false;
        let err = check_reserve(&s, 0, false, Utc::now()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let mut s = session(5);
        s.class_active = false;
        let err = check_reserve(&s, 0, false, Utc::now()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_cancel_own_confirmed_booking() {
        let member = Uuid::new_v4();
        let starts = Utc::now() + TimeDelta::hours(2);
        assert!(check_cancel(BookingStatus::Confirmed, member, starts, member, Utc::now()).is_ok());
    }

    #[test]
    fn test_cancel_by_non_owner() {
        let starts = Utc::now() + TimeDelta::hours(2);
        let err = check_cancel(
            BookingStatus::Confirmed,
            Uuid::new_v4(),
            starts,
            Uuid::new_v4(),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }

    #[test]
    fn test_cancel_terminal_statuses() {
        let member = Uuid::new_v4();
        let starts = Utc::now() + TimeDelta::hours(2);
        for status in [
            BookingStatus::Cancelled,
            BookingStatus::Completed,
            BookingStatus::NoShow,
        ] {
            let err = check_cancel(status, member, starts, member, Utc::now()).unwrap_err();
            assert_eq!(err.kind, ErrorKind::AlreadyCancelled);
        }
    }

    #[test]
    fn test_cancel_past_session() {
        let member = Uuid::new_v4();
        let starts = Utc::now() - TimeDelta::minutes(30);
        let err =
            check_cancel(BookingStatus::Confirmed, member, starts, member, Utc::now()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::PastSession);
    }

    #[test]
    fn test_ownership_checked_before_status() {
        // A stranger probing a cancelled booking gets Forbidden, not state info.
        let starts = Utc::now() + TimeDelta::hours(2);
        let err = check_cancel(
            BookingStatus::Cancelled,
            Uuid::new_v4(),
            starts,
            Uuid::new_v4(),
            Utc::now(),
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Forbidden);
    }
}
