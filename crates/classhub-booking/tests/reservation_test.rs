//! Reservation manager behavior tests against the in-memory store.
//!
//! Temporal edge cases drive the store directly so the test controls the
//! `now` reference; happy paths go through `BookingService`.

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use futures::future::join_all;

use classhub_booking::{BookingService, MemoryReservationStore, ReservationStore};
use classhub_core::config::BookingConfig;
use classhub_core::error::ErrorKind;
use classhub_core::types::id::{BookingId, ClassSessionId, MemberId};

fn store() -> MemoryReservationStore {
    MemoryReservationStore::new(&BookingConfig::default())
}

async fn seed_session(store: &MemoryReservationStore, capacity: i32) -> ClassSessionId {
    let id = ClassSessionId::new();
    store
        .add_session(id, Utc::now() + TimeDelta::hours(4), capacity)
        .await;
    id
}

#[tokio::test]
async fn test_reserve_returns_confirmed_booking() {
    let store = store();
    let session = seed_session(&store, 5).await;
    let member = MemberId::new();

    let service = BookingService::new(Arc::new(store.clone()));
    let booking = service.reserve(session, member).await.expect("should book");

    assert!(booking.is_confirmed());
    assert_eq!(booking.session_id, session.into_uuid());
    assert_eq!(booking.member_id, member.into_uuid());
    assert_eq!(service.available_spots(session).await.unwrap(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_reserves_never_exceed_capacity() {
    let store = store();
    let session = seed_session(&store, 2).await;

    let attempts = (0..3).map(|_| {
        let store = store.clone();
        let member = MemberId::new();
        tokio::spawn(async move { store.reserve(session, member, Utc::now()).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.expect("task should not panic"))
        .collect();

    let successes = results.iter().filter(|r| r.is_ok()).count();
    let capacity_rejections = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.kind == ErrorKind::CapacityExceeded))
        .count();

    assert_eq!(successes, 2);
    assert_eq!(capacity_rejections, 1);
    assert_eq!(store.confirmed_count(session).await, 2);
    assert_eq!(store.available_spots(session).await.unwrap(), 0);
}

#[tokio::test]
async fn test_duplicate_reserve_rejected() {
    let store = store();
    let session = seed_session(&store, 5).await;
    let member = MemberId::new();

    store
        .reserve(session, member, Utc::now())
        .await
        .expect("first attempt should book");
    let err = store
        .reserve(session, member, Utc::now())
        .await
        .expect_err("second attempt should be rejected");

    assert_eq!(err.kind, ErrorKind::AlreadyReserved);
    assert_eq!(store.confirmed_count(session).await, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicate_attempts_book_once() {
    let store = store();
    let session = seed_session(&store, 10).await;
    let member = MemberId::new();

    let attempts = (0..4).map(|_| {
        let store = store.clone();
        tokio::spawn(async move { store.reserve(session, member, Utc::now()).await })
    });
    let results: Vec<_> = join_all(attempts)
        .await
        .into_iter()
        .map(|r| r.expect("task should not panic"))
        .collect();

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert_eq!(store.confirmed_count(session).await, 1);
}

#[tokio::test]
async fn test_cancel_frees_capacity() {
    let store = store();
    let session = seed_session(&store, 1).await;
    let first = MemberId::new();
    let second = MemberId::new();

    let booking = store
        .reserve(session, first, Utc::now())
        .await
        .expect("first member should book");
    let err = store
        .reserve(session, second, Utc::now())
        .await
        .expect_err("session should be full");
    assert_eq!(err.kind, ErrorKind::CapacityExceeded);

    let cancelled = store
        .cancel(BookingId::from_uuid(booking.id), first, Utc::now())
        .await
        .expect("holder should cancel");
    assert!(!cancelled.is_confirmed());

    store
        .reserve(session, second, Utc::now())
        .await
        .expect("freed spot should be bookable");
    assert_eq!(store.confirmed_count(session).await, 1);
}

#[tokio::test]
async fn test_cancel_is_idempotent() {
    let store = store();
    let session = seed_session(&store, 3).await;
    let member = MemberId::new();

    let booking = store.reserve(session, member, Utc::now()).await.unwrap();
    let id = BookingId::from_uuid(booking.id);

    store
        .cancel(id, member, Utc::now())
        .await
        .expect("first cancel should succeed");
    let err = store
        .cancel(id, member, Utc::now())
        .await
        .expect_err("second cancel should be rejected");

    assert_eq!(err.kind, ErrorKind::AlreadyCancelled);
    assert_eq!(store.confirmed_count(session).await, 0);
}

#[tokio::test]
async fn test_cancel_by_non_owner_forbidden() {
    let store = store();
    let session = seed_session(&store, 3).await;
    let owner = MemberId::new();

    let booking = store.reserve(session, owner, Utc::now()).await.unwrap();
    let err = store
        .cancel(BookingId::from_uuid(booking.id), MemberId::new(), Utc::now())
        .await
        .expect_err("stranger must not cancel");

    assert_eq!(err.kind, ErrorKind::Forbidden);
    assert_eq!(store.confirmed_count(session).await, 1);
}

#[tokio::test]
async fn test_past_session_rejections() {
    let store = store();
    let session = seed_session(&store, 3).await;
    let member = MemberId::new();

    let booking = store.reserve(session, member, Utc::now()).await.unwrap();

    // The session has started: reserving is NotFound, cancelling is PastSession.
    let after_start = Utc::now() + TimeDelta::hours(5);

    let err = store
        .reserve(session, MemberId::new(), after_start)
        .await
        .expect_err("past session should not be bookable");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = store
        .cancel(BookingId::from_uuid(booking.id), member, after_start)
        .await
        .expect_err("past booking should be immutable");
    assert_eq!(err.kind, ErrorKind::PastSession);
    assert_eq!(store.confirmed_count(session).await, 1);
}

#[tokio::test]
async fn test_inactive_session_not_bookable() {
    let store = store();
    let session = seed_session(&store, 3).await;
    store.deactivate_session(session).await;

    let err = store
        .reserve(session, MemberId::new(), Utc::now())
        .await
        .expect_err("inactive session should be rejected");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_unknown_ids_not_found() {
    let store = store();

    let err = store
        .reserve(ClassSessionId::new(), MemberId::new(), Utc::now())
        .await
        .expect_err("unknown session");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = store
        .cancel(BookingId::new(), MemberId::new(), Utc::now())
        .await
        .expect_err("unknown booking");
    assert_eq!(err.kind, ErrorKind::NotFound);

    let err = store
        .available_spots(ClassSessionId::new())
        .await
        .expect_err("unknown session");
    assert_eq!(err.kind, ErrorKind::NotFound);
}

#[tokio::test]
async fn test_failed_attempts_leave_no_state_behind() {
    let store = store();
    let session = seed_session(&store, 1).await;
    let winner = MemberId::new();

    store.reserve(session, winner, Utc::now()).await.unwrap();

    for _ in 0..3 {
        let _ = store
            .reserve(session, MemberId::new(), Utc::now())
            .await
            .expect_err("full session");
    }
    let _ = store
        .reserve(session, winner, Utc::now())
        .await
        .expect_err("duplicate");

    assert_eq!(store.confirmed_count(session).await, 1);
    assert_eq!(store.available_spots(session).await.unwrap(), 0);
}

#[tokio::test]
async fn test_service_cancel_roundtrip() {
    let store = store();
    let session = seed_session(&store, 2).await;
    let member = MemberId::new();
    let service = BookingService::new(Arc::new(store.clone()));

    let booking = service.reserve(session, member).await.unwrap();
    assert_eq!(service.available_spots(session).await.unwrap(), 1);

    let cancelled = service
        .cancel(BookingId::from_uuid(booking.id), member)
        .await
        .unwrap();
    assert!(!cancelled.is_confirmed());
    assert_eq!(service.available_spots(session).await.unwrap(), 2);
}
