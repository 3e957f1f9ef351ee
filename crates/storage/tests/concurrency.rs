//! Many members racing for the same seats.

mod common;

use common::Gym;
use std::sync::Arc;
use storage::booking::{Actor, BookingOutcome};
use storage::error::BookingError;
use storage::models::ReservationStatus;

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_bookings_never_oversell() {
    let gym = Gym::open().await;
    let class = gym.evening_class(5, false).await;

    let mut members = Vec::new();
    for i in 0..100 {
        members.push(gym.member(&format!("Member {}", i)).await);
    }

    let mut handles = Vec::new();
    for member in members {
        let engine = Arc::clone(&gym.engine);
        let class_id = class.class_id;
        handles.push(tokio::spawn(async move {
            engine.book(member.member_id, class_id).await
        }));
    }

    let mut confirmed = 0;
    let mut full = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(BookingOutcome::Confirmed(_)) => confirmed += 1,
            Err(BookingError::ClassFull) => full += 1,
            other => panic!("unexpected booking result: {other:?}"),
        }
    }

    assert_eq!(confirmed, 5);
    assert_eq!(full, 95);
    let availability = gym.engine.availability(class.class_id).await.unwrap();
    assert_eq!(availability.reserved, 5);
    gym.engine.audit().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_same_member_racing_gets_one_seat() {
    let gym = Gym::open().await;
    let class = gym.evening_class(10, true).await;
    let member = gym.member("Ana Torres").await;

    let mut handles = Vec::new();
    for _ in 0..20 {
        let engine = Arc::clone(&gym.engine);
        let (member_id, class_id) = (member.member_id, class.class_id);
        handles.push(tokio::spawn(async move { engine.book(member_id, class_id).await }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => wins += 1,
            Err(BookingError::DuplicateActiveReservation) => {}
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }

    assert_eq!(wins, 1);
    let roster = gym.engine.class_roster(class.class_id).await.unwrap();
    assert_eq!(roster.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn test_concurrent_cancellations_promote_in_join_order() {
    let gym = Gym::open().await;
    let class = gym.evening_class(4, true).await;

    let mut holders = Vec::new();
    for i in 0..4 {
        let member = gym.member(&format!("Holder {}", i)).await;
        match gym.engine.book(member.member_id, class.class_id).await.unwrap() {
            BookingOutcome::Confirmed(r) => holders.push(r),
            other => panic!("expected a seat, got {other:?}"),
        }
    }

    let mut waiting = Vec::new();
    for i in 0..6 {
        let member = gym.member(&format!("Waiting {}", i)).await;
        gym.engine
            .join_waitlist(member.member_id, class.class_id)
            .await
            .unwrap();
        waiting.push(member.member_id);
    }

    let mut handles = Vec::new();
    for reservation in holders {
        let engine = Arc::clone(&gym.engine);
        handles.push(tokio::spawn(async move {
            engine
                .cancel_reservation(reservation.reservation_id, Actor::Admin)
                .await
        }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().promoted.is_some());
    }

    let availability = gym.engine.availability(class.class_id).await.unwrap();
    assert_eq!(availability.reserved, 4);
    assert_eq!(availability.waiting, 2);

    let mut promoted: Vec<_> = gym
        .engine
        .class_roster(class.class_id)
        .await
        .unwrap()
        .into_iter()
        .filter(|r| r.status == ReservationStatus::Confirmed)
        .map(|r| r.member_id)
        .collect();
    promoted.sort();
    let mut expected = waiting[..4].to_vec();
    expected.sort();
    assert_eq!(promoted, expected);

    let queue = gym.engine.class_waitlist(class.class_id).await.unwrap();
    assert_eq!(
        queue.iter().map(|e| (e.member_id, e.position)).collect::<Vec<_>>(),
        vec![(waiting[4], 1), (waiting[5], 2)]
    );
    gym.engine.audit().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_different_classes_book_independently() {
    let gym = Gym::open().await;
    let mut classes = Vec::new();
    for _ in 0..4 {
        classes.push(gym.evening_class(3, false).await);
    }
    let member_ids: Vec<_> = {
        let mut ids = Vec::new();
        for i in 0..6 {
            ids.push(gym.member(&format!("Member {}", i)).await.member_id);
        }
        ids
    };

    let mut handles = Vec::new();
    for class in &classes {
        for member_id in &member_ids {
            let engine = Arc::clone(&gym.engine);
            let (member_id, class_id) = (*member_id, class.class_id);
            handles.push(tokio::spawn(async move { engine.book(member_id, class_id).await }));
        }
    }
    for handle in handles {
        let _ = handle.await.unwrap();
    }

    for class in &classes {
        let availability = gym.engine.availability(class.class_id).await.unwrap();
        assert_eq!(availability.reserved, 3);
    }
    gym.engine.audit().await.unwrap();
}
