//! Integration tests for Store action broadcasting and effect cancellation
//!
//! A small seat-hold workflow: a hold request goes through two backend
//! round-trips, and a cancellable countdown releases the hold unless it is
//! restarted or stopped.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)] // Test code can use unwrap/expect/panic

use bus_booking_core::{
    effect::{Effect, EffectId},
    reducer::Reducer,
    smallvec, SmallVec,
};
use bus_booking_runtime::{Store, StoreError};
use std::sync::Arc;
use std::time::Duration;

const RELEASE: EffectId = EffectId::new("release");

// ============================================================================
// Test Fixtures
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
enum HoldAction {
    /// Ask the backend to hold a seat
    RequestHold { seat: u32 },
    /// Seat locked, order not yet created
    SeatLocked { seat: u32 },
    /// Order created (terminal)
    HoldConfirmed { seat: u32 },
    /// Never produced
    HoldRejected { seat: u32 },
    /// (Re)start the release countdown
    StartCountdown { after: Duration },
    /// Stop the countdown
    StopCountdown,
    /// Countdown ran out
    Released,
}

#[derive(Debug, Clone, Default)]
struct HoldState {
    locked: Vec<u32>,
    confirmed: Vec<u32>,
    released: u32,
}

struct HoldReducer;

impl Reducer for HoldReducer {
    type State = HoldState;
    type Action = HoldAction;
    type Environment = ();

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        _env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            HoldAction::RequestHold { seat } => smallvec![Effect::Future(Box::pin(async move {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Some(HoldAction::SeatLocked { seat })
            }))],
            HoldAction::SeatLocked { seat } => {
                state.locked.push(seat);
                smallvec![Effect::Future(Box::pin(async move {
                    tokio::time::sleep(Duration::from_millis(10)).await;
                    Some(HoldAction::HoldConfirmed { seat })
                }))]
            },
            HoldAction::HoldConfirmed { seat } => {
                state.confirmed.push(seat);
                smallvec![Effect::None]
            },
            HoldAction::HoldRejected { .. } => smallvec![Effect::None],
            HoldAction::StartCountdown { after } => smallvec![
                Effect::Cancel(RELEASE),
                Effect::Delay {
                    duration: after,
                    action: Box::new(HoldAction::Released),
                }
                .cancellable(RELEASE),
            ],
            HoldAction::StopCountdown => smallvec![Effect::Cancel(RELEASE)],
            HoldAction::Released => {
                state.released += 1;
                smallvec![Effect::None]
            },
        }
    }
}

fn store() -> Store<HoldState, HoldAction, (), HoldReducer> {
    Store::new(HoldState::default(), HoldReducer, ())
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_send_and_wait_for_multi_step_workflow() {
    let store = store();

    let result = store
        .send_and_wait_for(
            HoldAction::RequestHold { seat: 7 },
            |action| matches!(action, HoldAction::HoldConfirmed { seat: 7 }),
            Duration::from_secs(1),
        )
        .await
        .unwrap();

    assert_eq!(result, HoldAction::HoldConfirmed { seat: 7 });
    assert_eq!(store.state(|s| s.locked.clone()).await, vec![7]);
}

#[tokio::test]
async fn test_send_and_wait_for_timeout() {
    let store = store();

    let result = store
        .send_and_wait_for(
            HoldAction::RequestHold { seat: 3 },
            |action| matches!(action, HoldAction::HoldRejected { .. }),
            Duration::from_millis(50),
        )
        .await;

    assert!(matches!(result, Err(StoreError::Timeout)));
}

#[tokio::test]
async fn test_concurrent_waiters_see_their_own_outcome() {
    let store = Arc::new(store());

    let mut handles = vec![];
    for seat in 1..=5 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .send_and_wait_for(
                    HoldAction::RequestHold { seat },
                    move |action| matches!(action, HoldAction::HoldConfirmed { seat: s } if *s == seat),
                    Duration::from_secs(2),
                )
                .await
        }));
    }

    for handle in handles {
        assert!(handle.await.expect("task panicked").is_ok());
    }

    let mut confirmed = store.state(|s| s.confirmed.clone()).await;
    confirmed.sort_unstable();
    assert_eq!(confirmed, vec![1, 2, 3, 4, 5]);
}

#[tokio::test]
async fn test_subscribers_receive_effect_actions_only() {
    let store = store();
    let mut rx = store.subscribe_actions();

    let mut handle = store.send(HoldAction::RequestHold { seat: 9 }).await.unwrap();
    handle.wait().await;

    assert_eq!(rx.recv().await.unwrap(), HoldAction::SeatLocked { seat: 9 });
    assert_eq!(rx.recv().await.unwrap(), HoldAction::HoldConfirmed { seat: 9 });
    assert!(rx.try_recv().is_err());
}

#[tokio::test(start_paused = true)]
async fn test_restarted_countdown_fires_once() {
    let store = store();

    store
        .send(HoldAction::StartCountdown {
            after: Duration::from_secs(60),
        })
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_secs(30)).await;
    store
        .send(HoldAction::StartCountdown {
            after: Duration::from_secs(60),
        })
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(45)).await;
    assert_eq!(store.state(|s| s.released).await, 0);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(store.state(|s| s.released).await, 1);
    assert_eq!(store.pending_effects(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_stopped_countdown_never_fires() {
    let store = store();

    store
        .send(HoldAction::StartCountdown {
            after: Duration::from_secs(60),
        })
        .await
        .unwrap();
    store.send(HoldAction::StopCountdown).await.unwrap();

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(store.state(|s| s.released).await, 0);
    assert_eq!(store.pending_effects(), 0);
}

#[tokio::test]
async fn test_shutdown_waits_for_effects_then_rejects() {
    let store = store();

    store.send(HoldAction::RequestHold { seat: 1 }).await.unwrap();
    store.shutdown(Duration::from_secs(1)).await.unwrap();

    assert!(matches!(
        store.send(HoldAction::RequestHold { seat: 2 }).await,
        Err(StoreError::ShutdownInProgress)
    ));
}
