//! # Bus Booking Testing
//!
//! Testing utilities and helpers for the bus booking client.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - A Given-When-Then harness for reducers
//! - Assertion helpers for effects
//! - Helpers that drive effect futures without a store
//!
//! ## Example
//!
//! ```ignore
//! use bus_booking_testing::{ReducerTest, assertions};
//!
//! ReducerTest::new(FlowReducer::new())
//!     .with_env(test_environment())
//!     .given_state(BookingFlowState::new())
//!     .when_action(FlowAction::SubmitSearch { .. })
//!     .then_effects(assertions::assert_has_future_effect)
//!     .run();
//! ```

use bus_booking_core::environment::Clock;
use chrono::{DateTime, Utc};


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use bus_booking_testing::mocks::FixedClock;
    /// use bus_booking_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-06-01 09:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::from_timestamp(1_748_768_400, 0).unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
        )
    }
}

/// Helpers for running effects outside a store
pub mod helpers {
    use bus_booking_core::effect::Effect;

    /// Await every future in `effects` and collect the actions they produce
    ///
    /// Nested `Parallel`, `Sequential` and `Cancellable` effects are flattened
    /// in declaration order. Delays and cancels produce nothing.
    pub async fn collect_actions<A>(effects: impl IntoIterator<Item = Effect<A>>) -> Vec<A> {
        let mut pending: Vec<Effect<A>> = effects.into_iter().collect();
        pending.reverse();

        let mut actions = Vec::new();
        while let Some(effect) = pending.pop() {
            match effect {
                Effect::Future(fut) => {
                    if let Some(action) = fut.await {
                        actions.push(action);
                    }
                },
                Effect::Parallel(nested) | Effect::Sequential(nested) => {
                    pending.extend(nested.into_iter().rev());
                },
                Effect::Cancellable { effect, .. } => pending.push(*effect),
                Effect::None | Effect::Delay { .. } | Effect::Cancel(_) => {},
            }
        }
        actions
    }
}

/// Helper assertions for effects
pub mod assertions {
    use bus_booking_core::effect::{Effect, EffectId};

    fn any_effect<A>(effects: &[Effect<A>], predicate: &dyn Fn(&Effect<A>) -> bool) -> bool {
        effects.iter().any(|effect| match effect {
            Effect::Parallel(nested) | Effect::Sequential(nested) => {
                predicate(effect) || any_effect(nested, predicate)
            },
            Effect::Cancellable { effect: inner, .. } => {
                predicate(effect) || any_effect(std::slice::from_ref(inner.as_ref()), predicate)
            },
            _ => predicate(effect),
        })
    }

    /// Assert that there are no effects
    ///
    /// # Panics
    ///
    /// Panics if effects is not empty.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_effects<A: std::fmt::Debug>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(|e| matches!(e, Effect::None)),
            "Expected no effects, but found {}: {:?}",
            effects.len(),
            effects
        );
    }

    /// Assert the number of effects
    ///
    /// # Panics
    ///
    /// Panics if the number of effects doesn't match expected.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_effects_count<A>(effects: &[Effect<A>], expected: usize) {
        assert_eq!(
            effects.len(),
            expected,
            "Expected {} effects, but found {}",
            expected,
            effects.len()
        );
    }

    /// Assert that effects contain at least one Future effect (at any depth)
    ///
    /// # Panics
    ///
    /// Panics if no Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            any_effect(effects, &|e| matches!(e, Effect::Future(_))),
            "Expected at least one Future effect, but none found"
        );
    }

    /// Assert that no Future effect is present (at any depth)
    ///
    /// # Panics
    ///
    /// Panics if a Future effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_no_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            !any_effect(effects, &|e| matches!(e, Effect::Future(_))),
            "Expected no Future effect, but found one"
        );
    }

    /// Assert that effects schedule a delayed action (at any depth)
    ///
    /// # Panics
    ///
    /// Panics if no Delay effect is found.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_has_delay_effect<A>(effects: &[Effect<A>]) {
        assert!(
            any_effect(effects, &|e| matches!(e, Effect::Delay { .. })),
            "Expected at least one Delay effect, but none found"
        );
    }

    /// Assert that effects cancel `id`
    ///
    /// # Panics
    ///
    /// Panics if no effect cancels `id`.
    #[allow(clippy::panic)] // Test assertion
    pub fn assert_cancels<A>(effects: &[Effect<A>], id: EffectId) {
        assert!(
            effects.iter().any(|e| e.cancels(id)),
            "Expected an Effect::Cancel({id}), but none found"
        );
    }
}

// Re-export commonly used items
pub use mocks::{test_clock, FixedClock};
pub use reducer_test::ReducerTest;
