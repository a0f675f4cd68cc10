//! The booking flow controller.
//!
//! One state value, one reducer. The passenger moves through
//!
//! ```text
//! SEARCH → LISTING → SEAT_SELECTION → PASSENGER_DETAILS → PAYMENT_HANDOFF
//!                          ↑                   │                 │
//!                          └─ countdown expired┘                 ↓
//!                                                      external payment page
//!                                                       │                │
//!                                               /payment/success   /payment/cancel
//!                                                       ↓                ↓
//!                                                 CONFIRMATION   PAYMENT_CANCELLED
//! ```
//!
//! Backend calls, the reservation countdown, the handoff record and the
//! payment redirect are effects executed by the store. Responses come back as
//! actions tagged with the request generation they answer; anything older
//! than the current visit of a step is dropped.

pub mod actions;
pub mod environment;
pub mod reducer;
pub mod types;

pub use actions::FlowAction;
pub use environment::{FlowEnvironment, FlowSettings};
pub use reducer::{FlowReducer, RESERVATION_TIMER};
pub use types::{
    BookingAttempt, BookingFlowState, ConfirmationView, ExpiryNotice, FlowStep, ListingState,
    Loadable, PassengerStepState, SeatStepState,
};

use bus_booking_runtime::Store;

/// Store running the booking flow
pub type FlowStore = Store<BookingFlowState, FlowAction, FlowEnvironment, FlowReducer>;

/// Start a flow at the search step
#[must_use]
pub fn flow_store(env: FlowEnvironment) -> FlowStore {
    Store::new(BookingFlowState::new(), FlowReducer::new(), env)
}
