//! Bus ticket booking flow.
//!
//! A passenger searches trips between two cities, picks seats on a seat map,
//! enters contact data while a reservation countdown runs, and is handed off
//! to an external payment page. The return from that page resolves to a
//! confirmation or a cancellation screen.
//!
//! # Architecture
//!
//! ```text
//!   FlowAction ──► FlowReducer ──► BookingFlowState
//!                      │
//!                      ▼ effects
//!   ┌──────────────┬───────────────┬──────────────┬───────────────┐
//!   │ TripCatalog  │ SeatInventory │ BookingSvc   │ HandoffStore  │
//!   └──────────────┴───────────────┴──────────────┴───────────────┘
//!                      │
//!                      ▼
//!               API gateway (HTTP)
//! ```
//!
//! Pure rules live in their own modules ([`search`], [`seats`],
//! [`selection`], [`timer`], [`passenger`]) and are composed by the
//! [`flow`] reducer. [`account`] is the booking history screen.

pub mod account;
pub mod config;
pub mod flow;
pub mod handoff;
pub mod messages;
pub mod passenger;
pub mod routes;
pub mod search;
pub mod seats;
pub mod selection;
pub mod services;
pub mod timer;
pub mod types;

pub use config::Config;
pub use flow::{flow_store, BookingFlowState, FlowAction, FlowEnvironment, FlowReducer, FlowStep, FlowStore};
pub use messages::UserMessage;
