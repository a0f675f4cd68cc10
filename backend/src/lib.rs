//! # Bus Booking Backend Client
//!
//! Rust client for the bus booking API gateway: trip listing, seat
//! inventory, bookings, orders, payments and the current user profile.
//!
//! ## Example
//!
//! ```no_run
//! use bus_booking_backend::{BackendClient, TripsQuery};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = BackendClient::new("http://localhost:8080")
//!         .with_access_token("token");
//!
//!     let page = client
//!         .get_trips(&TripsQuery {
//!             from_city: "Минск".to_string(),
//!             to_city: "Брест".to_string(),
//!             date: "2026-02-10".to_string(),
//!             page: 0,
//!             size: 10,
//!         })
//!         .await?;
//!
//!     println!("{} trips", page.total_elements);
//!     Ok(())
//! }
//! ```
//!
//! Listing and inventory endpoints are public and are always called without
//! a bearer token. Everything else carries the token when one is configured.

pub mod client;
pub mod error;
pub mod types;

// Re-export main types for convenience
pub use client::BackendClient;
pub use error::BackendError;
pub use types::{
    BookingResponse, BookingStatus, CreateBookingRequest, CreateBookingResponse, OrderResponse,
    PageResponse, PaymentListItemResponse, PaymentStatus, RouteSummary, SeatResponse, SeatStatus,
    TripResponse, TripsQuery, UserResponse,
};
