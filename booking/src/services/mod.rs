//! Collaborator interfaces used by the flow and account reducers.
//!
//! Every backend operation returns a boxed `'static` future so reducers can
//! move a cloned `Arc<dyn ..>` into an `Effect::Future`.

use crate::passenger::ProfileData;
use crate::search::TripSearchQuery;
use crate::types::{BookingId, Money, OrderId, SeatNumber, SeatRecord, Trip, TripId};
use bus_booking_backend::BackendError;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

pub mod http;
pub mod mock;

pub use bus_booking_backend::{BookingStatus, PaymentStatus};

/// Future returned by backend services
pub type ServiceFuture<T> = BoxFuture<'static, Result<T, BackendError>>;

/// One page of trips for a query
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TripPage {
    /// Trips in fetch order
    pub trips: Vec<Trip>,
    /// Zero-based page index
    pub page: u32,
    /// Total number of pages
    pub total_pages: u32,
    /// Total number of trips across pages
    pub total_elements: u64,
}

/// Result of creating a booking
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingCreated {
    /// New booking
    pub booking_id: BookingId,
    /// Order to pay
    pub order_id: OrderId,
    /// External payment page, when the backend issued one
    pub payment_url: Option<String>,
    /// When the server releases the seats
    pub reservation_expires_at: Option<String>,
}

/// A booking in the passenger's history
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingSummary {
    /// Booking id
    pub id: BookingId,
    /// Booked trip
    pub trip_id: TripId,
    /// Number of seats
    pub seats_count: u32,
    /// Current status
    pub status: BookingStatus,
    /// Creation timestamp as sent by the backend
    pub created_at: Option<String>,
}

/// An order in the passenger's history
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderSummary {
    /// Order id
    pub id: OrderId,
    /// Order total
    pub total_price: Money,
    /// Number of seats
    pub seats_count: u32,
    /// Ordered trip, when the backend sent it
    pub trip_id: Option<TripId>,
    /// Order status
    pub status: BookingStatus,
    /// Creation timestamp as sent by the backend
    pub created_at: Option<String>,
}

/// A payment made for an order
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PaymentSummary {
    /// Order paid for
    pub order_id: OrderId,
    /// Amount charged
    pub amount: Money,
    /// Upper-case currency code
    pub currency: String,
    /// Payment state
    pub status: PaymentStatus,
    /// When the payment succeeded
    pub paid_at: Option<String>,
}

/// Trip listing
pub trait TripCatalog: Send + Sync {
    /// Fetch one page of trips matching the query
    fn search_trips(&self, query: TripSearchQuery, page: u32, size: u32) -> ServiceFuture<TripPage>;
}

/// Seat inventory
pub trait SeatInventoryService: Send + Sync {
    /// Fetch the seats of a trip
    fn load_seats(&self, trip_id: TripId) -> ServiceFuture<Vec<SeatRecord>>;
}

/// Booking lifecycle
pub trait BookingService: Send + Sync {
    /// Create a booking for the seats (sent once, never retried)
    fn create_booking(&self, trip_id: TripId, seats: Vec<SeatNumber>) -> ServiceFuture<BookingCreated>;

    /// Cancel a booking
    fn cancel_booking(&self, booking_id: BookingId) -> ServiceFuture<BookingSummary>;

    /// Bookings of the signed-in passenger
    fn my_bookings(&self, page: u32, size: u32) -> ServiceFuture<Vec<BookingSummary>>;
}

/// Orders and their payments
pub trait OrderService: Send + Sync {
    /// Orders of the signed-in passenger
    fn my_orders(&self, page: u32, size: u32) -> ServiceFuture<Vec<OrderSummary>>;

    /// Payments for the given orders; an empty list makes no request
    fn payments_for(&self, order_ids: Vec<OrderId>) -> ServiceFuture<Vec<PaymentSummary>>;
}

/// Signed-in user's profile
pub trait ProfileService: Send + Sync {
    /// Fetch the current user's profile
    fn current_profile(&self) -> ServiceFuture<ProfileData>;
}

/// What the identity provider currently knows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AuthState {
    /// Bearer token, when signed in
    pub access_token: Option<String>,
    /// Profile claims from the identity provider
    pub profile: Option<ProfileData>,
}

impl AuthState {
    /// Whether a token is present
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.access_token.as_deref().is_some_and(|token| !token.trim().is_empty())
    }
}

/// Identity provider (token acquisition happens elsewhere)
pub trait IdentityProvider: Send + Sync {
    /// Current authentication state
    fn auth_state(&self) -> AuthState;
}

/// Identity provider with a fixed state
#[derive(Clone, Debug, Default)]
pub struct StaticIdentity {
    state: AuthState,
}

impl StaticIdentity {
    /// Signed out
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Signed in with `token` and optional profile claims
    #[must_use]
    pub fn signed_in(token: impl Into<String>, profile: Option<ProfileData>) -> Self {
        Self {
            state: AuthState {
                access_token: Some(token.into()),
                profile,
            },
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn auth_state(&self) -> AuthState {
        self.state.clone()
    }
}

/// Hands control to the external payment page
pub trait PaymentRedirect: Send + Sync {
    /// Leave for `payment_url`
    fn redirect(&self, payment_url: &str);
}
