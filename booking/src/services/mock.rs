//! Scripted in-memory services for tests and offline runs.

use super::{
    BookingCreated, BookingService, BookingStatus, BookingSummary, OrderService, OrderSummary,
    PaymentRedirect, PaymentSummary, ProfileService, SeatInventoryService, ServiceFuture,
    TripCatalog, TripPage,
};
use crate::passenger::ProfileData;
use crate::search::TripSearchQuery;
use crate::types::{BookingId, OrderId, SeatNumber, SeatRecord, TripId};
use bus_booking_backend::BackendError;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A call received by [`MockBackend`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MockCall {
    /// `search_trips`
    SearchTrips {
        /// Query
        query: TripSearchQuery,
        /// Page index
        page: u32,
        /// Page size
        size: u32,
    },
    /// `load_seats`
    LoadSeats {
        /// Trip
        trip_id: TripId,
    },
    /// `create_booking`
    CreateBooking {
        /// Trip
        trip_id: TripId,
        /// Seats as sent
        seats: Vec<SeatNumber>,
    },
    /// `cancel_booking`
    CancelBooking {
        /// Booking
        booking_id: BookingId,
    },
    /// `my_bookings`
    MyBookings {
        /// Page index
        page: u32,
        /// Page size
        size: u32,
    },
    /// `my_orders`
    MyOrders {
        /// Page index
        page: u32,
        /// Page size
        size: u32,
    },
    /// `payments_for`
    PaymentsFor {
        /// Orders asked about
        order_ids: Vec<OrderId>,
    },
    /// `current_profile`
    CurrentProfile,
}

#[derive(Debug)]
struct Script {
    trips: Result<TripPage, BackendError>,
    seats: Result<Vec<SeatRecord>, BackendError>,
    booking: Result<BookingCreated, BackendError>,
    booking_delay: Duration,
    bookings: Result<Vec<BookingSummary>, BackendError>,
    cancel_error: Option<BackendError>,
    orders: Result<Vec<OrderSummary>, BackendError>,
    payments: Result<Vec<PaymentSummary>, BackendError>,
    profile: Result<ProfileData, BackendError>,
    calls: Vec<MockCall>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            trips: Ok(TripPage {
                trips: Vec::new(),
                page: 0,
                total_pages: 0,
                total_elements: 0,
            }),
            seats: Ok(Vec::new()),
            booking: Ok(BookingCreated {
                booking_id: BookingId::new("booking-1"),
                order_id: OrderId::new("order-1"),
                payment_url: Some("https://pay.example/checkout/order-1".to_string()),
                reservation_expires_at: None,
            }),
            booking_delay: Duration::ZERO,
            bookings: Ok(Vec::new()),
            cancel_error: None,
            orders: Ok(Vec::new()),
            payments: Ok(Vec::new()),
            profile: Err(BackendError::Unauthorized { message: None }),
            calls: Vec::new(),
        }
    }
}

/// Backend double implementing every service trait
///
/// Responses are scripted up front; every call is recorded.
#[derive(Clone, Debug, Default)]
pub struct MockBackend {
    script: Arc<Mutex<Script>>,
}

impl MockBackend {
    /// Mock with empty listings and a successful booking
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Serve this trip page
    #[must_use]
    pub fn with_trips(self, page: TripPage) -> Self {
        self.script().trips = Ok(page);
        self
    }

    /// Fail the trip listing
    #[must_use]
    pub fn with_trips_error(self, error: BackendError) -> Self {
        self.script().trips = Err(error);
        self
    }

    /// Serve these seats for any trip
    #[must_use]
    pub fn with_seats(self, seats: Vec<SeatRecord>) -> Self {
        self.script().seats = Ok(seats);
        self
    }

    /// Fail the seat inventory
    #[must_use]
    pub fn with_seats_error(self, error: BackendError) -> Self {
        self.script().seats = Err(error);
        self
    }

    /// Answer booking creation with `created`
    #[must_use]
    pub fn with_booking(self, created: BookingCreated) -> Self {
        self.script().booking = Ok(created);
        self
    }

    /// Fail booking creation
    #[must_use]
    pub fn with_booking_error(self, error: BackendError) -> Self {
        self.script().booking = Err(error);
        self
    }

    /// Hold every booking response for `delay`
    #[must_use]
    pub fn with_booking_delay(self, delay: Duration) -> Self {
        self.script().booking_delay = delay;
        self
    }

    /// Serve this booking history
    #[must_use]
    pub fn with_bookings(self, bookings: Vec<BookingSummary>) -> Self {
        self.script().bookings = Ok(bookings);
        self
    }

    /// Fail the booking history
    #[must_use]
    pub fn with_bookings_error(self, error: BackendError) -> Self {
        self.script().bookings = Err(error);
        self
    }

    /// Fail every cancellation
    #[must_use]
    pub fn with_cancel_error(self, error: BackendError) -> Self {
        self.script().cancel_error = Some(error);
        self
    }

    /// Serve this order history
    #[must_use]
    pub fn with_orders(self, orders: Vec<OrderSummary>) -> Self {
        self.script().orders = Ok(orders);
        self
    }

    /// Fail the order history
    #[must_use]
    pub fn with_orders_error(self, error: BackendError) -> Self {
        self.script().orders = Err(error);
        self
    }

    /// Serve these payments; only those for requested orders are returned
    #[must_use]
    pub fn with_payments(self, payments: Vec<PaymentSummary>) -> Self {
        self.script().payments = Ok(payments);
        self
    }

    /// Fail the payment lookup
    #[must_use]
    pub fn with_payments_error(self, error: BackendError) -> Self {
        self.script().payments = Err(error);
        self
    }

    /// Serve this profile
    #[must_use]
    pub fn with_profile(self, profile: ProfileData) -> Self {
        self.script().profile = Ok(profile);
        self
    }

    /// Calls received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<MockCall> {
        self.script().calls.clone()
    }

    /// Number of booking creation requests received
    #[must_use]
    pub fn create_booking_calls(&self) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|call| matches!(call, MockCall::CreateBooking { .. }))
            .count()
    }

    fn record(&self, call: MockCall) {
        self.script().calls.push(call);
    }
}

impl TripCatalog for MockBackend {
    fn search_trips(&self, query: TripSearchQuery, page: u32, size: u32) -> ServiceFuture<TripPage> {
        self.record(MockCall::SearchTrips { query, page, size });
        let result = self.script().trips.clone().map(|trips| TripPage { page, ..trips });
        Box::pin(async move { result })
    }
}

impl SeatInventoryService for MockBackend {
    fn load_seats(&self, trip_id: TripId) -> ServiceFuture<Vec<SeatRecord>> {
        self.record(MockCall::LoadSeats { trip_id });
        let result = self.script().seats.clone();
        Box::pin(async move { result })
    }
}

impl BookingService for MockBackend {
    fn create_booking(&self, trip_id: TripId, seats: Vec<SeatNumber>) -> ServiceFuture<BookingCreated> {
        self.record(MockCall::CreateBooking { trip_id, seats });
        let (result, delay) = {
            let script = self.script();
            (script.booking.clone(), script.booking_delay)
        };
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }

    fn cancel_booking(&self, booking_id: BookingId) -> ServiceFuture<BookingSummary> {
        self.record(MockCall::CancelBooking {
            booking_id: booking_id.clone(),
        });
        let result = {
            let mut script = self.script();
            match (script.cancel_error.clone(), script.bookings.as_mut()) {
                (Some(error), _) => Err(error),
                (None, Ok(bookings)) => bookings
                    .iter_mut()
                    .find(|booking| booking.id == booking_id)
                    .map(|booking| {
                        booking.status = BookingStatus::Cancelled;
                        booking.clone()
                    })
                    .ok_or(BackendError::ApiError {
                        status: 404,
                        message: Some("Бронирование не найдено".to_string()),
                    }),
                (None, Err(error)) => Err(error.clone()),
            }
        };
        Box::pin(async move { result })
    }

    fn my_bookings(&self, page: u32, size: u32) -> ServiceFuture<Vec<BookingSummary>> {
        self.record(MockCall::MyBookings { page, size });
        let result = self.script().bookings.clone();
        Box::pin(async move { result })
    }
}

impl OrderService for MockBackend {
    fn my_orders(&self, page: u32, size: u32) -> ServiceFuture<Vec<OrderSummary>> {
        self.record(MockCall::MyOrders { page, size });
        let result = self.script().orders.clone();
        Box::pin(async move { result })
    }

    fn payments_for(&self, order_ids: Vec<OrderId>) -> ServiceFuture<Vec<PaymentSummary>> {
        if order_ids.is_empty() {
            return Box::pin(async { Ok(Vec::new()) });
        }
        self.record(MockCall::PaymentsFor {
            order_ids: order_ids.clone(),
        });
        let result = self.script().payments.clone().map(|payments| {
            payments
                .into_iter()
                .filter(|payment| order_ids.contains(&payment.order_id))
                .collect()
        });
        Box::pin(async move { result })
    }
}

impl ProfileService for MockBackend {
    fn current_profile(&self) -> ServiceFuture<ProfileData> {
        self.record(MockCall::CurrentProfile);
        let result = self.script().profile.clone();
        Box::pin(async move { result })
    }
}

/// Redirect target that only remembers where it was sent
#[derive(Clone, Debug, Default)]
pub struct RecordingRedirect {
    urls: Arc<Mutex<Vec<String>>>,
}

impl RecordingRedirect {
    /// Empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirect targets in order
    #[must_use]
    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl PaymentRedirect for RecordingRedirect {
    fn redirect(&self, payment_url: &str) {
        self.urls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(payment_url.to_string());
    }
}
