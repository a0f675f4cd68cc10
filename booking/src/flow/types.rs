//! State of the booking flow.

use crate::messages::UserMessage;
use crate::passenger::{PassengerDetails, PassengerErrors, PassengerForm};
use crate::search::{page_window, ListingFilters, PageLink, TripSearchQuery};
use crate::seats::SeatInventory;
use crate::selection::SelectionSet;
use crate::timer::ReservationTimer;
use crate::types::{BookingId, DisplayStatus, Money, OrderId, SeatNumber, Trip};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Position of the passenger in the flow
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowStep {
    /// Search form
    #[default]
    Search,
    /// Trip listing for the last query
    Listing,
    /// Seat map of the selected trip
    SeatSelection,
    /// Contact form, reservation countdown running
    PassengerDetails,
    /// Booking being created or the payment page opened
    PaymentHandoff,
    /// Booking confirmed (in-flow or returned from payment)
    Confirmation,
    /// Returned from the payment page without paying
    PaymentCancelled,
}

/// A remote resource as seen by one screen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Loadable<T> {
    /// Nothing requested yet
    #[default]
    Idle,
    /// Request in flight
    Loading,
    /// Response received
    Loaded(T),
    /// Request failed; the screen offers a retry
    Failed(UserMessage),
}

impl<T> Loadable<T> {
    /// The loaded value
    #[must_use]
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    /// Whether a request is in flight
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// Whether the last request failed
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Trip listing screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ListingState {
    /// Query the listing belongs to
    pub query: TripSearchQuery,
    /// Zero-based page index
    pub page: u32,
    /// Total pages reported by the last response
    pub total_pages: u32,
    /// Total trips reported by the last response
    pub total_elements: u64,
    /// Trips of the current page in fetch order
    pub trips: Loadable<Vec<Trip>>,
    /// Client-side filters, kept across page changes
    pub filters: ListingFilters,
    pub(crate) request: u64,
}

impl ListingState {
    /// Trips of the current page after filters and sorting
    #[must_use]
    pub fn visible_trips(&self) -> Vec<Trip> {
        self.trips
            .loaded()
            .map(|trips| self.filters.apply(trips))
            .unwrap_or_default()
    }

    /// Pagination control
    #[must_use]
    pub fn page_links(&self) -> Vec<PageLink> {
        page_window(self.page, self.total_pages)
    }

    /// A trip of the loaded page
    #[must_use]
    pub fn trip(&self, trip_id: &crate::types::TripId) -> Option<&Trip> {
        self.trips.loaded()?.iter().find(|trip| &trip.id == trip_id)
    }
}

/// Seat map screen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SeatStepState {
    /// Seats of the selected trip
    pub inventory: Loadable<SeatInventory>,
    /// Inline error (empty selection, failed quick booking)
    pub error: Option<UserMessage>,
    pub(crate) request: u64,
}

/// Passenger details screen
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassengerStepState {
    /// Form draft
    pub form: PassengerForm,
    /// Field errors from the last submit
    pub errors: PassengerErrors,
    /// Failure of the last booking attempt
    pub submit_error: Option<UserMessage>,
    /// Profile prefill in flight
    pub prefill_pending: bool,
    pub(crate) request: u64,
}

/// A booking request in flight
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BookingAttempt {
    /// Step the request was sent from; failures return here
    pub origin: FlowStep,
    /// The countdown ran out while waiting for the response
    pub expired_in_flight: bool,
    pub(crate) request: u64,
}

/// What the confirmation screen shows
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConfirmationView {
    /// Booking id, when known
    pub booking_id: Option<BookingId>,
    /// Order id, when known
    pub order_id: Option<OrderId>,
}

/// Notice shown after the reservation countdown ran out
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpiryNotice {
    /// When the countdown ran out
    pub expired_at: DateTime<Utc>,
    /// Text to show
    pub message: UserMessage,
}

/// Everything the booking flow knows
///
/// Only [`super::FlowReducer`] changes this value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BookingFlowState {
    /// Current step
    pub step: FlowStep,
    /// Last valid search
    pub last_search_query: Option<TripSearchQuery>,
    /// Search form error
    pub search_error: Option<UserMessage>,
    /// Listing of the last search
    pub listing: Option<ListingState>,
    /// Trip being booked
    pub selected_trip: Option<Trip>,
    /// Seats chosen for the selected trip
    pub selection: SelectionSet,
    /// Validated passenger data
    pub passenger_details: Option<PassengerDetails>,
    /// Booking created by the backend
    pub booking_id: Option<BookingId>,
    /// Order of the created booking
    pub order_id: Option<OrderId>,
    /// Payment page the passenger was sent to
    pub payment_url: Option<String>,
    /// Seat map screen
    pub seat_step: SeatStepState,
    /// Passenger details screen
    pub passenger_step: PassengerStepState,
    /// Reservation countdown
    pub timer: ReservationTimer,
    /// Booking request in flight
    pub booking: Option<BookingAttempt>,
    /// Unacknowledged expiry; seat toggles wait for acknowledgement
    pub expiry_notice: Option<ExpiryNotice>,
    /// Confirmation screen
    pub confirmation: Option<ConfirmationView>,
    /// Order left unpaid on the payment page
    pub cancelled_order_id: Option<OrderId>,
    next_request: u64,
}

impl BookingFlowState {
    /// Fresh flow at the search step
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Next request generation; responses carrying an older one are stale
    pub(crate) fn next_request(&mut self) -> u64 {
        self.next_request += 1;
        self.next_request
    }

    /// Back to a fresh search step
    ///
    /// Request generations and the timer generation keep counting so late
    /// responses and ticks stay recognisably stale.
    pub(crate) fn reset(&mut self) {
        let next_request = self.next_request;
        let mut timer = std::mem::take(&mut self.timer);
        timer.stop();
        *self = Self {
            timer,
            next_request,
            ..Self::default()
        };
    }

    /// Whether a booking request is in flight
    #[must_use]
    pub const fn is_booking_in_flight(&self) -> bool {
        self.booking.is_some()
    }

    /// Price of the current selection
    #[must_use]
    pub fn total_price(&self) -> Money {
        self.selected_trip
            .as_ref()
            .map_or(Money::ZERO, |trip| self.selection.total_price(trip.price_per_seat))
    }

    /// Selected seats, ascending
    #[must_use]
    pub fn selected_seats(&self) -> Vec<SeatNumber> {
        self.selection.seat_numbers()
    }

    /// Seat map under the current selection
    #[must_use]
    pub fn seat_map(&self) -> Vec<(SeatNumber, DisplayStatus)> {
        self.seat_step
            .inventory
            .loaded()
            .map(|inventory| inventory.display(&self.selection))
            .unwrap_or_default()
    }
}
