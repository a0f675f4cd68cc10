//! Actions of the booking flow: passenger intents and backend results.

use crate::handoff::PendingBookingHandoff;
use crate::passenger::{PassengerForm, ProfileData};
use crate::routes::FlowRoute;
use crate::search::ListingFilters;
use crate::services::{BookingCreated, TripPage};
use crate::types::{BookingId, SeatNumber, SeatRecord, TripId};
use bus_booking_backend::BackendError;

/// Everything that can happen to the booking flow
#[derive(Clone, Debug)]
pub enum FlowAction {
    // ========================================================================
    // Passenger intents
    // ========================================================================
    /// Search form submitted
    SubmitSearch {
        /// Origin city as typed
        origin: String,
        /// Destination city as typed
        destination: String,
        /// Travel date as typed (`YYYY-MM-DD`)
        date: String,
    },

    /// Another listing page requested; filters are kept
    ChangePage {
        /// Zero-based page index
        page: u32,
    },

    /// Listing filters or sort changed (client-side only)
    UpdateFilters {
        /// New filters
        filters: ListingFilters,
    },

    /// Reload the listing after a failure
    RetryListing,

    /// Trip chosen from the listing
    SelectTrip {
        /// Trip id
        trip_id: TripId,
    },

    /// Reload the seat map after a failure
    RetrySeats,

    /// Seat clicked on the seat map
    ToggleSeat {
        /// Seat number
        seat: SeatNumber,
    },

    /// Continue from the seat map to the passenger form
    ConfirmSeats,

    /// Book straight from the seat map, skipping the passenger form
    BookNow,

    /// Expiry notice dismissed
    AcknowledgeExpiry,

    /// Passenger form edited
    UpdatePassengerForm {
        /// Whole draft
        form: PassengerForm,
    },

    /// Passenger form submitted
    SubmitPassenger,

    /// Back button
    Back,

    /// Direct navigation, including the payment page's callbacks
    Navigate {
        /// Target
        route: FlowRoute,
    },

    /// Abandon the flow and start over
    Restart,

    // ========================================================================
    // Results
    // ========================================================================
    /// Listing response
    ListingLoaded {
        /// Request generation
        request: u64,
        /// Page or failure
        result: Result<TripPage, BackendError>,
    },

    /// Seat inventory response
    SeatsLoaded {
        /// Request generation
        request: u64,
        /// Trip the seats belong to
        trip_id: TripId,
        /// Seats or failure
        result: Result<Vec<SeatRecord>, BackendError>,
    },

    /// Profile response for pre-filling the passenger form
    ProfileLoaded {
        /// Request generation
        request: u64,
        /// Profile or failure
        result: Result<ProfileData, BackendError>,
    },

    /// Booking creation response
    BookingCompleted {
        /// Request generation
        request: u64,
        /// Created booking or failure
        result: Result<BookingCreated, BackendError>,
    },

    /// Handoff written (or not) and the payment page opened
    RedirectedToPayment {
        /// Payment page
        payment_url: String,
        /// Record that was written before leaving
        handoff: PendingBookingHandoff,
    },

    /// Handoff record consumed on the success callback
    HandoffRecovered {
        /// Booking id from the record, when one was readable
        booking_id: Option<BookingId>,
    },

    /// Reservation countdown tick
    TimerTicked {
        /// Timer generation the tick was scheduled for
        generation: u64,
    },
}
