//! Wire types for the API gateway
//!
//! Field names follow the gateway's camelCase JSON. Fields the client can live
//! without are optional or defaulted so a partial payload still parses.

use serde::{Deserialize, Deserializer, Serialize};

/// One page of a paginated listing
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PageResponse<T> {
    /// Items on this page
    #[serde(default = "Vec::new")]
    pub content: Vec<T>,
    /// Total number of pages
    #[serde(default)]
    pub total_pages: u32,
    /// Total number of items across all pages
    #[serde(default)]
    pub total_elements: u64,
    /// Requested page size
    #[serde(default)]
    pub size: u32,
    /// Zero-based page index
    #[serde(default)]
    pub number: u32,
    /// Whether this is the last page
    #[serde(default)]
    pub last: bool,
}

/// Query parameters for `GET /trips`
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TripsQuery {
    /// Origin city
    pub from_city: String,
    /// Destination city
    pub to_city: String,
    /// Travel date, `YYYY-MM-DD`
    pub date: String,
    /// Zero-based page index
    pub page: u32,
    /// Page size
    pub size: u32,
}

/// Origin and destination of a trip
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RouteSummary {
    /// Origin city name
    #[serde(default)]
    pub from_city: String,
    /// Destination city name
    #[serde(default)]
    pub to_city: String,
}

/// A trip as returned by the listing endpoint
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TripResponse {
    /// Trip id
    pub id: String,
    /// Route the trip runs on
    #[serde(default)]
    pub route: Option<RouteSummary>,
    /// Local departure date-time, e.g. `2026-02-10T08:30:00`
    #[serde(default)]
    pub departure_time: Option<String>,
    /// Local arrival date-time
    #[serde(default)]
    pub arrival_time: Option<String>,
    /// Price per seat in BYN; numbers and numeric strings are accepted
    #[serde(default, deserialize_with = "lenient_amount")]
    pub price: f64,
    /// `BUS` or anything else (treated as a minibus)
    #[serde(default)]
    pub bus_type: Option<String>,
    /// Seat capacity
    #[serde(default)]
    pub total_seats: Option<u32>,
}

/// Raw seat status from the inventory service
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SeatStatus {
    /// Free to book
    Available,
    /// Held by a pending booking
    Reserved,
    /// Paid for
    Sold,
    /// Withdrawn from sale
    Cancelled,
    /// Any status this client does not know
    #[serde(other)]
    Unrecognized,
}

/// A seat of one trip
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SeatResponse {
    /// Inventory record id
    #[serde(default)]
    pub id: String,
    /// Seat number as printed in the vehicle
    pub seat_number: u32,
    /// Raw status
    pub status: SeatStatus,
}

/// Body of `POST /booking`
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    /// Trip to book
    pub trip_id: String,
    /// Number of seats
    pub seats_count: u32,
    /// Seat numbers, ascending
    pub seat_numbers: Vec<u32>,
}

impl CreateBookingRequest {
    /// Build a request for the given seats, sorted ascending
    #[must_use]
    pub fn new(trip_id: impl Into<String>, mut seat_numbers: Vec<u32>) -> Self {
        seat_numbers.sort_unstable();
        seat_numbers.dedup();
        Self {
            trip_id: trip_id.into(),
            seats_count: u32::try_from(seat_numbers.len()).unwrap_or(u32::MAX),
            seat_numbers,
        }
    }
}

/// Booking lifecycle status
///
/// The gateway reports intermediate states (`CREATED`, `SEATS_RESERVED`,
/// `WAITING_PAYMENT`) that the client shows as pending.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Awaiting payment
    #[serde(alias = "CREATED", alias = "SEATS_RESERVED", alias = "WAITING_PAYMENT")]
    Pending,
    /// Paid
    Confirmed,
    /// Cancelled by the user or the system
    Cancelled,
    /// Reservation ran out before payment
    Expired,
}

impl BookingStatus {
    /// Whether the user may still cancel a booking in this status
    #[must_use]
    pub const fn can_cancel(self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed)
    }
}

/// Response of `POST /booking`
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    /// New booking id
    pub booking_id: String,
    /// Order created for payment
    pub order_id: String,
    /// Booked trip
    #[serde(default)]
    pub trip_id: Option<String>,
    /// Number of booked seats
    #[serde(default)]
    pub seats_count: Option<u32>,
    /// Initial status
    #[serde(default)]
    pub status: Option<BookingStatus>,
    /// External payment page; absence means the booking cannot proceed
    #[serde(default)]
    pub payment_url: Option<String>,
    /// When the server releases the seats
    #[serde(default)]
    pub reservation_expires_at: Option<String>,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A booking from the history endpoints
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BookingResponse {
    /// Booking id
    pub id: String,
    /// Owner
    #[serde(default)]
    pub user_id: Option<String>,
    /// Booked trip
    pub trip_id: String,
    /// Number of seats
    #[serde(default)]
    pub seats_count: u32,
    /// Current status
    pub status: BookingStatus,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,
}

/// An order from `GET /orders/me`
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    /// Order id
    pub id: String,
    /// Order total in BYN
    #[serde(default, deserialize_with = "lenient_amount")]
    pub total_price: f64,
    /// Number of seats
    #[serde(default)]
    pub seats_count: u32,
    /// Ordered trip
    #[serde(default)]
    pub trip_id: Option<String>,
    /// Status
    pub status: BookingStatus,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,
}

/// A payment from `GET /payments`
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaymentListItemResponse {
    /// Payment id
    pub id: String,
    /// Order paid for
    pub order_id: String,
    /// Amount
    #[serde(default, deserialize_with = "lenient_amount")]
    pub amount: f64,
    /// ISO currency code
    #[serde(default)]
    pub currency: String,
    /// Payment state
    pub status: PaymentStatus,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,
    /// When the payment succeeded
    #[serde(default)]
    pub paid_at: Option<String>,
}

/// State of a payment
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    /// Started, not yet settled
    Pending,
    /// Money received
    Succeeded,
    /// Declined or errored
    Failed,
    /// Abandoned by the payer
    Cancelled,
    /// Any status this client does not know
    #[serde(other)]
    Unrecognized,
}

/// The signed-in user from `GET /users/me`
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// Given name
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name
    #[serde(default)]
    pub last_name: Option<String>,
    /// Phone number
    #[serde(default)]
    pub phone_number: Option<String>,
    /// Email address
    #[serde(default)]
    pub email: Option<String>,
}

/// Accept a JSON number, a numeric string or null; anything unparsable is zero
fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(number) => number.as_f64().unwrap_or(0.0),
        serde_json::Value::String(text) => text.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_trip_parses_with_string_price_and_missing_fields() {
        let trip: TripResponse = serde_json::from_str(
            r#"{"id":"t1","route":{"fromCity":"Минск","toCity":"Брест"},"price":"25.50"}"#,
        )
        .unwrap();
        assert!((trip.price - 25.5).abs() < f64::EPSILON);
        assert_eq!(trip.total_seats, None);
        assert_eq!(trip.route.unwrap().to_city, "Брест");
    }

    #[test]
    fn test_unknown_seat_status_is_unrecognized() {
        let seat: SeatResponse =
            serde_json::from_str(r#"{"id":"s","seatNumber":4,"status":"BROKEN"}"#).unwrap();
        assert_eq!(seat.status, SeatStatus::Unrecognized);
    }

    #[test]
    fn test_intermediate_booking_statuses_read_as_pending() {
        for raw in ["\"CREATED\"", "\"SEATS_RESERVED\"", "\"WAITING_PAYMENT\"", "\"PENDING\""] {
            let status: BookingStatus = serde_json::from_str(raw).unwrap();
            assert_eq!(status, BookingStatus::Pending);
        }
        assert!(!BookingStatus::Expired.can_cancel());
        assert!(BookingStatus::Confirmed.can_cancel());
    }

    #[test]
    fn test_create_booking_request_sorts_seats() {
        let request = CreateBookingRequest::new("trip-1", vec![8, 3, 5]);
        assert_eq!(request.seat_numbers, vec![3, 5, 8]);
        assert_eq!(request.seats_count, 3);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({"tripId":"trip-1","seatsCount":3,"seatNumbers":[3,5,8]})
        );
    }
}
