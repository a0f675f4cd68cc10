//! Domain types for the booking flow.
//!
//! Identifiers, money, vehicles, trips and seat records. Everything here is a
//! plain value; the backend adapter converts wire types into these.

use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a backend identifier
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// The identifier as sent by the backend
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifier of a scheduled trip
    TripId
);
string_id!(
    /// Identifier of a booking
    BookingId
);
string_id!(
    /// Identifier of the order a booking is paid through
    OrderId
);

/// Seat number as printed in the vehicle (1-based)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeatNumber(u32);

impl SeatNumber {
    /// Create a seat number
    #[must_use]
    pub const fn new(number: u32) -> Self {
        Self(number)
    }

    /// The raw number
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SeatNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Money
// ============================================================================

/// Amount in BYN, stored as kopecks
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(i64);

impl Money {
    /// Zero BYN
    pub const ZERO: Self = Self(0);

    /// Create from kopecks
    #[must_use]
    pub const fn from_kopecks(kopecks: i64) -> Self {
        Self(kopecks)
    }

    /// Create from a decimal BYN amount, rounded to the nearest kopeck
    ///
    /// Non-finite amounts become zero.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)] // Rounded and range-checked
    pub fn from_byn(amount: f64) -> Self {
        let kopecks = (amount * 100.0).round();
        if kopecks.is_finite() && kopecks.abs() < 9.0e15 {
            Self(kopecks as i64)
        } else {
            Self::ZERO
        }
    }

    /// Amount in kopecks
    #[must_use]
    pub const fn kopecks(self) -> i64 {
        self.0
    }

    /// This amount multiplied by a count (saturating)
    #[must_use]
    pub fn times(self, count: usize) -> Self {
        let count = i64::try_from(count).unwrap_or(i64::MAX);
        Self(self.0.saturating_mul(count))
    }

    /// `12.50 USD` style text in another currency
    #[must_use]
    pub fn display_in(self, currency: &str) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        format!("{sign}{}.{:02} {currency}", abs / 100, abs % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_in("BYN"))
    }
}

// ============================================================================
// Vehicles and trips
// ============================================================================

/// Vehicle serving a trip; decides the seat layout
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VehicleType {
    /// Full-size bus: driver area covers seats 1 and 2
    Bus,
    /// Minibus: driver area covers seat 1
    Minibus,
}

impl VehicleType {
    /// Map the backend `busType`: `BUS` is a bus, anything else a minibus
    #[must_use]
    pub fn from_bus_type(bus_type: Option<&str>) -> Self {
        match bus_type {
            Some("BUS") => Self::Bus,
            _ => Self::Minibus,
        }
    }

    /// Seat numbers reserved for the driver area
    #[must_use]
    pub const fn driver_area(self) -> &'static [u32] {
        match self {
            Self::Bus => &[1, 2],
            Self::Minibus => &[1],
        }
    }
}

/// A scheduled trip as shown in the listing
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trip {
    /// Trip id
    pub id: TripId,
    /// Origin city
    pub origin: String,
    /// Destination city
    pub destination: String,
    /// Departure date, when the backend reported one
    pub departure_date: Option<NaiveDate>,
    /// Departure clock time
    pub departure_time: NaiveTime,
    /// Arrival date, when the backend reported one
    pub arrival_date: Option<NaiveDate>,
    /// Arrival clock time
    pub arrival_time: NaiveTime,
    /// Price of one seat
    pub price_per_seat: Money,
    /// Vehicle type
    pub vehicle_type: VehicleType,
    /// Seats offered (mirrors the capacity reported by the listing)
    pub available_seat_count: u32,
    /// Seat capacity
    pub total_seat_count: u32,
}

impl Trip {
    /// Travel time in minutes
    ///
    /// Uses the full timestamps when both dates are known. Otherwise only the
    /// clock times count and an arrival before departure means the next day.
    #[must_use]
    pub fn duration_minutes(&self) -> u32 {
        if let (Some(departure_date), Some(arrival_date)) = (self.departure_date, self.arrival_date) {
            let minutes = (arrival_date.and_time(self.arrival_time)
                - departure_date.and_time(self.departure_time))
            .num_minutes();
            if let Ok(minutes) = u32::try_from(minutes) {
                return minutes;
            }
        }

        let departure = self.departure_time.hour() * 60 + self.departure_time.minute();
        let arrival = self.arrival_time.hour() * 60 + self.arrival_time.minute();
        if arrival >= departure {
            arrival - departure
        } else {
            arrival + 24 * 60 - departure
        }
    }

    /// Travel time as shown to passengers, e.g. `3ч 45м` or `4ч`
    #[must_use]
    pub fn duration_display(&self) -> String {
        let minutes = self.duration_minutes();
        let (hours, minutes) = (minutes / 60, minutes % 60);
        if minutes == 0 {
            format!("{hours}ч")
        } else {
            format!("{hours}ч {minutes}м")
        }
    }
}

// ============================================================================
// Seats
// ============================================================================

/// Seat status as reported by the inventory service
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RawSeatStatus {
    /// Free to book
    Available,
    /// Held by someone's pending booking
    Reserved,
    /// Paid for
    Sold,
    /// Withdrawn from sale
    Cancelled,
    /// A status this client does not know; treated as available
    Unrecognized,
}

/// One seat of a trip with its backend status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SeatRecord {
    /// Seat number
    pub seat_number: SeatNumber,
    /// Backend status
    pub raw_status: RawSeatStatus,
}

impl SeatRecord {
    /// Create a seat record
    #[must_use]
    pub const fn new(seat_number: u32, raw_status: RawSeatStatus) -> Self {
        Self {
            seat_number: SeatNumber::new(seat_number),
            raw_status,
        }
    }
}

/// Seat status as displayed on the seat map
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DisplayStatus {
    /// Can be selected
    Available,
    /// Taken by another passenger
    Occupied,
    /// Never sellable (driver area, withdrawn)
    Blocked,
    /// In the current selection
    Selected,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trip(departure: (u32, u32), arrival: (u32, u32)) -> Trip {
        Trip {
            id: TripId::new("t"),
            origin: "Минск".to_string(),
            destination: "Брест".to_string(),
            departure_date: None,
            departure_time: NaiveTime::from_hms_opt(departure.0, departure.1, 0).unwrap_or_default(),
            arrival_date: None,
            arrival_time: NaiveTime::from_hms_opt(arrival.0, arrival.1, 0).unwrap_or_default(),
            price_per_seat: Money::from_byn(25.5),
            vehicle_type: VehicleType::Bus,
            available_seat_count: 20,
            total_seat_count: 20,
        }
    }

    #[test]
    fn test_duration_display_omits_zero_minutes() {
        assert_eq!(trip((8, 0), (12, 0)).duration_display(), "4ч");
        assert_eq!(trip((8, 30), (12, 15)).duration_display(), "3ч 45м");
    }

    #[test]
    fn test_duration_wraps_to_next_day() {
        let overnight = trip((22, 30), (6, 0));
        assert_eq!(overnight.duration_minutes(), 450);
        assert_eq!(overnight.duration_display(), "7ч 30м");
    }

    #[test]
    fn test_duration_uses_dates_for_long_trips() {
        let mut trip = trip((20, 0), (22, 30));
        trip.departure_date = NaiveDate::from_ymd_opt(2026, 2, 10);
        trip.arrival_date = NaiveDate::from_ymd_opt(2026, 2, 11);
        assert_eq!(trip.duration_minutes(), 26 * 60 + 30);
        assert_eq!(trip.duration_display(), "26ч 30м");

        // Arrival dated before departure: fall back to clock times
        trip.arrival_date = NaiveDate::from_ymd_opt(2026, 2, 9);
        assert_eq!(trip.duration_minutes(), 150);
    }

    #[test]
    fn test_money_display_and_rounding() {
        assert_eq!(Money::from_byn(25.5).to_string(), "25.50 BYN");
        assert_eq!(Money::from_byn(0.1 + 0.2).kopecks(), 30);
        assert_eq!(Money::from_byn(f64::NAN), Money::ZERO);
        assert_eq!(Money::from_kopecks(2550).times(3).to_string(), "76.50 BYN");
    }

    #[test]
    fn test_vehicle_type_mapping() {
        assert_eq!(VehicleType::from_bus_type(Some("BUS")), VehicleType::Bus);
        assert_eq!(VehicleType::from_bus_type(Some("MINIBUS")), VehicleType::Minibus);
        assert_eq!(VehicleType::from_bus_type(None), VehicleType::Minibus);
    }
}
