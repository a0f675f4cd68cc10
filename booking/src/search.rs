//! Trip search: the query key, client-side listing filters and pagination.
//!
//! Filters and sorting run over the page already loaded; they never trigger a
//! fetch. Changing the page is the only listing operation that goes to the
//! backend.

use crate::types::{Money, Trip, VehicleType};
use chrono::{NaiveDate, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use thiserror::Error;

/// Validation failures of a search form
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SearchValidationError {
    /// Origin left blank
    #[error("origin city is required")]
    MissingOrigin,
    /// Destination left blank
    #[error("destination city is required")]
    MissingDestination,
    /// Date left blank
    #[error("travel date is required")]
    MissingDate,
    /// Date is not `YYYY-MM-DD`
    #[error("travel date must be YYYY-MM-DD, got {0:?}")]
    InvalidDate(String),
}

/// A submitted search: origin, destination and travel date
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TripSearchQuery {
    origin_city: String,
    destination_city: String,
    travel_date: NaiveDate,
}

impl TripSearchQuery {
    /// Build a query from raw form input
    ///
    /// Fields are trimmed. Fields are checked in form order and the first
    /// failure is reported.
    ///
    /// # Errors
    ///
    /// Returns a [`SearchValidationError`] for a blank field or a malformed date.
    pub fn new(origin: &str, destination: &str, date: &str) -> Result<Self, SearchValidationError> {
        let origin = origin.trim();
        let destination = destination.trim();
        let date = date.trim();

        if origin.is_empty() {
            return Err(SearchValidationError::MissingOrigin);
        }
        if destination.is_empty() {
            return Err(SearchValidationError::MissingDestination);
        }
        if date.is_empty() {
            return Err(SearchValidationError::MissingDate);
        }

        let travel_date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|_| SearchValidationError::InvalidDate(date.to_string()))?;

        Ok(Self {
            origin_city: origin.to_string(),
            destination_city: destination.to_string(),
            travel_date,
        })
    }

    /// Origin city
    #[must_use]
    pub fn origin_city(&self) -> &str {
        &self.origin_city
    }

    /// Destination city
    #[must_use]
    pub fn destination_city(&self) -> &str {
        &self.destination_city
    }

    /// Travel date
    #[must_use]
    pub const fn travel_date(&self) -> NaiveDate {
        self.travel_date
    }
}

/// Listing sort order
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOption {
    /// Cheapest first
    PriceAsc,
    /// Most expensive first
    PriceDesc,
    /// Earliest departure first
    #[default]
    TimeAsc,
    /// Latest departure first
    TimeDesc,
    /// Shortest trip first
    Duration,
}

/// Departure time-of-day bucket
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TimeOfDay {
    /// 06:00 to 12:00
    Morning,
    /// 12:00 to 18:00
    Afternoon,
    /// 18:00 to 22:00
    Evening,
    /// 22:00 to 06:00
    Night,
}

impl TimeOfDay {
    /// Bucket of a departure time (by hour)
    #[must_use]
    pub fn of(time: NaiveTime) -> Self {
        match time.hour() {
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            18..=21 => Self::Evening,
            _ => Self::Night,
        }
    }
}

/// Inclusive price bounds per seat
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PriceRange {
    /// Lowest accepted price
    pub min: Money,
    /// Highest accepted price
    pub max: Money,
}

impl PriceRange {
    /// Whether `price` lies within the bounds
    #[must_use]
    pub fn contains(&self, price: Money) -> bool {
        self.min <= price && price <= self.max
    }
}

/// Client-side listing filters
///
/// Empty vehicle or time-of-day sets accept everything.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFilters {
    /// Sort order
    pub sort: SortOption,
    /// Price bounds; `None` accepts any price
    pub price_range: Option<PriceRange>,
    /// Accepted vehicle types
    pub vehicle_types: BTreeSet<VehicleType>,
    /// Accepted departure buckets
    pub times_of_day: BTreeSet<TimeOfDay>,
}

impl ListingFilters {
    /// Whether a trip passes every filter
    #[must_use]
    pub fn accepts(&self, trip: &Trip) -> bool {
        let price_ok = self
            .price_range
            .is_none_or(|range| range.contains(trip.price_per_seat));
        let vehicle_ok = self.vehicle_types.is_empty()
            || self.vehicle_types.contains(&trip.vehicle_type);
        let time_ok = self.times_of_day.is_empty()
            || self.times_of_day.contains(&TimeOfDay::of(trip.departure_time));

        price_ok && vehicle_ok && time_ok
    }

    /// Filter and sort a loaded page
    ///
    /// The sort is stable: trips with equal keys keep their fetch order.
    #[must_use]
    pub fn apply(&self, trips: &[Trip]) -> Vec<Trip> {
        let mut visible: Vec<Trip> = trips.iter().filter(|trip| self.accepts(trip)).cloned().collect();

        match self.sort {
            SortOption::PriceAsc => visible.sort_by_key(|trip| trip.price_per_seat),
            SortOption::PriceDesc => {
                visible.sort_by(|a, b| b.price_per_seat.cmp(&a.price_per_seat));
            },
            SortOption::TimeAsc => visible.sort_by_key(|trip| trip.departure_time),
            SortOption::TimeDesc => visible.sort_by(|a, b| b.departure_time.cmp(&a.departure_time)),
            SortOption::Duration => visible.sort_by_key(Trip::duration_minutes),
        }

        visible
    }
}

/// One entry of the pagination control
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PageLink {
    /// A zero-based page index
    Page(u32),
    /// A gap of skipped pages
    Ellipsis,
}

/// Pagination entries for `current` (zero-based) out of `total` pages
///
/// Up to five pages are all listed. Beyond that the first and last pages
/// stay visible, with the neighbourhood of the current page between
/// ellipses. A single page needs no control.
#[must_use]
pub fn page_window(current: u32, total: u32) -> Vec<PageLink> {
    const MAX_VISIBLE: u32 = 5;

    if total <= 1 {
        return Vec::new();
    }
    if total <= MAX_VISIBLE {
        return (0..total).map(PageLink::Page).collect();
    }

    let last = total - 1;
    let mut links = Vec::with_capacity(7);

    if current < 3 {
        links.extend((0..4).map(PageLink::Page));
        links.push(PageLink::Ellipsis);
        links.push(PageLink::Page(last));
    } else if current + 4 > total {
        links.push(PageLink::Page(0));
        links.push(PageLink::Ellipsis);
        links.extend((total - 4..total).map(PageLink::Page));
    } else {
        links.push(PageLink::Page(0));
        links.push(PageLink::Ellipsis);
        links.extend((current - 1..=current + 1).map(PageLink::Page));
        links.push(PageLink::Ellipsis);
        links.push(PageLink::Page(last));
    }

    links
}
