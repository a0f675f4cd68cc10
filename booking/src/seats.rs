//! Seat inventory view and display-status derivation.
//!
//! Display status is never stored: it is recomputed from the backend record,
//! the vehicle layout and the current selection every time it is needed.

use crate::selection::SelectionSet;
use crate::types::{DisplayStatus, RawSeatStatus, SeatNumber, SeatRecord, TripId, VehicleType};
use serde::{Deserialize, Serialize};

/// Whether `seat` belongs to the driver area of `vehicle`
#[must_use]
pub fn is_driver_area(seat: SeatNumber, vehicle: VehicleType) -> bool {
    vehicle.driver_area().contains(&seat.get())
}

/// Status of a seat before the selection overlay is applied
#[must_use]
pub fn base_status(record: &SeatRecord, vehicle: VehicleType) -> DisplayStatus {
    if is_driver_area(record.seat_number, vehicle) {
        return DisplayStatus::Blocked;
    }
    match record.raw_status {
        RawSeatStatus::Reserved | RawSeatStatus::Sold => DisplayStatus::Occupied,
        RawSeatStatus::Cancelled => DisplayStatus::Blocked,
        RawSeatStatus::Available | RawSeatStatus::Unrecognized => DisplayStatus::Available,
    }
}

/// Status of a seat as shown on the seat map
///
/// A selected seat shows as `Selected` only while its base status is
/// `Available`.
#[must_use]
pub fn derive_display_status(
    record: &SeatRecord,
    selection: &SelectionSet,
    vehicle: VehicleType,
) -> DisplayStatus {
    match base_status(record, vehicle) {
        DisplayStatus::Available if selection.contains(record.seat_number) => DisplayStatus::Selected,
        status => status,
    }
}

/// Whether clicking the seat does anything
#[must_use]
pub fn is_clickable(record: &SeatRecord, selection: &SelectionSet, vehicle: VehicleType) -> bool {
    base_status(record, vehicle) == DisplayStatus::Available || selection.contains(record.seat_number)
}

/// The seats of one trip as loaded from the inventory service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatInventory {
    trip_id: TripId,
    vehicle_type: VehicleType,
    seats: Vec<SeatRecord>,
}

impl SeatInventory {
    /// Build an inventory; records are ordered by seat number and duplicates
    /// keep their first occurrence
    #[must_use]
    pub fn new(trip_id: TripId, vehicle_type: VehicleType, mut seats: Vec<SeatRecord>) -> Self {
        seats.sort_by_key(|record| record.seat_number);
        seats.dedup_by_key(|record| record.seat_number);
        Self {
            trip_id,
            vehicle_type,
            seats,
        }
    }

    /// Trip these seats belong to
    #[must_use]
    pub const fn trip_id(&self) -> &TripId {
        &self.trip_id
    }

    /// Vehicle layout
    #[must_use]
    pub const fn vehicle_type(&self) -> VehicleType {
        self.vehicle_type
    }

    /// All records, ascending by seat number
    #[must_use]
    pub fn seats(&self) -> &[SeatRecord] {
        &self.seats
    }

    /// Record of one seat
    #[must_use]
    pub fn record(&self, seat: SeatNumber) -> Option<&SeatRecord> {
        self.seats
            .binary_search_by_key(&seat, |record| record.seat_number)
            .ok()
            .and_then(|index| self.seats.get(index))
    }

    /// Whether a seat exists and its base status is `Available`
    #[must_use]
    pub fn is_selectable(&self, seat: SeatNumber) -> bool {
        self.record(seat)
            .is_some_and(|record| base_status(record, self.vehicle_type) == DisplayStatus::Available)
    }

    /// Number of seats whose base status is `Available`
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.seats
            .iter()
            .filter(|record| base_status(record, self.vehicle_type) == DisplayStatus::Available)
            .count()
    }

    /// Display status of every seat under `selection`
    #[must_use]
    pub fn display(&self, selection: &SelectionSet) -> Vec<(SeatNumber, DisplayStatus)> {
        self.seats
            .iter()
            .map(|record| {
                (
                    record.seat_number,
                    derive_display_status(record, selection, self.vehicle_type),
                )
            })
            .collect()
    }
}
