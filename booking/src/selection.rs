//! The set of seats the passenger has toggled on.

use crate::seats::SeatInventory;
use crate::types::{Money, SeatNumber};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// What a toggle did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Seat was added
    Added,
    /// Seat was removed
    Removed,
    /// Seat is not available; nothing changed
    Ignored,
}

/// Unique seat numbers chosen for one booking attempt
///
/// Members only enter through [`SelectionSet::toggle`], which checks the seat
/// against the loaded inventory.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionSet {
    seats: BTreeSet<SeatNumber>,
}

impl SelectionSet {
    /// Empty selection
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the seat if absent and available, remove it if present
    pub fn toggle(&mut self, seat: SeatNumber, inventory: &SeatInventory) -> ToggleOutcome {
        if self.seats.remove(&seat) {
            ToggleOutcome::Removed
        } else if inventory.is_selectable(seat) {
            self.seats.insert(seat);
            ToggleOutcome::Added
        } else {
            ToggleOutcome::Ignored
        }
    }

    /// Keep only seats still available in `inventory`
    pub fn retain_available(&mut self, inventory: &SeatInventory) {
        self.seats.retain(|seat| inventory.is_selectable(*seat));
    }

    /// Drop every seat
    pub fn clear(&mut self) {
        self.seats.clear();
    }

    /// Whether the seat is selected
    #[must_use]
    pub fn contains(&self, seat: SeatNumber) -> bool {
        self.seats.contains(&seat)
    }

    /// Number of selected seats
    #[must_use]
    pub fn len(&self) -> usize {
        self.seats.len()
    }

    /// Whether nothing is selected
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seats.is_empty()
    }

    /// Selected seats, ascending
    #[must_use]
    pub fn seat_numbers(&self) -> Vec<SeatNumber> {
        self.seats.iter().copied().collect()
    }

    /// Selected seats as shown to passengers, e.g. `3, 5, 8`
    #[must_use]
    pub fn summary(&self) -> String {
        self.seats
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Price of the selection
    #[must_use]
    pub fn total_price(&self, price_per_seat: Money) -> Money {
        price_per_seat.times(self.seats.len())
    }

    #[cfg(test)]
    pub(crate) fn insert_unchecked(&mut self, seat: SeatNumber) {
        self.seats.insert(seat);
    }
}
