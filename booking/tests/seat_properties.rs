//! Property tests for the seat map, the selection and the countdown.

#![allow(clippy::unwrap_used)]

use bus_booking::seats::{derive_display_status, is_driver_area, SeatInventory};
use bus_booking::selection::{SelectionSet, ToggleOutcome};
use bus_booking::timer::{ReservationTimer, TickOutcome};
use bus_booking::types::{DisplayStatus, Money, RawSeatStatus, SeatNumber, SeatRecord, TripId, VehicleType};
use proptest::prelude::*;

fn raw_status() -> impl Strategy<Value = RawSeatStatus> {
    prop_oneof![
        4 => Just(RawSeatStatus::Available),
        1 => Just(RawSeatStatus::Reserved),
        1 => Just(RawSeatStatus::Sold),
        1 => Just(RawSeatStatus::Cancelled),
        1 => Just(RawSeatStatus::Unrecognized),
    ]
}

fn vehicle() -> impl Strategy<Value = VehicleType> {
    prop_oneof![Just(VehicleType::Bus), Just(VehicleType::Minibus)]
}

/// Seats numbered from 1 with arbitrary statuses
fn inventory() -> impl Strategy<Value = SeatInventory> {
    (prop::collection::vec(raw_status(), 1..40), vehicle()).prop_map(|(statuses, vehicle)| {
        let seats = statuses
            .into_iter()
            .zip(1u32..)
            .map(|(status, number)| SeatRecord::new(number, status))
            .collect();
        SeatInventory::new(TripId::new("t"), vehicle, seats)
    })
}

fn toggles() -> impl Strategy<Value = Vec<u32>> {
    prop::collection::vec(0u32..45, 0..60)
}

proptest! {
    #[test]
    fn selection_only_holds_available_seats(inventory in inventory(), toggles in toggles()) {
        let mut selection = SelectionSet::new();
        for seat in toggles {
            let seat = SeatNumber::new(seat);
            let was_available = inventory.is_selectable(seat);
            let was_selected = selection.contains(seat);

            let outcome = selection.toggle(seat, &inventory);
            match outcome {
                ToggleOutcome::Added => prop_assert!(was_available && !was_selected),
                ToggleOutcome::Removed => prop_assert!(was_selected),
                ToggleOutcome::Ignored => prop_assert!(!was_available && !was_selected),
            }
        }

        for seat in selection.seat_numbers() {
            prop_assert!(inventory.is_selectable(seat));
        }
    }

    #[test]
    fn display_status_is_a_pure_function(inventory in inventory(), toggles in toggles()) {
        let mut selection = SelectionSet::new();
        for seat in toggles {
            selection.toggle(SeatNumber::new(seat), &inventory);
        }
        let before = selection.clone();

        let first = inventory.display(&selection);
        let second = inventory.display(&selection);
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(&selection, &before);

        for record in inventory.seats() {
            prop_assert_eq!(
                derive_display_status(record, &selection, inventory.vehicle_type()),
                derive_display_status(record, &selection, inventory.vehicle_type())
            );
        }
    }

    #[test]
    fn driver_area_is_always_blocked(inventory in inventory(), toggles in toggles()) {
        let mut selection = SelectionSet::new();
        for seat in toggles {
            selection.toggle(SeatNumber::new(seat), &inventory);
        }

        let vehicle = inventory.vehicle_type();
        for (seat, status) in inventory.display(&selection) {
            let driver = match vehicle {
                VehicleType::Bus => seat.get() <= 2,
                VehicleType::Minibus => seat.get() == 1,
            };
            prop_assert_eq!(is_driver_area(seat, vehicle), driver);
            if driver {
                prop_assert_eq!(status, DisplayStatus::Blocked);
            }
        }
    }

    #[test]
    fn total_price_is_stable(
        inventory in inventory(),
        toggles in toggles(),
        kopecks in 0i64..100_000,
        extra in 0u32..45,
    ) {
        let price = Money::from_kopecks(kopecks);
        let mut selection = SelectionSet::new();
        for seat in toggles {
            selection.toggle(SeatNumber::new(seat), &inventory);
        }

        let total = selection.total_price(price);
        prop_assert_eq!(total, selection.total_price(price));
        prop_assert_eq!(total, price.times(selection.len()));

        let seat = SeatNumber::new(extra);
        if !selection.contains(seat) && selection.toggle(seat, &inventory) == ToggleOutcome::Added {
            selection.toggle(seat, &inventory);
            prop_assert_eq!(selection.total_price(price), total);
        }
    }

    #[test]
    fn countdown_expires_exactly_once(minutes in 1u32..4, extra_ticks in 0u32..30) {
        let mut timer = ReservationTimer::new();
        let generation = timer.start(minutes);
        let total = minutes * 60;

        let mut expired_at = Vec::new();
        for tick in 1..=total + extra_ticks {
            if timer.tick(generation) == TickOutcome::Expired {
                expired_at.push(tick);
            }
        }

        prop_assert_eq!(expired_at, vec![total]);
        prop_assert!(!timer.is_running());
    }

    #[test]
    fn stopped_countdown_never_expires(minutes in 1u32..4, stop_after in 0u32..180) {
        let mut timer = ReservationTimer::new();
        let generation = timer.start(minutes);

        for _ in 0..stop_after.min(minutes * 60 - 1) {
            timer.tick(generation);
        }
        timer.stop();

        for _ in 0..minutes * 60 {
            prop_assert_eq!(timer.tick(generation), TickOutcome::Ignored);
        }
    }
}

#[test]
fn test_bus_with_all_seats_available() {
    let seats = (1..=20).map(|n| SeatRecord::new(n, RawSeatStatus::Available)).collect();
    let inventory = SeatInventory::new(TripId::new("t"), VehicleType::Bus, seats);

    let display = inventory.display(&SelectionSet::new());
    let blocked: Vec<u32> = display
        .iter()
        .filter(|(_, status)| *status == DisplayStatus::Blocked)
        .map(|(seat, _)| seat.get())
        .collect();
    assert_eq!(blocked, vec![1, 2]);
    assert_eq!(inventory.available_count(), 18);
}

#[test]
fn test_restart_ignores_ticks_of_the_previous_countdown() {
    let mut timer = ReservationTimer::new();
    let first = timer.start(1);
    let second = timer.start(1);

    assert_eq!(timer.tick(first), TickOutcome::Ignored);
    assert_eq!(
        timer.tick(second),
        TickOutcome::Running {
            remaining_seconds: 59
        }
    );
}
