//! Shared fixtures for the booking integration tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used)]

use bus_booking::flow::{flow_store, FlowAction, FlowEnvironment, FlowSettings, FlowStore};
use bus_booking::handoff::{HandoffStore, InMemoryHandoffStore};
use bus_booking::passenger::PassengerForm;
use bus_booking::services::mock::{MockBackend, RecordingRedirect};
use bus_booking::services::{BookingCreated, StaticIdentity, TripPage};
use bus_booking::types::{
    BookingId, Money, OrderId, RawSeatStatus, SeatNumber, SeatRecord, Trip, TripId, VehicleType,
};
use bus_booking_testing::test_clock;
use chrono::NaiveTime;
use std::sync::Arc;
use std::time::Duration;

pub const PAYMENT_URL: &str = "https://pay.example/checkout/o-42";

/// Everything a store test needs to look at after the fact
pub struct Fixture {
    pub backend: MockBackend,
    pub handoff: Arc<InMemoryHandoffStore>,
    pub redirect: RecordingRedirect,
    pub env: FlowEnvironment,
}

impl Fixture {
    pub fn new(backend: MockBackend) -> Self {
        let handoff = Arc::new(InMemoryHandoffStore::new());
        let redirect = RecordingRedirect::new();
        let env = FlowEnvironment::new(
            Arc::new(backend.clone()),
            Arc::new(StaticIdentity::anonymous()),
            Arc::clone(&handoff) as Arc<dyn HandoffStore>,
            Arc::new(redirect.clone()),
            Arc::new(test_clock()),
        )
        .with_settings(FlowSettings::default());

        Self {
            backend,
            handoff,
            redirect,
            env,
        }
    }

    /// Backend that knows two trips, ten seats and books successfully
    pub fn happy() -> Self {
        Self::new(
            MockBackend::new()
                .with_trips(trip_page())
                .with_seats(seats())
                .with_booking(created(Some(PAYMENT_URL))),
        )
    }

    pub fn store(&self) -> FlowStore {
        flow_store(self.env.clone())
    }
}

pub fn trip(id: &str, price_kopecks: i64, departure: (u32, u32)) -> Trip {
    Trip {
        id: TripId::new(id),
        origin: "Минск".to_string(),
        destination: "Брест".to_string(),
        departure_date: None,
        departure_time: NaiveTime::from_hms_opt(departure.0, departure.1, 0).unwrap(),
        arrival_date: None,
        arrival_time: NaiveTime::from_hms_opt(departure.0 + 4, departure.1, 0).unwrap(),
        price_per_seat: Money::from_kopecks(price_kopecks),
        vehicle_type: VehicleType::Bus,
        available_seat_count: 10,
        total_seat_count: 10,
    }
}

pub fn trip_page() -> TripPage {
    TripPage {
        trips: vec![trip("t1", 2550, (8, 0)), trip("t2", 1800, (14, 30))],
        page: 0,
        total_pages: 3,
        total_elements: 25,
    }
}

/// Seats 1..=10; 4 is sold, 6 is cancelled
pub fn seats() -> Vec<SeatRecord> {
    (1..=10)
        .map(|n| {
            let status = match n {
                4 => RawSeatStatus::Sold,
                6 => RawSeatStatus::Cancelled,
                _ => RawSeatStatus::Available,
            };
            SeatRecord::new(n, status)
        })
        .collect()
}

pub fn created(payment_url: Option<&str>) -> BookingCreated {
    BookingCreated {
        booking_id: BookingId::new("b-42"),
        order_id: OrderId::new("o-42"),
        payment_url: payment_url.map(ToString::to_string),
        reservation_expires_at: None,
    }
}

pub fn valid_form() -> PassengerForm {
    PassengerForm {
        first_name: "Иван".to_string(),
        last_name: "Петров".to_string(),
        phone: "+375 29 123-45-67".to_string(),
        email: "ivan@example.com".to_string(),
    }
}

pub fn search() -> FlowAction {
    FlowAction::SubmitSearch {
        origin: "Минск".to_string(),
        destination: "Брест".to_string(),
        date: "2026-02-10".to_string(),
    }
}

/// Send an action and wait for every effect it started
pub async fn settle(store: &FlowStore, action: FlowAction) {
    let mut handle = store.send(action).await.unwrap();
    handle.wait().await;
}

/// Wait until no effect is running; the countdown must be stopped
pub async fn drain(store: &FlowStore) {
    for _ in 0..100 {
        if store.pending_effects() == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("effects still running: {}", store.pending_effects());
}

/// Search, open trip `t1` and select seats 3 and 5
pub async fn at_seat_selection(store: &FlowStore) {
    settle(store, search()).await;
    settle(store, FlowAction::SelectTrip {
        trip_id: TripId::new("t1"),
    })
    .await;
    for seat in [5, 3] {
        settle(store, FlowAction::ToggleSeat {
            seat: SeatNumber::new(seat),
        })
        .await;
    }
}

/// Continue to the passenger form and fill it in
pub async fn at_passenger_details(store: &FlowStore) {
    at_seat_selection(store).await;
    settle(store, FlowAction::ConfirmSeats).await;
    settle(store, FlowAction::UpdatePassengerForm { form: valid_form() }).await;
}
