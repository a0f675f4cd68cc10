//! Booking flow integration tests.
//!
//! Drive the flow through the real store runtime with tokio's paused clock,
//! so the reservation countdown runs through its delayed ticks without wall
//! clock time.

#![allow(clippy::unwrap_used)]

mod common;

use bus_booking::flow::{flow_store, FlowAction, FlowEnvironment, FlowStep};
use bus_booking::handoff::{FileHandoffStore, HandoffStore, PendingBookingHandoff};
use bus_booking::messages::UserMessage;
use bus_booking::routes::FlowRoute;
use bus_booking::search::{ListingFilters, SortOption};
use bus_booking::services::mock::{MockBackend, MockCall, RecordingRedirect};
use bus_booking::services::StaticIdentity;
use bus_booking::types::{BookingId, OrderId, SeatNumber, TripId};
use common::{
    at_passenger_details, at_seat_selection, created, drain, search, seats, settle, trip_page, valid_form,
    Fixture, PAYMENT_URL,
};
use bus_booking_testing::test_clock;
use std::sync::Arc;
use std::time::Duration;

fn seat_loads(backend: &MockBackend) -> usize {
    backend
        .calls()
        .iter()
        .filter(|call| matches!(call, MockCall::LoadSeats { .. }))
        .count()
}

#[tokio::test(start_paused = true)]
async fn test_search_lists_trips_and_paging_keeps_filters() {
    let fixture = Fixture::happy();
    let store = fixture.store();

    settle(&store, search()).await;
    let filters = ListingFilters {
        sort: SortOption::PriceAsc,
        ..ListingFilters::default()
    };
    settle(&store, FlowAction::UpdateFilters {
        filters: filters.clone(),
    })
    .await;
    settle(&store, FlowAction::ChangePage { page: 1 }).await;

    let (step, listing) = store.state(|s| (s.step, s.listing.clone())).await;
    let listing = listing.unwrap();
    assert_eq!(step, FlowStep::Listing);
    assert_eq!(listing.page, 1);
    assert_eq!(listing.filters, filters);

    let ids: Vec<String> = listing.visible_trips().iter().map(|t| t.id.to_string()).collect();
    assert_eq!(ids, vec!["t2", "t1"]);

    let pages: Vec<u32> = fixture
        .backend
        .calls()
        .iter()
        .filter_map(|call| match call {
            MockCall::SearchTrips { page, size, .. } => {
                assert_eq!(*size, 10);
                Some(*page)
            },
            _ => None,
        })
        .collect();
    assert_eq!(pages, vec![0, 1]);
}

#[tokio::test(start_paused = true)]
async fn test_selection_summary_and_price() {
    let fixture = Fixture::happy();
    let store = fixture.store();

    at_seat_selection(&store).await;
    settle(&store, FlowAction::ToggleSeat {
        seat: SeatNumber::new(8),
    })
    .await;

    let (summary, total) = store
        .state(|s| (s.selection.summary(), s.total_price().to_string()))
        .await;
    assert_eq!(summary, "3, 5, 8");
    assert_eq!(total, common::trip("t1", 2550, (8, 0)).price_per_seat.times(3).to_string());
}

#[tokio::test(start_paused = true)]
async fn test_reservation_expires_once_after_fifteen_minutes() {
    let fixture = Fixture::happy();
    let store = fixture.store();

    at_passenger_details(&store).await;
    assert_eq!(seat_loads(&fixture.backend), 1);

    tokio::time::sleep(Duration::from_secs(880)).await;
    let (step, running) = store.state(|s| (s.step, s.timer.is_running())).await;
    assert_eq!(step, FlowStep::PassengerDetails);
    assert!(running);

    tokio::time::sleep(Duration::from_secs(30)).await;
    let state = store.state(Clone::clone).await;
    assert_eq!(state.step, FlowStep::SeatSelection);
    assert!(state.selection.is_empty());
    assert!(state.passenger_details.is_none());
    assert!(!state.timer.is_running());
    assert_eq!(
        state.expiry_notice.map(|notice| notice.message),
        Some(UserMessage::ReservationExpired)
    );

    // Seats are reloaded once on expiry and nothing fires afterwards
    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(seat_loads(&fixture.backend), 2);
    assert_eq!(store.pending_effects(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_toggles_wait_for_expiry_acknowledgement() {
    let fixture = Fixture::happy();
    let store = fixture.store();

    at_passenger_details(&store).await;
    tokio::time::sleep(Duration::from_secs(901)).await;

    settle(&store, FlowAction::ToggleSeat {
        seat: SeatNumber::new(7),
    })
    .await;
    assert!(store.state(|s| s.selection.is_empty()).await);

    settle(&store, FlowAction::AcknowledgeExpiry).await;
    settle(&store, FlowAction::ToggleSeat {
        seat: SeatNumber::new(7),
    })
    .await;
    assert_eq!(
        store.state(bus_booking::BookingFlowState::selected_seats).await,
        vec![SeatNumber::new(7)]
    );
}

#[tokio::test(start_paused = true)]
async fn test_missing_payment_url_keeps_passenger_step() {
    let fixture = Fixture::new(
        MockBackend::new()
            .with_trips(trip_page())
            .with_seats(seats())
            .with_booking(created(None)),
    );
    let store = fixture.store();

    at_passenger_details(&store).await;
    settle(&store, FlowAction::SubmitPassenger).await;

    let state = store.state(Clone::clone).await;
    assert_eq!(state.step, FlowStep::PassengerDetails);
    assert_eq!(state.passenger_step.submit_error, Some(UserMessage::MissingPaymentUrl));
    assert_eq!(state.passenger_step.form, valid_form());
    assert_eq!(state.selected_seats(), vec![SeatNumber::new(3), SeatNumber::new(5)]);
    assert!(state.timer.is_running());
    assert!(state.booking_id.is_none());

    assert!(fixture.handoff.peek().unwrap().is_none());
    assert!(fixture.redirect.urls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_successful_booking_writes_one_handoff_and_redirects() {
    let fixture = Fixture::happy();
    let store = fixture.store();

    at_passenger_details(&store).await;
    settle(&store, FlowAction::SubmitPassenger).await;
    drain(&store).await;

    let state = store.state(Clone::clone).await;
    assert_eq!(state.step, FlowStep::PaymentHandoff);
    assert_eq!(state.booking_id, Some(BookingId::new("b-42")));
    assert_eq!(state.payment_url.as_deref(), Some(PAYMENT_URL));
    assert!(!state.timer.is_running());

    assert_eq!(
        fixture.handoff.peek().unwrap(),
        Some(PendingBookingHandoff {
            booking_id: BookingId::new("b-42"),
            order_id: OrderId::new("o-42"),
        })
    );
    assert_eq!(fixture.redirect.urls(), vec![PAYMENT_URL.to_string()]);
    assert!(fixture.backend.calls().contains(&MockCall::CreateBooking {
        trip_id: TripId::new("t1"),
        seats: vec![SeatNumber::new(3), SeatNumber::new(5)],
    }));
}

#[tokio::test(start_paused = true)]
async fn test_cancel_callback_clears_handoff_and_success_shows_no_stale_booking() {
    let fixture = Fixture::happy();
    let store = fixture.store();

    at_passenger_details(&store).await;
    settle(&store, FlowAction::SubmitPassenger).await;
    drain(&store).await;
    assert!(fixture.handoff.peek().unwrap().is_some());

    let cancel = FlowRoute::parse("/payment/cancel?orderId=ORD123").unwrap();
    settle(&store, FlowAction::Navigate { route: cancel }).await;

    let (step, cancelled) = store.state(|s| (s.step, s.cancelled_order_id.clone())).await;
    assert_eq!(step, FlowStep::PaymentCancelled);
    assert_eq!(cancelled, Some(OrderId::new("ORD123")));
    assert!(fixture.handoff.peek().unwrap().is_none());

    let success = FlowRoute::parse("/payment/success?orderId=ORD123").unwrap();
    settle(&store, FlowAction::Navigate { route: success }).await;

    let (step, confirmation) = store.state(|s| (s.step, s.confirmation.clone())).await;
    assert_eq!(step, FlowStep::Confirmation);
    let confirmation = confirmation.unwrap();
    assert_eq!(confirmation.booking_id, None);
    assert_eq!(confirmation.order_id, Some(OrderId::new("ORD123")));
}

#[tokio::test(start_paused = true)]
async fn test_success_callback_consumes_handoff_in_a_fresh_flow() {
    let fixture = Fixture::happy();
    fixture
        .handoff
        .save(&PendingBookingHandoff {
            booking_id: BookingId::new("b-7"),
            order_id: OrderId::new("o-7"),
        })
        .unwrap();

    // A new process after the payment page sent the passenger back
    let store = fixture.store();
    let success = FlowRoute::parse("https://bus.example/payment/success?orderId=o-7").unwrap();
    settle(&store, FlowAction::Navigate { route: success }).await;

    let confirmation = store.state(|s| s.confirmation.clone()).await.unwrap();
    assert_eq!(confirmation.booking_id, Some(BookingId::new("b-7")));
    assert_eq!(confirmation.order_id, Some(OrderId::new("o-7")));
    assert!(fixture.handoff.peek().unwrap().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_late_booking_success_after_expiry_is_kept() {
    let fixture = Fixture::new(
        MockBackend::new()
            .with_trips(trip_page())
            .with_seats(seats())
            .with_booking(created(Some(PAYMENT_URL)))
            .with_booking_delay(Duration::from_secs(20 * 60)),
    );
    let store = fixture.store();

    at_passenger_details(&store).await;
    settle(&store, FlowAction::SubmitPassenger).await;
    drain(&store).await;

    let state = store.state(Clone::clone).await;
    assert_eq!(state.step, FlowStep::PaymentHandoff);
    assert_eq!(state.booking_id, Some(BookingId::new("b-42")));
    assert!(state.expiry_notice.is_none());
    assert!(fixture.handoff.peek().unwrap().is_some());
    assert_eq!(fixture.redirect.urls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_late_booking_failure_after_expiry_returns_to_seats() {
    let fixture = Fixture::new(
        MockBackend::new()
            .with_trips(trip_page())
            .with_seats(seats())
            .with_booking_error(bus_booking_backend::BackendError::ApiError {
                status: 409,
                message: Some("Места уже заняты".to_string()),
            })
            .with_booking_delay(Duration::from_secs(20 * 60)),
    );
    let store = fixture.store();

    at_passenger_details(&store).await;
    settle(&store, FlowAction::SubmitPassenger).await;
    drain(&store).await;

    let state = store.state(Clone::clone).await;
    assert_eq!(state.step, FlowStep::SeatSelection);
    assert!(state.selection.is_empty());
    assert!(state.expiry_notice.is_some());
    assert!(fixture.redirect.urls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_leaving_during_booking_discards_its_response() {
    for (route, expected) in [
        (FlowRoute::Search, FlowStep::Search),
        (FlowRoute::Listing, FlowStep::Listing),
        (FlowRoute::SeatSelection, FlowStep::SeatSelection),
    ] {
        let fixture = Fixture::new(
            MockBackend::new()
                .with_trips(trip_page())
                .with_seats(seats())
                .with_booking(created(Some(PAYMENT_URL)))
                .with_booking_delay(Duration::from_millis(300)),
        );
        let store = fixture.store();

        at_passenger_details(&store).await;
        store.send(FlowAction::SubmitPassenger).await.unwrap();
        assert!(store.state(|s| s.is_booking_in_flight()).await);

        settle(&store, FlowAction::Navigate { route }).await;
        assert_eq!(store.state(|s| s.step).await, expected);
        drain(&store).await;

        let state = store.state(Clone::clone).await;
        assert_eq!(state.step, expected);
        assert!(state.booking.is_none());
        assert!(state.booking_id.is_none());
        assert!(!state.timer.is_running());
        assert_eq!(fixture.backend.create_booking_calls(), 1);
        assert!(fixture.redirect.urls().is_empty());
        assert!(fixture.handoff.peek().unwrap().is_none());
    }
}

#[tokio::test(start_paused = true)]
async fn test_unwritable_handoff_still_redirects_to_payment() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "").unwrap();
    let handoff = FileHandoffStore::new(blocker.join("pending-booking.json"));
    let redirect = RecordingRedirect::new();

    let store = flow_store(FlowEnvironment::new(
        Arc::new(
            MockBackend::new()
                .with_trips(trip_page())
                .with_seats(seats())
                .with_booking(created(Some(PAYMENT_URL))),
        ),
        Arc::new(StaticIdentity::anonymous()),
        Arc::new(handoff.clone()),
        Arc::new(redirect.clone()),
        Arc::new(test_clock()),
    ));

    at_passenger_details(&store).await;
    settle(&store, FlowAction::SubmitPassenger).await;
    drain(&store).await;

    // The booking exists server-side, so the passenger is still sent to pay;
    // the success callback then shows the order id without a booking id
    let (step, payment_url) = store.state(|s| (s.step, s.payment_url.clone())).await;
    assert_eq!(step, FlowStep::PaymentHandoff);
    assert_eq!(payment_url.as_deref(), Some(PAYMENT_URL));
    assert_eq!(redirect.urls(), vec![PAYMENT_URL.to_string()]);
    assert!(!handoff.path().exists());
}

#[tokio::test(start_paused = true)]
async fn test_restart_stops_countdown_and_clears_handoff() {
    let fixture = Fixture::happy();
    let store = fixture.store();

    at_passenger_details(&store).await;
    settle(&store, FlowAction::Restart).await;
    drain(&store).await;

    let state = store.state(Clone::clone).await;
    assert_eq!(state.step, FlowStep::Search);
    assert!(state.selected_trip.is_none());
    assert!(state.selection.is_empty());
    assert!(!state.timer.is_running());
}
