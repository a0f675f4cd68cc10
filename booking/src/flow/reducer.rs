//! Reducer for the booking flow.

use super::actions::FlowAction;
use super::environment::FlowEnvironment;
use super::types::{
    BookingAttempt, BookingFlowState, ConfirmationView, ExpiryNotice, FlowStep, ListingState,
    Loadable, PassengerStepState, SeatStepState,
};
use crate::handoff::PendingBookingHandoff;
use crate::messages::UserMessage;
use crate::passenger::{PassengerErrors, PassengerForm, ProfileData};
use crate::routes::FlowRoute;
use crate::search::{ListingFilters, SearchValidationError, TripSearchQuery};
use crate::seats::SeatInventory;
use crate::selection::ToggleOutcome;
use crate::services::{BookingCreated, TripPage};
use crate::timer::TickOutcome;
use crate::types::{OrderId, SeatNumber, SeatRecord, TripId, VehicleType};
use bus_booking_backend::BackendError;
use bus_booking_core::{
    effect::{Effect, EffectId},
    reducer::Reducer,
};
use smallvec::{smallvec, SmallVec};
use tracing::{debug, info, warn};

/// Cancellation id of the pending reservation countdown tick
pub const RESERVATION_TIMER: EffectId = EffectId::new("reservation-timer");

type Effects = SmallVec<[Effect<FlowAction>; 4]>;

/// Reducer driving the passenger through search, seats, details and payment
///
/// Every transition is a named [`FlowAction`]. Backend calls, the handoff
/// record, the payment redirect and countdown ticks are returned as effects.
pub struct FlowReducer;

impl FlowReducer {
    /// Create a new flow reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for FlowReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for FlowReducer {
    type State = BookingFlowState;
    type Action = FlowAction;
    type Environment = FlowEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        let before = state.step;

        let effects = match action {
            FlowAction::SubmitSearch {
                origin,
                destination,
                date,
            } => submit_search(state, env, &origin, &destination, &date),
            FlowAction::ChangePage { page } => change_page(state, env, page),
            FlowAction::UpdateFilters { filters } => update_filters(state, filters),
            FlowAction::RetryListing => retry_listing(state, env),
            FlowAction::SelectTrip { trip_id } => select_trip(state, env, &trip_id),
            FlowAction::RetrySeats => retry_seats(state, env),
            FlowAction::ToggleSeat { seat } => toggle_seat(state, seat),
            FlowAction::ConfirmSeats => confirm_seats(state, env),
            FlowAction::BookNow => book_now(state, env),
            FlowAction::AcknowledgeExpiry => {
                state.expiry_notice = None;
                smallvec![Effect::None]
            },
            FlowAction::UpdatePassengerForm { form } => update_passenger_form(state, form),
            FlowAction::SubmitPassenger => submit_passenger(state, env),
            FlowAction::Back => back(state, env),
            FlowAction::Navigate { route } => navigate(state, env, route),
            FlowAction::Restart => restart(state, env),
            FlowAction::ListingLoaded { request, result } => listing_loaded(state, request, result),
            FlowAction::SeatsLoaded {
                request,
                trip_id,
                result,
            } => seats_loaded(state, request, &trip_id, result),
            FlowAction::ProfileLoaded { request, result } => {
                profile_loaded(state, env, request, result)
            },
            FlowAction::BookingCompleted { request, result } => {
                booking_completed(state, env, request, result)
            },
            FlowAction::RedirectedToPayment {
                payment_url,
                handoff,
            } => {
                info!(order_id = %handoff.order_id, "Passenger sent to payment page");
                state.payment_url = Some(payment_url);
                smallvec![Effect::None]
            },
            FlowAction::HandoffRecovered { booking_id } => {
                if state.step == FlowStep::Confirmation {
                    if let Some(confirmation) = state.confirmation.as_mut() {
                        confirmation.booking_id = booking_id;
                    }
                }
                smallvec![Effect::None]
            },
            FlowAction::TimerTicked { generation } => timer_ticked(state, env, generation),
        };

        if state.step != before {
            debug!(from = ?before, to = ?state.step, "Flow step changed");
        }

        effects
    }
}

// ============================================================================
// Effects
// ============================================================================

fn fetch_listing(env: &FlowEnvironment, query: TripSearchQuery, page: u32, request: u64) -> Effect<FlowAction> {
    let trips = env.trips();
    let size = env.settings().page_size;
    Effect::Future(Box::pin(async move {
        let result = trips.search_trips(query, page, size).await;
        Some(FlowAction::ListingLoaded { request, result })
    }))
}

fn load_seats(env: &FlowEnvironment, trip_id: TripId, request: u64) -> Effect<FlowAction> {
    let seats = env.seats();
    Effect::Future(Box::pin(async move {
        let result = seats.load_seats(trip_id.clone()).await;
        Some(FlowAction::SeatsLoaded {
            request,
            trip_id,
            result,
        })
    }))
}

fn load_profile(env: &FlowEnvironment, request: u64) -> Effect<FlowAction> {
    let profiles = env.profiles();
    Effect::Future(Box::pin(async move {
        let result = profiles.current_profile().await;
        Some(FlowAction::ProfileLoaded { request, result })
    }))
}

fn create_booking(
    env: &FlowEnvironment,
    trip_id: TripId,
    seats: Vec<SeatNumber>,
    request: u64,
) -> Effect<FlowAction> {
    let bookings = env.bookings();
    Effect::Future(Box::pin(async move {
        let result = bookings.create_booking(trip_id, seats).await;
        Some(FlowAction::BookingCompleted { request, result })
    }))
}

fn schedule_tick(env: &FlowEnvironment, generation: u64) -> Effect<FlowAction> {
    Effect::Delay {
        duration: env.settings().tick_interval,
        action: Box::new(FlowAction::TimerTicked { generation }),
    }
    .cancellable(RESERVATION_TIMER)
}

/// Persist the handoff, then leave for the payment page
///
/// A failed write is logged and the redirect happens anyway.
fn redirect_to_payment(
    env: &FlowEnvironment,
    handoff: PendingBookingHandoff,
    payment_url: String,
) -> Effect<FlowAction> {
    let store = env.handoff();
    let redirect = env.redirect();
    Effect::Future(Box::pin(async move {
        if let Err(error) = store.save(&handoff) {
            warn!(%error, booking_id = %handoff.booking_id, "Could not persist pending booking before payment redirect");
        }
        redirect.redirect(&payment_url);
        Some(FlowAction::RedirectedToPayment {
            payment_url,
            handoff,
        })
    }))
}

fn take_handoff(env: &FlowEnvironment) -> Effect<FlowAction> {
    let store = env.handoff();
    Effect::Future(Box::pin(async move {
        let booking_id = match store.take() {
            Ok(record) => record.map(|handoff| handoff.booking_id),
            Err(error) => {
                warn!(%error, "Pending booking record unreadable; discarded");
                None
            },
        };
        Some(FlowAction::HandoffRecovered { booking_id })
    }))
}

fn clear_handoff(env: &FlowEnvironment) -> Effect<FlowAction> {
    let store = env.handoff();
    Effect::Future(Box::pin(async move {
        if let Err(error) = store.clear() {
            warn!(%error, "Could not remove pending booking record");
        }
        None
    }))
}

// ============================================================================
// Shared transitions
// ============================================================================

/// Stop the countdown and cancel its pending tick
fn stop_timer(state: &mut BookingFlowState) -> Effects {
    if state.timer.is_running() {
        state.timer.stop();
        smallvec![Effect::Cancel(RESERVATION_TIMER)]
    } else {
        SmallVec::new()
    }
}

/// Move to `step`; the countdown only survives on the passenger and payment steps
fn go_to(state: &mut BookingFlowState, step: FlowStep) -> Effects {
    state.step = step;
    if matches!(step, FlowStep::PassengerDetails | FlowStep::PaymentHandoff) {
        SmallVec::new()
    } else {
        stop_timer(state)
    }
}

/// Drop a booking request still in flight; its response will be discarded
fn abandon_booking(state: &mut BookingFlowState) {
    if let Some(attempt) = state.booking.take() {
        warn!(request = attempt.request, "Leaving step with a booking request in flight; its response will be ignored");
    }
}

/// Forget everything tied to the selected trip
fn clear_trip_context(state: &mut BookingFlowState) -> Effects {
    abandon_booking(state);
    state.selected_trip = None;
    state.selection.clear();
    state.passenger_details = None;
    state.seat_step = SeatStepState::default();
    state.passenger_step.errors = PassengerErrors::default();
    state.passenger_step.submit_error = None;
    state.expiry_notice = None;
    state.booking_id = None;
    state.order_id = None;
    state.payment_url = None;
    stop_timer(state)
}

fn guard_redirect(state: &mut BookingFlowState, route: &FlowRoute) -> Effects {
    debug!(?route, "Flow state missing for route; returning to search");
    go_to(state, FlowStep::Search)
}

fn enter_seat_selection(state: &mut BookingFlowState, env: &FlowEnvironment) -> Effects {
    let Some(trip_id) = state.selected_trip.as_ref().map(|trip| trip.id.clone()) else {
        return guard_redirect(state, &FlowRoute::SeatSelection);
    };

    let request = state.next_request();
    state.seat_step = SeatStepState {
        inventory: Loadable::Loading,
        error: None,
        request,
    };

    let mut effects = go_to(state, FlowStep::SeatSelection);
    effects.push(load_seats(env, trip_id, request));
    effects
}

fn enter_passenger_details(state: &mut BookingFlowState, env: &FlowEnvironment) -> Effects {
    let mut effects = go_to(state, FlowStep::PassengerDetails);
    state.seat_step.error = None;
    state.passenger_step.errors = PassengerErrors::default();
    state.passenger_step.submit_error = None;

    if let Some(details) = &state.passenger_details {
        state.passenger_step.form = PassengerForm::from_details(details);
    }

    if !state.timer.is_running() {
        let minutes = env.settings().reservation_minutes;
        let generation = state.timer.start(minutes);
        info!(minutes, "Reservation countdown started");
        effects.push(schedule_tick(env, generation));
    }

    let untouched = state.passenger_details.is_none() && state.passenger_step.form == PassengerForm::default();
    if untouched && env.identity().auth_state().is_authenticated() {
        let request = state.next_request();
        state.passenger_step.request = request;
        state.passenger_step.prefill_pending = true;
        effects.push(load_profile(env, request));
    }

    effects
}

fn start_booking(state: &mut BookingFlowState, env: &FlowEnvironment, origin: FlowStep) -> Effects {
    let Some(trip_id) = state.selected_trip.as_ref().map(|trip| trip.id.clone()) else {
        return guard_redirect(state, &FlowRoute::PaymentHandoff);
    };

    let seats = state.selection.seat_numbers();
    let request = state.next_request();
    state.booking = Some(BookingAttempt {
        origin,
        expired_in_flight: false,
        request,
    });

    info!(trip_id = %trip_id, seats = %state.selection.summary(), "Creating booking");
    smallvec![create_booking(env, trip_id, seats, request)]
}

/// The countdown ran out: back to the seat map with a fresh inventory
fn expire(state: &mut BookingFlowState, env: &FlowEnvironment) -> Effects {
    info!("Reservation countdown ran out");
    state.selection.clear();
    state.passenger_details = None;
    state.passenger_step = PassengerStepState::default();
    state.expiry_notice = Some(ExpiryNotice {
        expired_at: env.clock().now(),
        message: UserMessage::ReservationExpired,
    });
    enter_seat_selection(state, env)
}

// ============================================================================
// Search and listing
// ============================================================================

fn submit_search(
    state: &mut BookingFlowState,
    env: &FlowEnvironment,
    origin: &str,
    destination: &str,
    date: &str,
) -> Effects {
    let query = match TripSearchQuery::new(origin, destination, date) {
        Ok(query) => query,
        Err(error) => {
            debug!(%error, "Search form rejected");
            state.search_error = Some(match error {
                SearchValidationError::InvalidDate(_) => UserMessage::InvalidSearchDate,
                _ => UserMessage::SearchIncomplete,
            });
            return smallvec![Effect::None];
        },
    };

    state.search_error = None;
    let mut effects = clear_trip_context(state);

    let request = state.next_request();
    state.last_search_query = Some(query.clone());
    state.listing = Some(ListingState {
        query: query.clone(),
        page: 0,
        total_pages: 0,
        total_elements: 0,
        trips: Loadable::Loading,
        filters: ListingFilters::default(),
        request,
    });

    effects.extend(go_to(state, FlowStep::Listing));
    effects.push(fetch_listing(env, query, 0, request));
    effects
}

fn change_page(state: &mut BookingFlowState, env: &FlowEnvironment, page: u32) -> Effects {
    if state.step != FlowStep::Listing {
        return smallvec![Effect::None];
    }

    let request = state.next_request();
    let Some(listing) = state.listing.as_mut() else {
        return smallvec![Effect::None];
    };

    let out_of_range = listing.total_pages > 0 && page >= listing.total_pages;
    let unchanged = page == listing.page && listing.trips.loaded().is_some();
    if out_of_range || unchanged {
        debug!(page, total_pages = listing.total_pages, "Page change ignored");
        return smallvec![Effect::None];
    }

    listing.page = page;
    listing.trips = Loadable::Loading;
    listing.request = request;
    smallvec![fetch_listing(env, listing.query.clone(), page, request)]
}

fn update_filters(state: &mut BookingFlowState, filters: ListingFilters) -> Effects {
    if let Some(listing) = state.listing.as_mut() {
        listing.filters = filters;
    }
    smallvec![Effect::None]
}

fn retry_listing(state: &mut BookingFlowState, env: &FlowEnvironment) -> Effects {
    if state.step != FlowStep::Listing {
        return smallvec![Effect::None];
    }

    let request = state.next_request();
    match state.listing.as_mut() {
        Some(listing) if listing.trips.is_failed() => {
            listing.trips = Loadable::Loading;
            listing.request = request;
            smallvec![fetch_listing(env, listing.query.clone(), listing.page, request)]
        },
        _ => smallvec![Effect::None],
    }
}

fn listing_loaded(
    state: &mut BookingFlowState,
    request: u64,
    result: Result<TripPage, BackendError>,
) -> Effects {
    let Some(listing) = state.listing.as_mut().filter(|listing| listing.request == request) else {
        debug!(request, "Discarding stale listing response");
        return smallvec![Effect::None];
    };

    match result {
        Ok(page) => {
            debug!(trips = page.trips.len(), page = listing.page, "Listing loaded");
            listing.total_pages = page.total_pages;
            listing.total_elements = page.total_elements;
            listing.trips = Loadable::Loaded(page.trips);
        },
        Err(error) => {
            warn!(%error, "Trip listing failed");
            listing.trips =
                Loadable::Failed(UserMessage::from_backend_error(&error, UserMessage::TripsLoadFailed));
        },
    }

    smallvec![Effect::None]
}

// ============================================================================
// Seat selection
// ============================================================================

fn select_trip(state: &mut BookingFlowState, env: &FlowEnvironment, trip_id: &TripId) -> Effects {
    if state.step != FlowStep::Listing {
        return smallvec![Effect::None];
    }

    let Some(trip) = state.listing.as_ref().and_then(|listing| listing.trip(trip_id)).cloned() else {
        debug!(%trip_id, "Selected trip is not on the loaded page");
        return smallvec![Effect::None];
    };

    let mut effects = if state.selected_trip.as_ref().is_some_and(|current| current.id == trip.id) {
        SmallVec::new()
    } else {
        clear_trip_context(state)
    };

    state.selected_trip = Some(trip);
    effects.extend(enter_seat_selection(state, env));
    effects
}

fn retry_seats(state: &mut BookingFlowState, env: &FlowEnvironment) -> Effects {
    if state.step == FlowStep::SeatSelection && state.seat_step.inventory.is_failed() {
        enter_seat_selection(state, env)
    } else {
        smallvec![Effect::None]
    }
}

fn seats_loaded(
    state: &mut BookingFlowState,
    request: u64,
    trip_id: &TripId,
    result: Result<Vec<SeatRecord>, BackendError>,
) -> Effects {
    let current = state.step == FlowStep::SeatSelection
        && state.seat_step.request == request
        && state.selected_trip.as_ref().is_some_and(|trip| &trip.id == trip_id);
    if !current {
        debug!(request, %trip_id, "Discarding stale seat inventory response");
        return smallvec![Effect::None];
    }

    match result {
        Ok(records) => {
            let vehicle = state
                .selected_trip
                .as_ref()
                .map_or(VehicleType::Bus, |trip| trip.vehicle_type);
            let inventory = SeatInventory::new(trip_id.clone(), vehicle, records);
            state.selection.retain_available(&inventory);
            debug!(available = inventory.available_count(), "Seat inventory loaded");
            state.seat_step.inventory = Loadable::Loaded(inventory);
        },
        Err(error) => {
            warn!(%error, %trip_id, "Seat inventory failed");
            state.seat_step.inventory =
                Loadable::Failed(UserMessage::from_backend_error(&error, UserMessage::SeatsLoadFailed));
        },
    }

    smallvec![Effect::None]
}

/// Whether the seat map accepts input right now
fn seat_map_editable(state: &BookingFlowState) -> bool {
    state.step == FlowStep::SeatSelection && state.booking.is_none() && state.expiry_notice.is_none()
}

fn toggle_seat(state: &mut BookingFlowState, seat: SeatNumber) -> Effects {
    if !seat_map_editable(state) {
        debug!(%seat, "Seat toggle ignored");
        return smallvec![Effect::None];
    }

    let Some(inventory) = state.seat_step.inventory.loaded() else {
        return smallvec![Effect::None];
    };

    match state.selection.toggle(seat, inventory) {
        ToggleOutcome::Ignored => debug!(%seat, "Seat is not available"),
        ToggleOutcome::Added | ToggleOutcome::Removed => state.seat_step.error = None,
    }

    smallvec![Effect::None]
}

fn confirm_seats(state: &mut BookingFlowState, env: &FlowEnvironment) -> Effects {
    if !seat_map_editable(state) {
        return smallvec![Effect::None];
    }
    if state.selection.is_empty() {
        state.seat_step.error = Some(UserMessage::NoSeatsSelected);
        return smallvec![Effect::None];
    }
    enter_passenger_details(state, env)
}

fn book_now(state: &mut BookingFlowState, env: &FlowEnvironment) -> Effects {
    if !seat_map_editable(state) {
        return smallvec![Effect::None];
    }
    if state.selection.is_empty() {
        state.seat_step.error = Some(UserMessage::NoSeatsSelected);
        return smallvec![Effect::None];
    }
    state.seat_step.error = None;
    start_booking(state, env, FlowStep::SeatSelection)
}

// ============================================================================
// Passenger details and booking
// ============================================================================

fn update_passenger_form(state: &mut BookingFlowState, form: PassengerForm) -> Effects {
    if state.step != FlowStep::PassengerDetails {
        return smallvec![Effect::None];
    }

    // Typing wins over a late profile response
    if state.passenger_step.prefill_pending {
        state.passenger_step.prefill_pending = false;
        state.passenger_step.request = state.next_request();
    }
    state.passenger_step.form = form;
    smallvec![Effect::None]
}

fn profile_loaded(
    state: &mut BookingFlowState,
    env: &FlowEnvironment,
    request: u64,
    result: Result<ProfileData, BackendError>,
) -> Effects {
    if state.step != FlowStep::PassengerDetails || state.passenger_step.request != request {
        debug!(request, "Discarding stale profile response");
        return smallvec![Effect::None];
    }

    state.passenger_step.prefill_pending = false;
    let identity = env.identity().auth_state().profile;
    match result {
        Ok(profile) => state.passenger_step.form.prefill(Some(&profile), identity.as_ref()),
        Err(error) => {
            debug!(%error, "Profile unavailable; falling back to identity claims");
            state.passenger_step.form.prefill(None, identity.as_ref());
        },
    }

    smallvec![Effect::None]
}

fn submit_passenger(state: &mut BookingFlowState, env: &FlowEnvironment) -> Effects {
    if state.step != FlowStep::PassengerDetails || state.booking.is_some() {
        return smallvec![Effect::None];
    }

    match state.passenger_step.form.validate() {
        Err(errors) => {
            debug!("Passenger form rejected");
            state.passenger_step.errors = errors;
            smallvec![Effect::None]
        },
        Ok(details) => {
            state.passenger_step.errors = PassengerErrors::default();
            state.passenger_step.submit_error = None;
            state.passenger_details = Some(details);
            let mut effects = go_to(state, FlowStep::PaymentHandoff);
            effects.extend(start_booking(state, env, FlowStep::PassengerDetails));
            effects
        },
    }
}

fn booking_completed(
    state: &mut BookingFlowState,
    env: &FlowEnvironment,
    request: u64,
    result: Result<BookingCreated, BackendError>,
) -> Effects {
    let Some(attempt) = state.booking.filter(|attempt| attempt.request == request) else {
        debug!(request, "Discarding booking response for an abandoned request");
        return smallvec![Effect::None];
    };
    state.booking = None;

    let fallback = if attempt.origin == FlowStep::SeatSelection {
        UserMessage::QuickBookingFailed
    } else {
        UserMessage::BookingFailed
    };

    let outcome = result
        .map_err(|error| {
            warn!(%error, "Booking creation failed");
            UserMessage::from_backend_error(&error, fallback)
        })
        .and_then(|created| match created.payment_url.clone() {
            Some(url) if !url.trim().is_empty() => Ok((created, url)),
            _ => {
                warn!(booking_id = %created.booking_id, "Booking created without a payment URL");
                Err(UserMessage::MissingPaymentUrl)
            },
        });

    match outcome {
        Ok((created, payment_url)) => {
            if attempt.expired_in_flight {
                warn!(booking_id = %created.booking_id, "Reservation countdown ran out during booking; keeping the created booking");
            }
            info!(booking_id = %created.booking_id, order_id = %created.order_id, "Booking created");

            let mut effects = stop_timer(state);
            state.booking_id = Some(created.booking_id.clone());
            state.order_id = Some(created.order_id.clone());
            if state.passenger_details.is_some() {
                effects.extend(go_to(state, FlowStep::PaymentHandoff));
            }

            let handoff = PendingBookingHandoff {
                booking_id: created.booking_id,
                order_id: created.order_id,
            };
            effects.push(redirect_to_payment(env, handoff, payment_url));
            effects
        },
        Err(message) if attempt.expired_in_flight => {
            debug!(%message, "Booking failed after the countdown ran out");
            expire(state, env)
        },
        Err(message) => match attempt.origin {
            FlowStep::SeatSelection => {
                state.seat_step.error = Some(message);
                go_to(state, FlowStep::SeatSelection)
            },
            _ => {
                state.passenger_step.submit_error = Some(message);
                go_to(state, FlowStep::PassengerDetails)
            },
        },
    }
}

fn timer_ticked(state: &mut BookingFlowState, env: &FlowEnvironment, generation: u64) -> Effects {
    match state.timer.tick(generation) {
        TickOutcome::Running { .. } => smallvec![schedule_tick(env, generation)],
        TickOutcome::Ignored => smallvec![Effect::None],
        TickOutcome::Expired => {
            if let Some(attempt) = state.booking.as_mut() {
                warn!("Reservation countdown ran out with a booking request in flight");
                attempt.expired_in_flight = true;
                return smallvec![Effect::None];
            }
            expire(state, env)
        },
    }
}

// ============================================================================
// Navigation
// ============================================================================

fn back(state: &mut BookingFlowState, env: &FlowEnvironment) -> Effects {
    match state.step {
        FlowStep::Search => smallvec![Effect::None],
        FlowStep::Listing => go_to(state, FlowStep::Search),
        FlowStep::SeatSelection => {
            abandon_booking(state);
            let target = if state.listing.is_some() {
                FlowStep::Listing
            } else {
                FlowStep::Search
            };
            go_to(state, target)
        },
        FlowStep::PassengerDetails => enter_seat_selection(state, env),
        FlowStep::PaymentHandoff => {
            abandon_booking(state);
            enter_passenger_details(state, env)
        },
        FlowStep::Confirmation | FlowStep::PaymentCancelled => restart(state, env),
    }
}

fn navigate(state: &mut BookingFlowState, env: &FlowEnvironment, route: FlowRoute) -> Effects {
    let has_trip = state.selected_trip.is_some();
    let has_details = state.passenger_details.is_some();

    // Only the payment step keeps waiting for an in-flight booking
    if route != FlowRoute::PaymentHandoff {
        abandon_booking(state);
    }

    match route {
        FlowRoute::Search => go_to(state, FlowStep::Search),
        FlowRoute::Listing if state.listing.is_some() => go_to(state, FlowStep::Listing),
        FlowRoute::SeatSelection if has_trip => enter_seat_selection(state, env),
        FlowRoute::PassengerDetails if has_trip && !state.selection.is_empty() => {
            enter_passenger_details(state, env)
        },
        FlowRoute::PaymentHandoff if has_trip && has_details => {
            if state.booking.is_some() || state.payment_url.is_some() {
                go_to(state, FlowStep::PaymentHandoff)
            } else {
                enter_passenger_details(state, env)
            }
        },
        FlowRoute::Confirmation if has_trip && has_details => {
            state.confirmation = Some(ConfirmationView {
                booking_id: state.booking_id.clone(),
                order_id: state.order_id.clone(),
            });
            go_to(state, FlowStep::Confirmation)
        },
        FlowRoute::PaymentSuccess { order_id } => payment_succeeded(state, env, order_id),
        FlowRoute::PaymentCancel { order_id } => payment_cancelled(state, env, order_id),
        route => guard_redirect(state, &route),
    }
}

/// Return from the payment page after paying
///
/// Works without any in-memory flow state: the booking id comes from the
/// handoff record, which is consumed.
fn payment_succeeded(state: &mut BookingFlowState, env: &FlowEnvironment, order_id: Option<OrderId>) -> Effects {
    info!(order_id = ?order_id.as_ref().map(OrderId::as_str), "Returned from payment page");
    abandon_booking(state);
    state.confirmation = Some(ConfirmationView {
        booking_id: None,
        order_id,
    });

    let mut effects = go_to(state, FlowStep::Confirmation);
    effects.push(take_handoff(env));
    effects
}

/// Return from the payment page without paying; the order stays payable later
fn payment_cancelled(state: &mut BookingFlowState, env: &FlowEnvironment, order_id: Option<OrderId>) -> Effects {
    info!(order_id = ?order_id.as_ref().map(OrderId::as_str), "Payment cancelled");
    abandon_booking(state);
    state.cancelled_order_id = order_id;

    let mut effects = go_to(state, FlowStep::PaymentCancelled);
    effects.push(clear_handoff(env));
    effects
}

fn restart(state: &mut BookingFlowState, env: &FlowEnvironment) -> Effects {
    let mut effects = stop_timer(state);
    state.reset();
    effects.push(clear_handoff(env));
    effects
}
