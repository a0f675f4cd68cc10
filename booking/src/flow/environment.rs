//! Dependencies of the booking flow reducer.

use crate::handoff::HandoffStore;
use crate::services::{
    BookingService, IdentityProvider, PaymentRedirect, ProfileService, SeatInventoryService,
    TripCatalog,
};
use bus_booking_core::environment::Clock;
use std::sync::Arc;
use std::time::Duration;

/// Tunables of the flow
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowSettings {
    /// Length of the reservation countdown
    pub reservation_minutes: u32,
    /// Listing page size
    pub page_size: u32,
    /// Interval between countdown ticks
    pub tick_interval: Duration,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            reservation_minutes: 15,
            page_size: 10,
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Collaborators injected into [`super::FlowReducer`]
///
/// Production wires the HTTP services and the file-backed handoff store;
/// tests use `MockBackend` and `InMemoryHandoffStore`.
#[derive(Clone)]
pub struct FlowEnvironment {
    trips: Arc<dyn TripCatalog>,
    seats: Arc<dyn SeatInventoryService>,
    bookings: Arc<dyn BookingService>,
    profiles: Arc<dyn ProfileService>,
    identity: Arc<dyn IdentityProvider>,
    handoff: Arc<dyn HandoffStore>,
    redirect: Arc<dyn PaymentRedirect>,
    clock: Arc<dyn Clock>,
    settings: FlowSettings,
}

impl FlowEnvironment {
    /// Build an environment around one backend implementing every service
    #[must_use]
    pub fn new<B>(
        backend: Arc<B>,
        identity: Arc<dyn IdentityProvider>,
        handoff: Arc<dyn HandoffStore>,
        redirect: Arc<dyn PaymentRedirect>,
        clock: Arc<dyn Clock>,
    ) -> Self
    where
        B: TripCatalog + SeatInventoryService + BookingService + ProfileService + 'static,
    {
        Self {
            trips: Arc::clone(&backend) as Arc<dyn TripCatalog>,
            seats: Arc::clone(&backend) as Arc<dyn SeatInventoryService>,
            bookings: Arc::clone(&backend) as Arc<dyn BookingService>,
            profiles: backend as Arc<dyn ProfileService>,
            identity,
            handoff,
            redirect,
            clock,
            settings: FlowSettings::default(),
        }
    }

    /// Replace the tunables
    #[must_use]
    pub const fn with_settings(mut self, settings: FlowSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Trip listing
    #[must_use]
    pub fn trips(&self) -> Arc<dyn TripCatalog> {
        Arc::clone(&self.trips)
    }

    /// Seat inventory
    #[must_use]
    pub fn seats(&self) -> Arc<dyn SeatInventoryService> {
        Arc::clone(&self.seats)
    }

    /// Booking service
    #[must_use]
    pub fn bookings(&self) -> Arc<dyn BookingService> {
        Arc::clone(&self.bookings)
    }

    /// Profile service
    #[must_use]
    pub fn profiles(&self) -> Arc<dyn ProfileService> {
        Arc::clone(&self.profiles)
    }

    /// Identity provider
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    /// Handoff storage
    #[must_use]
    pub fn handoff(&self) -> Arc<dyn HandoffStore> {
        Arc::clone(&self.handoff)
    }

    /// Payment page redirect
    #[must_use]
    pub fn redirect(&self) -> Arc<dyn PaymentRedirect> {
        Arc::clone(&self.redirect)
    }

    /// Clock for timestamps
    #[must_use]
    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Tunables
    #[must_use]
    pub const fn settings(&self) -> &FlowSettings {
        &self.settings
    }
}
