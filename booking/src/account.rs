//! Booking and order history of the signed-in passenger.
//!
//! Loads `GET /booking/me`, filters by status with per-status counts, and
//! cancels bookings that are still pending or confirmed. Orders are listed
//! with the payment made for each of them.

use crate::flow::Loadable;
use crate::messages::UserMessage;
use crate::services::{
    BookingService, BookingStatus, BookingSummary, OrderService, OrderSummary, PaymentStatus,
    PaymentSummary,
};
use crate::types::{BookingId, OrderId};
use bus_booking_backend::BackendError;
use bus_booking_core::{effect::Effect, reducer::Reducer};
use bus_booking_runtime::Store;
use smallvec::{smallvec, SmallVec};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Page size used for the history screen
pub const HISTORY_PAGE_SIZE: u32 = 50;

/// Status filter of the history screen
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Every booking
    #[default]
    All,
    /// Paid bookings
    Confirmed,
    /// Awaiting payment
    Pending,
    /// Cancelled bookings
    Cancelled,
}

impl StatusFilter {
    /// Whether a booking passes the filter
    #[must_use]
    pub fn accepts(self, booking: &BookingSummary) -> bool {
        match self {
            Self::All => true,
            Self::Confirmed => booking.status == BookingStatus::Confirmed,
            Self::Pending => booking.status == BookingStatus::Pending,
            Self::Cancelled => booking.status == BookingStatus::Cancelled,
        }
    }
}

/// Number of bookings per filter tab
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatusCounts {
    /// All bookings
    pub all: usize,
    /// Confirmed bookings
    pub confirmed: usize,
    /// Pending bookings
    pub pending: usize,
    /// Cancelled bookings
    pub cancelled: usize,
}

/// An order with the payment made for it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderHistoryEntry {
    /// The order
    pub order: OrderSummary,
    /// Its payment, if one was started
    pub payment: Option<PaymentSummary>,
}

impl OrderHistoryEntry {
    /// Pair every order with the last payment listed for it
    #[must_use]
    pub fn join(orders: Vec<OrderSummary>, payments: &[PaymentSummary]) -> Vec<Self> {
        orders
            .into_iter()
            .map(|order| {
                let payment = payments.iter().rev().find(|payment| payment.order_id == order.id).cloned();
                Self { order, payment }
            })
            .collect()
    }

    /// Amount charged, falling back to the order total
    #[must_use]
    pub fn amount_text(&self) -> String {
        self.payment.as_ref().map_or_else(
            || self.order.total_price.to_string(),
            |payment| payment.amount.display_in(&payment.currency),
        )
    }

    /// Payment state when there is a payment, else the order state
    #[must_use]
    pub const fn status_label(&self) -> &'static str {
        match &self.payment {
            Some(payment) => match payment.status {
                PaymentStatus::Pending => "Платёж в обработке",
                PaymentStatus::Succeeded => "Оплачен",
                PaymentStatus::Failed => "Ошибка оплаты",
                PaymentStatus::Cancelled => "Платёж отменён",
                PaymentStatus::Unrecognized => "Неизвестно",
            },
            None => match self.order.status {
                BookingStatus::Pending => "Ожидает оплаты",
                BookingStatus::Confirmed => "Подтверждён",
                BookingStatus::Cancelled => "Отменён",
                BookingStatus::Expired => "Истёк",
            },
        }
    }
}

/// History screen state
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountState {
    /// Loaded bookings in backend order
    pub bookings: Loadable<Vec<BookingSummary>>,
    /// Orders with their payments, in backend order
    pub orders: Loadable<Vec<OrderHistoryEntry>>,
    /// Active filter
    pub filter: StatusFilter,
    /// Bookings with a cancel request in flight
    pub cancelling: BTreeSet<String>,
    /// Failure of the last cancel
    pub error: Option<UserMessage>,
}

impl AccountState {
    /// Bookings passing the active filter
    #[must_use]
    pub fn visible(&self) -> Vec<&BookingSummary> {
        self.bookings
            .loaded()
            .map(|bookings| bookings.iter().filter(|booking| self.filter.accepts(booking)).collect())
            .unwrap_or_default()
    }

    /// Counts for every filter tab
    #[must_use]
    pub fn counts(&self) -> StatusCounts {
        let Some(bookings) = self.bookings.loaded() else {
            return StatusCounts::default();
        };

        let count = |filter: StatusFilter| bookings.iter().filter(|booking| filter.accepts(booking)).count();
        StatusCounts {
            all: bookings.len(),
            confirmed: count(StatusFilter::Confirmed),
            pending: count(StatusFilter::Pending),
            cancelled: count(StatusFilter::Cancelled),
        }
    }

    fn booking(&self, id: &BookingId) -> Option<&BookingSummary> {
        self.bookings.loaded()?.iter().find(|booking| &booking.id == id)
    }
}

/// Actions of the history screen
#[derive(Clone, Debug)]
pub enum AccountAction {
    /// Load the history
    Load,
    /// History response
    Loaded {
        /// Bookings or failure
        result: Result<Vec<BookingSummary>, BackendError>,
    },
    /// Switch filter tab
    SetFilter {
        /// New filter
        filter: StatusFilter,
    },
    /// Cancel one booking
    CancelBooking {
        /// Booking to cancel
        booking_id: BookingId,
    },
    /// Cancel response
    CancelCompleted {
        /// Booking the request was for
        booking_id: BookingId,
        /// Updated booking or failure
        result: Result<BookingSummary, BackendError>,
    },
    /// Load orders and their payments
    LoadOrders,
    /// Orders response, already joined with payments
    OrdersLoaded {
        /// Orders or the first failure
        result: Result<Vec<OrderHistoryEntry>, BackendError>,
    },
}

/// Dependencies of [`AccountReducer`]
#[derive(Clone)]
pub struct AccountEnvironment {
    bookings: Arc<dyn BookingService>,
    orders: Arc<dyn OrderService>,
    page_size: u32,
}

impl AccountEnvironment {
    /// Environment over the booking and order services
    #[must_use]
    pub fn new(bookings: Arc<dyn BookingService>, orders: Arc<dyn OrderService>) -> Self {
        Self {
            bookings,
            orders,
            page_size: HISTORY_PAGE_SIZE,
        }
    }
}

/// Orders, then the payments for them
async fn fetch_order_history(
    orders: Arc<dyn OrderService>,
    size: u32,
) -> Result<Vec<OrderHistoryEntry>, BackendError> {
    let list = orders.my_orders(0, size).await?;
    let ids: Vec<OrderId> = list.iter().map(|order| order.id.clone()).collect();
    let payments = orders.payments_for(ids).await?;
    Ok(OrderHistoryEntry::join(list, &payments))
}

/// Store running the history screen
pub type AccountStore = Store<AccountState, AccountAction, AccountEnvironment, AccountReducer>;

/// Create a history store with nothing loaded
#[must_use]
pub fn account_store(env: AccountEnvironment) -> AccountStore {
    Store::new(AccountState::default(), AccountReducer::new(), env)
}

/// Reducer for the booking history screen
pub struct AccountReducer;

impl AccountReducer {
    /// Create a new account reducer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Default for AccountReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for AccountReducer {
    type State = AccountState;
    type Action = AccountAction;
    type Environment = AccountEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            AccountAction::Load => {
                if state.bookings.is_loading() {
                    return smallvec![Effect::None];
                }
                state.bookings = Loadable::Loading;

                let bookings = Arc::clone(&env.bookings);
                let size = env.page_size;
                smallvec![Effect::Future(Box::pin(async move {
                    let result = bookings.my_bookings(0, size).await;
                    Some(AccountAction::Loaded { result })
                }))]
            },

            AccountAction::Loaded { result } => {
                state.bookings = match result {
                    Ok(bookings) => {
                        debug!(count = bookings.len(), "Booking history loaded");
                        Loadable::Loaded(bookings)
                    },
                    Err(error) => {
                        warn!(%error, "Booking history failed");
                        Loadable::Failed(UserMessage::from_backend_error(
                            &error,
                            UserMessage::BookingsLoadFailed,
                        ))
                    },
                };
                smallvec![Effect::None]
            },

            AccountAction::SetFilter { filter } => {
                state.filter = filter;
                smallvec![Effect::None]
            },

            AccountAction::CancelBooking { booking_id } => {
                let cancellable = state
                    .booking(&booking_id)
                    .is_some_and(|booking| booking.status.can_cancel());
                if !cancellable || state.cancelling.contains(booking_id.as_str()) {
                    debug!(%booking_id, "Cancel ignored");
                    return smallvec![Effect::None];
                }

                state.error = None;
                state.cancelling.insert(booking_id.as_str().to_string());

                let bookings = Arc::clone(&env.bookings);
                smallvec![Effect::Future(Box::pin(async move {
                    let result = bookings.cancel_booking(booking_id.clone()).await;
                    Some(AccountAction::CancelCompleted { booking_id, result })
                }))]
            },

            AccountAction::CancelCompleted { booking_id, result } => {
                state.cancelling.remove(booking_id.as_str());
                match result {
                    Ok(_) => {
                        info!(%booking_id, "Booking cancelled");
                        if let Loadable::Loaded(bookings) = &mut state.bookings {
                            if let Some(booking) = bookings.iter_mut().find(|booking| booking.id == booking_id) {
                                booking.status = BookingStatus::Cancelled;
                            }
                        }
                    },
                    Err(error) => {
                        warn!(%error, %booking_id, "Booking cancel failed");
                        state.error = Some(UserMessage::from_backend_error(&error, UserMessage::Generic));
                    },
                }
                smallvec![Effect::None]
            },

            AccountAction::LoadOrders => {
                if state.orders.is_loading() {
                    return smallvec![Effect::None];
                }
                state.orders = Loadable::Loading;

                let orders = Arc::clone(&env.orders);
                let size = env.page_size;
                smallvec![Effect::Future(Box::pin(async move {
                    let result = fetch_order_history(orders, size).await;
                    Some(AccountAction::OrdersLoaded { result })
                }))]
            },

            AccountAction::OrdersLoaded { result } => {
                state.orders = match result {
                    Ok(entries) => {
                        debug!(count = entries.len(), "Order history loaded");
                        Loadable::Loaded(entries)
                    },
                    Err(error) => {
                        warn!(%error, "Order history failed");
                        Loadable::Failed(UserMessage::OrderHistoryLoadFailed)
                    },
                };
                smallvec![Effect::None]
            },
        }
    }
}
