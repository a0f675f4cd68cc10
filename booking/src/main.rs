//! Command-line booking client.
//!
//! Drives the booking flow store against the API gateway: search trips, show
//! a seat map, book seats and print the payment link, then resolve the
//! payment page's return URL.

use anyhow::{bail, Context};
use bus_booking::account::{account_store, AccountAction, AccountEnvironment, AccountStore, StatusFilter};
use bus_booking::flow::{flow_store, FlowAction, FlowEnvironment, FlowStep, FlowStore, Loadable};
use bus_booking::handoff::FileHandoffStore;
use bus_booking::passenger::PassengerForm;
use bus_booking::routes::FlowRoute;
use bus_booking::services::http::HttpServices;
use bus_booking::services::{BookingService, OrderService, PaymentRedirect, StaticIdentity};
use bus_booking::types::{BookingId, DisplayStatus, SeatNumber, TripId};
use bus_booking::Config;
use bus_booking_backend::BackendClient;
use bus_booking_core::environment::SystemClock;
use bus_booking_runtime::Store;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const IDLE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "bus-booking", version, about = "Book intercity bus tickets")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List trips for a route and date
    Search {
        #[command(flatten)]
        route: RouteArgs,
        /// One-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show the seat map of a trip
    Seats {
        #[command(flatten)]
        route: RouteArgs,
        /// Trip id from the listing
        #[arg(long)]
        trip: String,
    },
    /// Book seats and print the payment link
    Book {
        #[command(flatten)]
        route: RouteArgs,
        /// Trip id from the listing
        #[arg(long)]
        trip: String,
        /// Seat numbers, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        seats: Vec<u32>,
        #[command(flatten)]
        passenger: PassengerArgs,
        /// Book straight from the seat map without passenger data
        #[arg(long)]
        quick: bool,
    },
    /// Resolve the URL the payment page returned to
    Return {
        /// `/payment/success?orderId=..` or `/payment/cancel?orderId=..`
        url: String,
    },
    /// List your bookings
    Bookings {
        /// Only bookings with this status
        #[arg(long, value_enum, default_value_t = HistoryFilter::All)]
        status: HistoryFilter,
    },
    /// List your orders with their payment status
    Orders,
    /// Cancel a pending or confirmed booking
    Cancel {
        /// Booking id
        booking_id: String,
    },
}

#[derive(Args)]
struct RouteArgs {
    /// Origin city
    #[arg(long)]
    from: String,
    /// Destination city
    #[arg(long)]
    to: String,
    /// Travel date, YYYY-MM-DD
    #[arg(long)]
    date: String,
}

#[derive(Args)]
struct PassengerArgs {
    /// Given name
    #[arg(long)]
    first_name: Option<String>,
    /// Family name
    #[arg(long)]
    last_name: Option<String>,
    /// Phone number
    #[arg(long)]
    phone: Option<String>,
    /// Email address
    #[arg(long)]
    email: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum HistoryFilter {
    All,
    Confirmed,
    Pending,
    Cancelled,
}

impl From<HistoryFilter> for StatusFilter {
    fn from(filter: HistoryFilter) -> Self {
        match filter {
            HistoryFilter::All => Self::All,
            HistoryFilter::Confirmed => Self::Confirmed,
            HistoryFilter::Pending => Self::Pending,
            HistoryFilter::Cancelled => Self::Cancelled,
        }
    }
}

/// Prints the payment link instead of opening a browser
struct ConsoleRedirect;

impl PaymentRedirect for ConsoleRedirect {
    fn redirect(&self, payment_url: &str) {
        info!(%payment_url, "Handing off to payment page");
        println!("Перейдите к оплате: {payment_url}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bus_booking=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = Config::from_env();
    config.validate()?;
    debug!(api_url = %config.api.base_url, "Configuration loaded");

    let mut client = BackendClient::with_timeout(&config.api.base_url, config.http_timeout())?;
    if let Some(token) = &config.api.access_token {
        client = client.with_access_token(token.clone());
    }
    let services = HttpServices::shared(client);

    match cli.command {
        Command::Search { route, page } => {
            let store = build_flow(&config, &services);
            search(&store, &route).await?;
            if page > 1 {
                settle(&store, FlowAction::ChangePage { page: page - 1 }).await?;
            }
            print_listing(&store).await?;
            wait_idle(&store).await?;
        },
        Command::Seats { route, trip } => {
            let store = build_flow(&config, &services);
            search(&store, &route).await?;
            select_trip(&store, trip).await?;
            print_seat_map(&store).await;
            wait_idle(&store).await?;
        },
        Command::Book {
            route,
            trip,
            seats,
            passenger,
            quick,
        } => {
            let store = build_flow(&config, &services);
            search(&store, &route).await?;
            select_trip(&store, trip).await?;
            for seat in &seats {
                settle(&store, FlowAction::ToggleSeat {
                    seat: SeatNumber::new(*seat),
                })
                .await?;
            }
            let selected = store.state(bus_booking::BookingFlowState::selected_seats).await;
            if let Some(seat) = seats.iter().find(|seat| !selected.contains(&SeatNumber::new(**seat))) {
                bail!("место {seat} недоступно");
            }
            if quick {
                quick_book(&store).await?;
            } else {
                book(&store, passenger).await?;
            }
            // Lets the handoff write and the redirect finish
            wait_idle(&store).await?;
        },
        Command::Return { url } => {
            let store = build_flow(&config, &services);
            resolve_return(&store, &url).await?;
            wait_idle(&store).await?;
        },
        Command::Bookings { status } => {
            require_token(&config)?;
            let store = build_account(&services);
            settle(&store, AccountAction::Load).await?;
            settle(&store, AccountAction::SetFilter { filter: status.into() }).await?;
            print_history(&store).await?;
        },
        Command::Orders => {
            require_token(&config)?;
            let store = build_account(&services);
            settle(&store, AccountAction::LoadOrders).await?;
            print_orders(&store).await?;
        },
        Command::Cancel { booking_id } => {
            require_token(&config)?;
            let store = build_account(&services);
            settle(&store, AccountAction::Load).await?;

            let cancellable = store
                .state(|s| {
                    s.visible()
                        .iter()
                        .any(|b| b.id.as_str() == booking_id && b.status.can_cancel())
                })
                .await;
            if !cancellable {
                bail!("бронирование {booking_id} нельзя отменить");
            }

            settle(&store, AccountAction::CancelBooking {
                booking_id: BookingId::new(booking_id.clone()),
            })
            .await?;
            if let Some(error) = store.state(|s| s.error.clone()).await {
                bail!("{error}");
            }
            println!("Бронирование {booking_id} отменено");
        },
    }

    Ok(())
}

fn build_flow(config: &Config, services: &Arc<HttpServices>) -> FlowStore {
    let identity = config.api.access_token.clone().map_or_else(StaticIdentity::anonymous, |token| {
        StaticIdentity::signed_in(token, None)
    });

    let env = FlowEnvironment::new(
        Arc::clone(services),
        Arc::new(identity),
        Arc::new(FileHandoffStore::new(config.booking.handoff_path.clone())),
        Arc::new(ConsoleRedirect),
        Arc::new(SystemClock),
    )
    .with_settings(config.flow_settings());

    flow_store(env)
}

fn build_account(services: &Arc<HttpServices>) -> AccountStore {
    let bookings: Arc<dyn BookingService> = services.clone();
    let orders: Arc<dyn OrderService> = services.clone();
    account_store(AccountEnvironment::new(bookings, orders))
}

fn require_token(config: &Config) -> anyhow::Result<()> {
    if config.api.access_token.is_none() {
        bail!("войдите в аккаунт: задайте BUS_BOOKING_ACCESS_TOKEN");
    }
    Ok(())
}

/// Send an action and wait until every effect it started has been reduced
async fn settle<S, A, E, R>(store: &Store<S, A, E, R>, action: A) -> anyhow::Result<()>
where
    R: bus_booking_core::reducer::Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    S: Send + Sync + 'static,
    A: Send + Clone + 'static,
    E: Send + Sync + 'static,
{
    let mut handle = store.send(action).await?;
    handle.wait().await;
    Ok(())
}

/// Wait until the flow has no running effect
async fn wait_idle(store: &FlowStore) -> anyhow::Result<()> {
    tokio::time::timeout(IDLE_TIMEOUT, async {
        while store.pending_effects() > 0 {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .context("фоновые операции не завершились")
}

async fn search(store: &FlowStore, route: &RouteArgs) -> anyhow::Result<()> {
    settle(store, FlowAction::SubmitSearch {
        origin: route.from.clone(),
        destination: route.to.clone(),
        date: route.date.clone(),
    })
    .await?;

    let (search_error, failure) = store
        .state(|s| {
            let failure = s.listing.as_ref().and_then(|listing| match &listing.trips {
                Loadable::Failed(message) => Some(message.clone()),
                _ => None,
            });
            (s.search_error.clone(), failure)
        })
        .await;
    if let Some(error) = search_error.or(failure) {
        bail!("{error}");
    }
    Ok(())
}

async fn select_trip(store: &FlowStore, trip: String) -> anyhow::Result<()> {
    let trip_id = TripId::new(trip);
    let known = store
        .state(|s| s.listing.as_ref().is_some_and(|listing| listing.trip(&trip_id).is_some()))
        .await;
    if !known {
        bail!("рейс {trip_id} не найден в результатах поиска");
    }

    settle(store, FlowAction::SelectTrip { trip_id }).await?;

    let failure = store
        .state(|s| match &s.seat_step.inventory {
            Loadable::Failed(message) => Some(message.clone()),
            _ => None,
        })
        .await;
    if let Some(error) = failure {
        bail!("{error}");
    }
    Ok(())
}

async fn book(store: &FlowStore, passenger: PassengerArgs) -> anyhow::Result<()> {
    settle(store, FlowAction::ConfirmSeats).await?;

    let (step, seat_error, prefilled) = store
        .state(|s| (s.step, s.seat_step.error.clone(), s.passenger_step.form.clone()))
        .await;
    if step != FlowStep::PassengerDetails {
        bail!("{}", seat_error.map_or_else(|| "выбор мест не принят".to_string(), |e| e.to_string()));
    }

    let form = PassengerForm {
        first_name: passenger.first_name.unwrap_or(prefilled.first_name),
        last_name: passenger.last_name.unwrap_or(prefilled.last_name),
        phone: passenger.phone.unwrap_or(prefilled.phone),
        email: passenger.email.unwrap_or(prefilled.email),
    };
    settle(store, FlowAction::UpdatePassengerForm { form }).await?;
    settle(store, FlowAction::SubmitPassenger).await?;

    let (errors, submit_error, booking_id, total, timer) = store
        .state(|s| {
            (
                s.passenger_step.errors.clone(),
                s.passenger_step.submit_error.clone(),
                s.booking_id.clone(),
                s.total_price(),
                s.timer.display(),
            )
        })
        .await;

    if !errors.is_empty() {
        let fields: Vec<String> = [errors.first_name, errors.last_name, errors.phone]
            .into_iter()
            .flatten()
            .map(|error| error.to_string())
            .collect();
        bail!("{}", fields.join("; "));
    }
    if let Some(error) = submit_error {
        bail!("{error}");
    }
    let booking_id = booking_id.context("бронирование не создано")?;

    println!("Бронирование {booking_id} создано, к оплате {total}. Оплатите в течение {timer}.");
    Ok(())
}

async fn quick_book(store: &FlowStore) -> anyhow::Result<()> {
    settle(store, FlowAction::BookNow).await?;

    let (error, booking_id, total) = store
        .state(|s| (s.seat_step.error.clone(), s.booking_id.clone(), s.total_price()))
        .await;
    if let Some(error) = error {
        bail!("{error}");
    }
    let booking_id = booking_id.context("бронирование не создано")?;

    println!("Бронирование {booking_id} создано, к оплате {total}.");
    Ok(())
}

async fn resolve_return(store: &FlowStore, url: &str) -> anyhow::Result<()> {
    let route = FlowRoute::parse(url)?;
    if !matches!(route, FlowRoute::PaymentSuccess { .. } | FlowRoute::PaymentCancel { .. }) {
        bail!("{url} не является адресом возврата с оплаты");
    }

    settle(store, FlowAction::Navigate { route }).await?;

    let (step, confirmation, cancelled) = store
        .state(|s| (s.step, s.confirmation.clone(), s.cancelled_order_id.clone()))
        .await;
    match (step, confirmation) {
        (FlowStep::Confirmation, Some(view)) => {
            println!("Оплата прошла успешно.");
            if let Some(booking_id) = view.booking_id {
                println!("Номер бронирования: {booking_id}");
            }
            if let Some(order_id) = view.order_id {
                println!("Номер заказа: {order_id}");
            }
        },
        _ => {
            println!("Оплата отменена. Места будут освобождены.");
            if let Some(order_id) = cancelled {
                println!("Номер заказа: {order_id}");
            }
        },
    }
    Ok(())
}

async fn print_listing(store: &FlowStore) -> anyhow::Result<()> {
    let (trips, page, total_pages, total) = store
        .state(|s| {
            s.listing.as_ref().map_or((Vec::new(), 0, 0, 0), |listing| {
                (listing.visible_trips(), listing.page, listing.total_pages, listing.total_elements)
            })
        })
        .await;

    if trips.is_empty() {
        println!("Рейсы не найдены.");
        return Ok(());
    }

    println!("Найдено рейсов: {total} (страница {} из {total_pages})", page + 1);
    for trip in trips {
        println!(
            "{:<12} {}-{} ({})  {}  мест: {}",
            trip.id,
            trip.departure_time.format("%H:%M"),
            trip.arrival_time.format("%H:%M"),
            trip.duration_display(),
            trip.price_per_seat,
            trip.available_seat_count,
        );
    }
    Ok(())
}

async fn print_seat_map(store: &FlowStore) {
    let seats = store.state(bus_booking::BookingFlowState::seat_map).await;
    let line: Vec<String> = seats
        .into_iter()
        .map(|(seat, status)| {
            let mark = match status {
                DisplayStatus::Available => ' ',
                DisplayStatus::Selected => '*',
                DisplayStatus::Occupied => 'x',
                DisplayStatus::Blocked => '#',
            };
            format!("[{seat:>2}{mark}]")
        })
        .collect();

    for row in line.chunks(4) {
        println!("{}", row.join(" "));
    }
    println!("*: выбрано, x: занято, #: недоступно");
}

async fn print_history(store: &AccountStore) -> anyhow::Result<()> {
    let (failure, counts, rows) = store
        .state(|s| {
            let failure = match &s.bookings {
                Loadable::Failed(message) => Some(message.clone()),
                _ => None,
            };
            let rows: Vec<String> = s
                .visible()
                .iter()
                .map(|b| format!("{:<12} рейс {:<12} мест: {}  {:?}", b.id, b.trip_id, b.seats_count, b.status))
                .collect();
            (failure, s.counts(), rows)
        })
        .await;

    if let Some(error) = failure {
        bail!("{error}");
    }

    println!(
        "Все: {}  Подтверждены: {}  Ожидают оплаты: {}  Отменены: {}",
        counts.all, counts.confirmed, counts.pending, counts.cancelled
    );
    for row in rows {
        println!("{row}");
    }
    Ok(())
}

async fn print_orders(store: &AccountStore) -> anyhow::Result<()> {
    let rows = store
        .state(|s| match &s.orders {
            Loadable::Failed(message) => Err(message.clone()),
            other => Ok(other
                .loaded()
                .map(|entries| {
                    entries
                        .iter()
                        .map(|e| {
                            format!(
                                "{:<12} мест: {}  {:>12}  {}",
                                e.order.id,
                                e.order.seats_count,
                                e.amount_text(),
                                e.status_label()
                            )
                        })
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default()),
        })
        .await;

    let rows = match rows {
        Ok(rows) => rows,
        Err(error) => bail!("{error}"),
    };
    if rows.is_empty() {
        println!("Заказов пока нет");
    }
    for row in rows {
        println!("{row}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_orders_subcommand_parses() {
        let cli = Cli::try_parse_from(["bus-booking", "orders"]).unwrap();
        assert!(matches!(cli.command, Command::Orders));
    }

    #[tokio::test]
    async fn test_account_store_reports_unreachable_order_history() {
        let services = HttpServices::shared(BackendClient::new("http://127.0.0.1:9"));
        let store = build_account(&services);

        settle(&store, AccountAction::LoadOrders).await.unwrap();

        let error = print_orders(&store).await.unwrap_err();
        assert_eq!(
            error.to_string(),
            bus_booking::UserMessage::OrderHistoryLoadFailed.to_string()
        );
    }
}
