//! Service implementations backed by the API gateway.

use super::{
    BookingCreated, BookingService, BookingSummary, OrderService, OrderSummary, PaymentSummary,
    ProfileService, SeatInventoryService, ServiceFuture, TripCatalog, TripPage,
};
use crate::passenger::ProfileData;
use crate::search::TripSearchQuery;
use crate::types::{
    BookingId, Money, OrderId, RawSeatStatus, SeatNumber, SeatRecord, Trip, TripId, VehicleType,
};
use bus_booking_backend::{
    BackendClient, BookingResponse, CreateBookingRequest, OrderResponse, PaymentListItemResponse,
    SeatResponse, SeatStatus, TripResponse, TripsQuery, UserResponse,
};
use chrono::{NaiveDate, NaiveTime};
use std::sync::Arc;

/// All backend services over one gateway client
#[derive(Clone, Debug)]
pub struct HttpServices {
    client: BackendClient,
}

impl HttpServices {
    /// Wrap a configured client
    #[must_use]
    pub const fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Shared handle usable as any of the service traits
    #[must_use]
    pub fn shared(client: BackendClient) -> Arc<Self> {
        Arc::new(Self::new(client))
    }
}

impl TripCatalog for HttpServices {
    fn search_trips(&self, query: TripSearchQuery, page: u32, size: u32) -> ServiceFuture<TripPage> {
        let client = self.client.clone();
        Box::pin(async move {
            let request = TripsQuery {
                from_city: query.origin_city().to_string(),
                to_city: query.destination_city().to_string(),
                date: query.travel_date().format("%Y-%m-%d").to_string(),
                page,
                size,
            };
            let response = client.get_trips(&request).await?;
            Ok(TripPage {
                trips: response.content.into_iter().map(trip_from_response).collect(),
                page: response.number,
                total_pages: response.total_pages,
                total_elements: response.total_elements,
            })
        })
    }
}

impl SeatInventoryService for HttpServices {
    fn load_seats(&self, trip_id: TripId) -> ServiceFuture<Vec<SeatRecord>> {
        let client = self.client.clone();
        Box::pin(async move {
            let seats = client.get_seats(trip_id.as_str()).await?;
            Ok(seats.iter().map(seat_from_response).collect())
        })
    }
}

impl BookingService for HttpServices {
    fn create_booking(&self, trip_id: TripId, seats: Vec<SeatNumber>) -> ServiceFuture<BookingCreated> {
        let client = self.client.clone();
        Box::pin(async move {
            let request = CreateBookingRequest::new(
                trip_id.as_str(),
                seats.into_iter().map(SeatNumber::get).collect(),
            );
            let response = client.create_booking(&request).await?;
            Ok(BookingCreated {
                booking_id: BookingId::new(response.booking_id),
                order_id: OrderId::new(response.order_id),
                payment_url: response.payment_url.filter(|url| !url.trim().is_empty()),
                reservation_expires_at: response.reservation_expires_at,
            })
        })
    }

    fn cancel_booking(&self, booking_id: BookingId) -> ServiceFuture<BookingSummary> {
        let client = self.client.clone();
        Box::pin(async move {
            let response = client.cancel_booking(booking_id.as_str()).await?;
            Ok(summary_from_response(response))
        })
    }

    fn my_bookings(&self, page: u32, size: u32) -> ServiceFuture<Vec<BookingSummary>> {
        let client = self.client.clone();
        Box::pin(async move {
            let response = client.my_bookings(page, size).await?;
            Ok(response.content.into_iter().map(summary_from_response).collect())
        })
    }
}

impl OrderService for HttpServices {
    fn my_orders(&self, page: u32, size: u32) -> ServiceFuture<Vec<OrderSummary>> {
        let client = self.client.clone();
        Box::pin(async move {
            let response = client.my_orders(page, size).await?;
            Ok(response.content.into_iter().map(order_from_response).collect())
        })
    }

    fn payments_for(&self, order_ids: Vec<OrderId>) -> ServiceFuture<Vec<PaymentSummary>> {
        let client = self.client.clone();
        Box::pin(async move {
            let ids: Vec<String> = order_ids.iter().map(|id| id.as_str().to_string()).collect();
            let payments = client.payments_by_order_ids(&ids).await?;
            Ok(payments.into_iter().map(payment_from_response).collect())
        })
    }
}

impl ProfileService for HttpServices {
    fn current_profile(&self) -> ServiceFuture<ProfileData> {
        let client = self.client.clone();
        Box::pin(async move { Ok(profile_from_response(client.current_user().await?)) })
    }
}

// ============================================================================
// Wire conversions
// ============================================================================

/// Split `2026-02-10T08:30:00` into its date and clock time
///
/// A missing or unparsable time reads as midnight.
fn split_date_time(raw: Option<&str>) -> (Option<NaiveDate>, NaiveTime) {
    let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
        return (None, NaiveTime::default());
    };

    let date = raw
        .get(..10)
        .and_then(|date| NaiveDate::parse_from_str(date, "%Y-%m-%d").ok());
    let time = raw
        .split_once('T')
        .map_or(raw, |(_, time)| time)
        .get(..5)
        .and_then(|time| NaiveTime::parse_from_str(time, "%H:%M").ok())
        .unwrap_or_default();

    (date, time)
}

fn trip_from_response(response: TripResponse) -> Trip {
    let (departure_date, departure_time) = split_date_time(response.departure_time.as_deref());
    let (arrival_date, arrival_time) = split_date_time(response.arrival_time.as_deref());
    let route = response.route.unwrap_or_default();
    let seats = response.total_seats.unwrap_or(0);

    Trip {
        id: TripId::new(response.id),
        origin: route.from_city,
        destination: route.to_city,
        departure_date,
        departure_time,
        arrival_date,
        arrival_time,
        price_per_seat: Money::from_byn(response.price),
        vehicle_type: VehicleType::from_bus_type(response.bus_type.as_deref()),
        available_seat_count: seats,
        total_seat_count: seats,
    }
}

fn seat_from_response(response: &SeatResponse) -> SeatRecord {
    let status = match response.status {
        SeatStatus::Available => RawSeatStatus::Available,
        SeatStatus::Reserved => RawSeatStatus::Reserved,
        SeatStatus::Sold => RawSeatStatus::Sold,
        SeatStatus::Cancelled => RawSeatStatus::Cancelled,
        SeatStatus::Unrecognized => RawSeatStatus::Unrecognized,
    };
    SeatRecord::new(response.seat_number, status)
}

fn summary_from_response(response: BookingResponse) -> BookingSummary {
    BookingSummary {
        id: BookingId::new(response.id),
        trip_id: TripId::new(response.trip_id),
        seats_count: response.seats_count,
        status: response.status,
        created_at: response.created_at,
    }
}

fn order_from_response(response: OrderResponse) -> OrderSummary {
    OrderSummary {
        id: OrderId::new(response.id),
        total_price: Money::from_byn(response.total_price),
        seats_count: response.seats_count,
        trip_id: response.trip_id.map(TripId::new),
        status: response.status,
        created_at: response.created_at,
    }
}

fn payment_from_response(response: PaymentListItemResponse) -> PaymentSummary {
    let currency = response.currency.trim().to_uppercase();
    PaymentSummary {
        order_id: OrderId::new(response.order_id),
        amount: Money::from_byn(response.amount),
        currency: if currency.is_empty() { "BYN".to_string() } else { currency },
        status: response.status,
        paid_at: response.paid_at,
    }
}

fn profile_from_response(response: UserResponse) -> ProfileData {
    ProfileData {
        first_name: response.first_name,
        last_name: response.last_name,
        phone: response.phone_number,
        email: response.email,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bus_booking_backend::{PaymentStatus, RouteSummary};

    #[test]
    fn test_split_date_time_reads_local_timestamp() {
        let (date, time) = split_date_time(Some("2026-02-10T08:30:00"));
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 2, 10));
        assert_eq!(time, NaiveTime::from_hms_opt(8, 30, 0).unwrap_or_default());
    }

    #[test]
    fn test_split_date_time_tolerates_garbage() {
        assert_eq!(split_date_time(None), (None, NaiveTime::default()));
        assert_eq!(split_date_time(Some("soon")), (None, NaiveTime::default()));
    }

    #[test]
    fn test_trip_conversion() {
        let trip = trip_from_response(TripResponse {
            id: "t1".to_string(),
            route: Some(RouteSummary {
                from_city: "Минск".to_string(),
                to_city: "Гродно".to_string(),
            }),
            departure_time: Some("2026-02-10T22:15:00".to_string()),
            arrival_time: Some("2026-02-11T02:45:00".to_string()),
            price: 30.0,
            bus_type: Some("MINIBUS".to_string()),
            total_seats: Some(18),
        });

        assert_eq!(trip.origin, "Минск");
        assert_eq!(trip.vehicle_type, VehicleType::Minibus);
        assert_eq!(trip.price_per_seat, Money::from_kopecks(3000));
        assert_eq!(trip.duration_minutes(), 270);
        assert_eq!(trip.available_seat_count, 18);
    }

    #[test]
    fn test_payment_currency_defaults_to_byn() {
        let payment = payment_from_response(PaymentListItemResponse {
            id: "p1".to_string(),
            order_id: "o1".to_string(),
            amount: 51.0,
            currency: " ".to_string(),
            status: PaymentStatus::Succeeded,
            created_at: None,
            paid_at: None,
        });
        assert_eq!(payment.currency, "BYN");
        assert_eq!(payment.amount, Money::from_kopecks(5100));

        let payment = payment_from_response(PaymentListItemResponse {
            id: "p2".to_string(),
            order_id: "o2".to_string(),
            amount: 10.0,
            currency: "usd".to_string(),
            status: PaymentStatus::Pending,
            created_at: None,
            paid_at: None,
        });
        assert_eq!(payment.currency, "USD");
    }

    #[test]
    fn test_seat_status_mapping_keeps_unknown_statuses() {
        let record = seat_from_response(&SeatResponse {
            id: "s".to_string(),
            seat_number: 7,
            status: SeatStatus::Unrecognized,
        });
        assert_eq!(record, SeatRecord::new(7, RawSeatStatus::Unrecognized));
    }
}
