//! API gateway client implementation

use crate::{
    error::BackendError,
    types::{
        BookingResponse, CreateBookingRequest, CreateBookingResponse, OrderResponse,
        PageResponse, PaymentListItemResponse, SeatResponse, TripResponse, TripsQuery,
        UserResponse,
    },
};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Path prefixes served without authentication
const PUBLIC_PATHS: [&str; 3] = ["/routes", "/trips", "/inventory"];

/// API gateway client
#[derive(Clone, Debug)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl BackendClient {
    /// Create a new client for the gateway at `base_url`
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            access_token: None,
        }
    }

    /// Create a client whose requests time out after `timeout`
    ///
    /// # Errors
    ///
    /// Returns `BackendError::RequestFailed` if the HTTP client cannot be built
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?;

        Ok(Self {
            client,
            ..Self::new(base_url)
        })
    }

    /// Attach a bearer token to non-public requests
    #[must_use]
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        let token = token.into();
        self.access_token = (!token.trim().is_empty()).then_some(token);
        self
    }

    /// Gateway base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether a bearer token is configured
    #[must_use]
    pub const fn has_access_token(&self) -> bool {
        self.access_token.is_some()
    }

    fn is_public_path(path: &str) -> bool {
        PUBLIC_PATHS.iter().any(|public| path.starts_with(public))
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{path}", self.base_url))
            .header("content-type", "application/json");

        match &self.access_token {
            Some(token) if !Self::is_public_path(path) => builder.bearer_auth(token),
            _ => builder,
        }
    }

    async fn execute<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, BackendError> {
        let response = builder
            .send()
            .await
            .map_err(|e| BackendError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| BackendError::ResponseParseFailed(e.to_string()));
        }

        let body = response.text().await.unwrap_or_default();
        tracing::debug!(status = status.as_u16(), "Gateway returned an error status");
        Err(BackendError::from_response(status.as_u16(), &body))
    }

    /// Search trips (`GET /trips`)
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn get_trips(&self, query: &TripsQuery) -> Result<PageResponse<TripResponse>, BackendError> {
        self.execute(self.request(Method::GET, "/trips").query(query)).await
    }

    /// Seats of one trip (`GET /inventory/trips/{id}/seats`)
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn get_seats(&self, trip_id: &str) -> Result<Vec<SeatResponse>, BackendError> {
        self.execute(self.request(Method::GET, &format!("/inventory/trips/{trip_id}/seats")))
            .await
    }

    /// Create a booking (`POST /booking`)
    ///
    /// Sent exactly once; the caller decides whether to try again.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn create_booking(
        &self,
        request: &CreateBookingRequest,
    ) -> Result<CreateBookingResponse, BackendError> {
        self.execute(self.request(Method::POST, "/booking").json(request))
            .await
    }

    /// Bookings of the signed-in user (`GET /booking/me`)
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn my_bookings(&self, page: u32, size: u32) -> Result<PageResponse<BookingResponse>, BackendError> {
        self.execute(
            self.request(Method::GET, "/booking/me")
                .query(&[("page", page), ("size", size)]),
        )
        .await
    }

    /// Cancel a booking (`DELETE /booking/cancel/{id}`)
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn cancel_booking(&self, booking_id: &str) -> Result<BookingResponse, BackendError> {
        self.execute(self.request(Method::DELETE, &format!("/booking/cancel/{booking_id}")))
            .await
    }

    /// Orders of the signed-in user (`GET /orders/me`)
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn my_orders(&self, page: u32, size: u32) -> Result<PageResponse<OrderResponse>, BackendError> {
        self.execute(
            self.request(Method::GET, "/orders/me")
                .query(&[("page", page), ("size", size)]),
        )
        .await
    }

    /// Payments for the given orders (`GET /payments?orderIds=..`)
    ///
    /// An empty id list returns an empty result without a request.
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn payments_by_order_ids(
        &self,
        order_ids: &[String],
    ) -> Result<Vec<PaymentListItemResponse>, BackendError> {
        if order_ids.is_empty() {
            return Ok(Vec::new());
        }

        let params: Vec<(&str, &str)> = order_ids.iter().map(|id| ("orderIds", id.as_str())).collect();
        self.execute(self.request(Method::GET, "/payments").query(&params))
            .await
    }

    /// Profile of the signed-in user (`GET /users/me`)
    ///
    /// # Errors
    ///
    /// Returns errors for network failures, API errors, or parsing failures
    pub async fn current_user(&self) -> Result<UserResponse, BackendError> {
        self.execute(self.request(Method::GET, "/users/me")).await
    }
}
