//! Navigation targets, including the payment page's callback URLs.

use crate::types::OrderId;
use reqwest::Url;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Base used to resolve path-only input
const LOCAL_ORIGIN: &str = "http://localhost/";

/// A URL that does not name a known route
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RouteError {
    /// Input is not a URL or path
    #[error("not a valid URL: {0}")]
    InvalidUrl(String),
    /// Path is not part of the booking flow
    #[error("unknown route: {0}")]
    UnknownPath(String),
}

/// Where a navigation leads
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowRoute {
    /// `/`
    Search,
    /// `/routes`
    Listing,
    /// `/seats`
    SeatSelection,
    /// `/booking`
    PassengerDetails,
    /// `/payment`
    PaymentHandoff,
    /// `/confirmation`
    Confirmation,
    /// `/payment/success?orderId=..`
    PaymentSuccess {
        /// Order id from the query string
        order_id: Option<OrderId>,
    },
    /// `/payment/cancel?orderId=..`
    PaymentCancel {
        /// Order id from the query string
        order_id: Option<OrderId>,
    },
}

impl FlowRoute {
    /// Parse an absolute URL or a path with optional query
    ///
    /// A blank `orderId` counts as absent. Trailing slashes are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`RouteError`] for malformed input or an unknown path.
    pub fn parse(input: &str) -> Result<Self, RouteError> {
        let input = input.trim();
        let url = Url::parse(input)
            .or_else(|_| Url::parse(LOCAL_ORIGIN).and_then(|base| base.join(input)))
            .map_err(|_| RouteError::InvalidUrl(input.to_string()))?;

        let order_id = || {
            url.query_pairs()
                .find(|(key, _)| key == "orderId")
                .map(|(_, value)| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(OrderId::new)
        };

        let path = url.path().trim_end_matches('/');
        match path {
            "" => Ok(Self::Search),
            "/routes" => Ok(Self::Listing),
            "/seats" => Ok(Self::SeatSelection),
            "/booking" => Ok(Self::PassengerDetails),
            "/payment" => Ok(Self::PaymentHandoff),
            "/confirmation" => Ok(Self::Confirmation),
            "/payment/success" => Ok(Self::PaymentSuccess { order_id: order_id() }),
            "/payment/cancel" => Ok(Self::PaymentCancel { order_id: order_id() }),
            other => Err(RouteError::UnknownPath(other.to_string())),
        }
    }

    /// Path of this route
    #[must_use]
    pub const fn path(&self) -> &'static str {
        match self {
            Self::Search => "/",
            Self::Listing => "/routes",
            Self::SeatSelection => "/seats",
            Self::PassengerDetails => "/booking",
            Self::PaymentHandoff => "/payment",
            Self::Confirmation => "/confirmation",
            Self::PaymentSuccess { .. } => "/payment/success",
            Self::PaymentCancel { .. } => "/payment/cancel",
        }
    }

    /// Whether this is one of the payment page's return routes
    #[must_use]
    pub const fn is_payment_callback(&self) -> bool {
        matches!(self, Self::PaymentSuccess { .. } | Self::PaymentCancel { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flow_paths() {
        assert_eq!(FlowRoute::parse("/"), Ok(FlowRoute::Search));
        assert_eq!(FlowRoute::parse("/seats/"), Ok(FlowRoute::SeatSelection));
        assert_eq!(
            FlowRoute::parse("/routes?from=Минск&to=Брест&date=2026-02-10"),
            Ok(FlowRoute::Listing)
        );
        assert_eq!(FlowRoute::parse("/confirmation"), Ok(FlowRoute::Confirmation));
    }

    #[test]
    fn test_parse_callbacks_with_order_id() {
        assert_eq!(
            FlowRoute::parse("https://tickets.example.by/payment/cancel?orderId=ORD123"),
            Ok(FlowRoute::PaymentCancel {
                order_id: Some(OrderId::new("ORD123"))
            })
        );
        assert_eq!(
            FlowRoute::parse("/payment/success?orderId=%20"),
            Ok(FlowRoute::PaymentSuccess { order_id: None })
        );
        assert_eq!(
            FlowRoute::parse("/payment/success"),
            Ok(FlowRoute::PaymentSuccess { order_id: None })
        );
    }

    #[test]
    fn test_unknown_path_is_rejected() {
        assert_eq!(
            FlowRoute::parse("/admin"),
            Err(RouteError::UnknownPath("/admin".to_string()))
        );
    }

    #[test]
    fn test_path_round_trips_through_parse() {
        for route in [FlowRoute::Search, FlowRoute::PassengerDetails, FlowRoute::PaymentHandoff] {
            assert_eq!(FlowRoute::parse(route.path()), Ok(route.clone()));
        }
        assert!(FlowRoute::PaymentCancel { order_id: None }.is_payment_callback());
    }
}
