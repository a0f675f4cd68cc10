//! Configuration management for the booking client.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::flow::FlowSettings;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Configuration rejected by [`Config::validate`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The API base URL is blank
    #[error("BUS_BOOKING_API_URL must not be empty")]
    EmptyApiUrl,
    /// The listing page size is zero
    #[error("BUS_BOOKING_PAGE_SIZE must be at least 1")]
    ZeroPageSize,
    /// The reservation window is zero
    #[error("BUS_BOOKING_RESERVATION_MINUTES must be at least 1")]
    ZeroReservationMinutes,
    /// The HTTP timeout is zero
    #[error("BUS_BOOKING_HTTP_TIMEOUT_SECS must be at least 1")]
    ZeroTimeout,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// API gateway connection
    pub api: ApiConfig,
    /// Booking flow tuning
    pub booking: BookingConfig,
}

/// API gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ApiConfig {
    /// Gateway base URL
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Bearer token of the signed-in passenger
    pub access_token: Option<String>,
}

/// Booking flow configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BookingConfig {
    /// Client-side reservation window in minutes
    pub reservation_minutes: u32,
    /// Trips per listing page
    pub page_size: u32,
    /// Where the pending booking is kept across the payment redirect
    pub handoff_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unparsable numbers fall back to their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: lookup("BUS_BOOKING_API_URL")
                    .unwrap_or_else(|| "http://localhost:8080".to_string()),
                timeout_secs: lookup("BUS_BOOKING_HTTP_TIMEOUT_SECS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(30),
                access_token: lookup("BUS_BOOKING_ACCESS_TOKEN").filter(|token| !token.trim().is_empty()),
            },
            booking: BookingConfig {
                reservation_minutes: lookup("BUS_BOOKING_RESERVATION_MINUTES")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(15),
                page_size: lookup("BUS_BOOKING_PAGE_SIZE")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10),
                handoff_path: lookup("BUS_BOOKING_HANDOFF_PATH")
                    .map_or_else(|| PathBuf::from(".bus-booking/pending-booking.json"), PathBuf::from),
            },
        }
    }

    /// Check values that would break the flow
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyApiUrl);
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.booking.page_size == 0 {
            return Err(ConfigError::ZeroPageSize);
        }
        if self.booking.reservation_minutes == 0 {
            return Err(ConfigError::ZeroReservationMinutes);
        }
        Ok(())
    }

    /// HTTP request timeout
    #[must_use]
    pub const fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Flow settings derived from this configuration
    #[must_use]
    pub fn flow_settings(&self) -> FlowSettings {
        FlowSettings {
            reservation_minutes: self.booking.reservation_minutes,
            page_size: self.booking.page_size,
            ..FlowSettings::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);
        assert_eq!(config.api.base_url, "http://localhost:8080");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.api.access_token, None);
        assert_eq!(config.booking.reservation_minutes, 15);
        assert_eq!(config.booking.page_size, 10);
        assert_eq!(
            config.booking.handoff_path,
            PathBuf::from(".bus-booking/pending-booking.json")
        );
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_invalid_numbers_fall_back() {
        let config = config(&[
            ("BUS_BOOKING_PAGE_SIZE", "many"),
            ("BUS_BOOKING_RESERVATION_MINUTES", "-3"),
        ]);
        assert_eq!(config.booking.page_size, 10);
        assert_eq!(config.booking.reservation_minutes, 15);
    }

    #[test]
    fn test_zero_values_rejected() {
        assert_eq!(
            config(&[("BUS_BOOKING_PAGE_SIZE", "0")]).validate(),
            Err(ConfigError::ZeroPageSize)
        );
        assert_eq!(
            config(&[("BUS_BOOKING_RESERVATION_MINUTES", "0")]).validate(),
            Err(ConfigError::ZeroReservationMinutes)
        );
        assert_eq!(
            config(&[("BUS_BOOKING_API_URL", "  ")]).validate(),
            Err(ConfigError::EmptyApiUrl)
        );
    }

    #[test]
    fn test_blank_token_is_anonymous() {
        assert_eq!(config(&[("BUS_BOOKING_ACCESS_TOKEN", " ")]).api.access_token, None);
        assert_eq!(
            config(&[("BUS_BOOKING_ACCESS_TOKEN", "abc")]).api.access_token.as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn test_flow_settings_carry_overrides() {
        let settings = config(&[("BUS_BOOKING_PAGE_SIZE", "20")]).flow_settings();
        assert_eq!(settings.page_size, 20);
        assert_eq!(settings.reservation_minutes, 15);
        assert_eq!(settings.tick_interval, Duration::from_secs(1));
    }
}
