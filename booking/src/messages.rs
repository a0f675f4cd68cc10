//! User-facing messages.
//!
//! Transport error text never reaches passengers. Every failure is shown as
//! one of these localized messages, or as the backend's own `message` when the
//! error body carried one.

use bus_booking_backend::BackendError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A message shown to the passenger
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UserMessage {
    /// Search form has blank fields
    SearchIncomplete,
    /// Travel date is not a real `YYYY-MM-DD` date
    InvalidSearchDate,
    /// Trip listing could not be loaded
    TripsLoadFailed,
    /// Seat map could not be loaded
    SeatsLoadFailed,
    /// Tried to continue without seats
    NoSeatsSelected,
    /// Booking response had no payment link
    MissingPaymentUrl,
    /// Booking from the passenger step failed
    BookingFailed,
    /// Booking straight from the seat map failed
    QuickBookingFailed,
    /// The reservation countdown ran out
    ReservationExpired,
    /// Booking history could not be loaded
    BookingsLoadFailed,
    /// Orders or their payments could not be loaded
    OrderHistoryLoadFailed,
    /// Anything else went wrong
    Generic,
    /// Message supplied by the backend in an error body
    Backend(String),
}

impl UserMessage {
    /// The backend's message if it sent one, else `fallback`
    #[must_use]
    pub fn from_backend_error(error: &BackendError, fallback: Self) -> Self {
        error
            .backend_message()
            .map(str::trim)
            .filter(|message| !message.is_empty())
            .map_or(fallback, |message| Self::Backend(message.to_string()))
    }

    /// Text shown to the passenger
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::SearchIncomplete => "Заполните все поля поиска.",
            Self::InvalidSearchDate => "Укажите дату поездки в формате ГГГГ-ММ-ДД.",
            Self::TripsLoadFailed => "Не удалось загрузить рейсы. Попробуйте позже.",
            Self::SeatsLoadFailed => "Не удалось загрузить места. Попробуйте позже.",
            Self::NoSeatsSelected => "Выберите хотя бы одно место.",
            Self::MissingPaymentUrl => "Не получена ссылка на оплату. Попробуйте снова.",
            Self::BookingFailed => {
                "Не удалось создать бронирование. Проверьте авторизацию и попробуйте снова."
            },
            Self::QuickBookingFailed => "Не удалось забронировать. Войдите в аккаунт и попробуйте снова.",
            Self::ReservationExpired => "Время бронирования истекло. Пожалуйста, начните заново.",
            Self::BookingsLoadFailed => "Не удалось загрузить бронирования.",
            Self::OrderHistoryLoadFailed => "Не удалось загрузить историю заказов и платежей.",
            Self::Generic => "Произошла ошибка. Попробуйте снова.",
            Self::Backend(message) => message,
        }
    }
}

impl fmt::Display for UserMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_message_wins_over_fallback() {
        let error = BackendError::ApiError {
            status: 400,
            message: Some("Места уже заняты".to_string()),
        };
        let message = UserMessage::from_backend_error(&error, UserMessage::BookingFailed);
        assert_eq!(message.text(), "Места уже заняты");
    }

    #[test]
    fn test_transport_error_uses_fallback() {
        let error = BackendError::RequestFailed("error sending request: connection refused".to_string());
        let message = UserMessage::from_backend_error(&error, UserMessage::BookingFailed);
        assert_eq!(message, UserMessage::BookingFailed);
        assert!(!message.text().contains("connection"));
    }

    #[test]
    fn test_blank_backend_message_uses_fallback() {
        let error = BackendError::Unauthorized {
            message: Some("  ".to_string()),
        };
        assert_eq!(
            UserMessage::from_backend_error(&error, UserMessage::Generic),
            UserMessage::Generic
        );
    }
}
