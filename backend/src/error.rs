//! Error types for the backend client

use thiserror::Error;

/// Errors that can occur when talking to the API gateway
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// HTTP request failed (connection refused, timeout, invalid URL)
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Response parsing failed
    #[error("Response parsing failed: {0}")]
    ResponseParseFailed(String),

    /// Unauthorized - missing or expired token
    #[error("Unauthorized")]
    Unauthorized {
        /// Message from the error body, if any
        message: Option<String>,
    },

    /// API returned an error status
    #[error("API error (status {status})")]
    ApiError {
        /// HTTP status code
        status: u16,
        /// Message from the error body, if any
        message: Option<String>,
    },
}

impl BackendError {
    /// The human-readable message the backend put in the error body
    ///
    /// Transport failures never carry one: their text is not meant for users.
    #[must_use]
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            Self::Unauthorized { message } | Self::ApiError { message, .. } => message.as_deref(),
            Self::RequestFailed(_) | Self::ResponseParseFailed(_) => None,
        }
    }

    /// HTTP status of the failed response, if there was one
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::ApiError { status, .. } => Some(*status),
            Self::RequestFailed(_) | Self::ResponseParseFailed(_) => None,
        }
    }

    /// Build an error for a non-success response from its status and body
    #[must_use]
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = extract_message(body);
        if status == 401 {
            Self::Unauthorized { message }
        } else {
            Self::ApiError { status, message }
        }
    }
}

/// Pull a user-facing message out of an error body
///
/// A JSON object contributes its string `message` field. A JSON string or a
/// non-JSON body contributes its trimmed text. Anything else yields `None`.
#[must_use]
pub fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string),
        Ok(serde_json::Value::String(text)) => {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        },
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_message_from_json_object() {
        let body = r#"{"message":"Not enough seats","status":400}"#;
        assert_eq!(extract_message(body).as_deref(), Some("Not enough seats"));
    }

    #[test]
    fn test_extract_message_ignores_object_without_message() {
        assert_eq!(extract_message(r#"{"error":"Bad Request"}"#), None);
        assert_eq!(extract_message(r#"{"message":42}"#), None);
    }

    #[test]
    fn test_extract_message_from_plain_text() {
        assert_eq!(
            extract_message("  Seat already taken \n").as_deref(),
            Some("Seat already taken")
        );
        assert_eq!(extract_message("   "), None);
    }

    #[test]
    fn test_unauthorized_is_split_from_other_statuses() {
        assert!(matches!(
            BackendError::from_response(401, ""),
            BackendError::Unauthorized { message: None }
        ));
        let error = BackendError::from_response(409, r#"{"message":"taken"}"#);
        assert_eq!(error.status(), Some(409));
        assert_eq!(error.backend_message(), Some("taken"));
    }

    #[test]
    fn test_transport_errors_have_no_backend_message() {
        let error = BackendError::RequestFailed("connection refused".to_string());
        assert_eq!(error.backend_message(), None);
        assert_eq!(error.status(), None);
    }
}
