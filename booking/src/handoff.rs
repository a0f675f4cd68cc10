//! Pending-booking handoff across the payment redirect.
//!
//! One record under one well-known key: written right before the redirect to
//! the payment page, consumed (read and deleted) on the success callback,
//! deleted on the cancel callback.

use crate::types::{BookingId, OrderId};
use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

/// The minimal booking data that must survive the redirect
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingBookingHandoff {
    /// Booking created before the redirect
    pub booking_id: BookingId,
    /// Order the payment page settles
    pub order_id: OrderId,
}

/// Handoff storage failures
#[derive(Debug, Error)]
pub enum HandoffError {
    /// Underlying storage failed
    #[error("handoff storage failed: {0}")]
    Io(#[from] io::Error),

    /// A record was present but unreadable; it has been removed
    #[error("handoff record is corrupt: {0}")]
    Corrupt(String),

    /// The record could not be encoded
    #[error("handoff record could not be encoded: {0}")]
    Encode(String),
}

/// Scoped key-value storage holding at most one handoff record
pub trait HandoffStore: Send + Sync {
    /// Write the record, replacing any previous one
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written.
    fn save(&self, handoff: &PendingBookingHandoff) -> Result<(), HandoffError>;

    /// Read the record without removing it
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Corrupt`] for an unreadable record (left in
    /// place) or an I/O error.
    fn peek(&self) -> Result<Option<PendingBookingHandoff>, HandoffError>;

    /// Read and delete the record
    ///
    /// # Errors
    ///
    /// Returns [`HandoffError::Corrupt`] for an unreadable record, which is
    /// deleted all the same, or an I/O error.
    fn take(&self) -> Result<Option<PendingBookingHandoff>, HandoffError>;

    /// Delete the record if present
    ///
    /// # Errors
    ///
    /// Returns an error if an existing record cannot be removed.
    fn clear(&self) -> Result<(), HandoffError>;
}

fn encode(handoff: &PendingBookingHandoff) -> Result<String, HandoffError> {
    serde_json::to_string(handoff).map_err(|e| HandoffError::Encode(e.to_string()))
}

fn decode(raw: &str) -> Result<PendingBookingHandoff, HandoffError> {
    serde_json::from_str(raw).map_err(|e| HandoffError::Corrupt(e.to_string()))
}

/// Process-local handoff storage
#[derive(Debug, Default)]
pub struct InMemoryHandoffStore {
    slot: Mutex<Option<String>>,
}

impl InMemoryHandoffStore {
    /// Empty storage
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage already holding `raw` under the handoff key
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl HandoffStore for InMemoryHandoffStore {
    fn save(&self, handoff: &PendingBookingHandoff) -> Result<(), HandoffError> {
        *self.slot() = Some(encode(handoff)?);
        Ok(())
    }

    fn peek(&self) -> Result<Option<PendingBookingHandoff>, HandoffError> {
        self.slot().as_deref().map(decode).transpose()
    }

    fn take(&self) -> Result<Option<PendingBookingHandoff>, HandoffError> {
        self.slot().take().as_deref().map(decode).transpose()
    }

    fn clear(&self) -> Result<(), HandoffError> {
        *self.slot() = None;
        Ok(())
    }
}

/// Handoff storage in a JSON file, for flows that span processes
#[derive(Clone, Debug)]
pub struct FileHandoffStore {
    path: PathBuf,
}

impl FileHandoffStore {
    /// Store the record at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// File the record lives in
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_raw(&self) -> Result<Option<String>, HandoffError> {
        match std::fs::read_to_string(&self.path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl HandoffStore for FileHandoffStore {
    fn save(&self, handoff: &PendingBookingHandoff) -> Result<(), HandoffError> {
        let raw = encode(handoff)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, raw)?;
        tracing::debug!(path = %self.path.display(), "Saved pending booking handoff");
        Ok(())
    }

    fn peek(&self) -> Result<Option<PendingBookingHandoff>, HandoffError> {
        self.read_raw()?.as_deref().map(decode).transpose()
    }

    fn take(&self) -> Result<Option<PendingBookingHandoff>, HandoffError> {
        let raw = self.read_raw()?;
        if raw.is_some() {
            self.clear()?;
        }
        raw.as_deref().map(decode).transpose()
    }

    fn clear(&self) -> Result<(), HandoffError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn handoff() -> PendingBookingHandoff {
        PendingBookingHandoff {
            booking_id: BookingId::new("B1"),
            order_id: OrderId::new("ORD123"),
        }
    }

    #[test]
    fn test_record_uses_camel_case_keys() {
        let raw = encode(&handoff()).unwrap();
        assert_eq!(raw, r#"{"bookingId":"B1","orderId":"ORD123"}"#);
    }

    #[test]
    fn test_in_memory_take_consumes() {
        let store = InMemoryHandoffStore::new();
        store.save(&handoff()).unwrap();
        assert_eq!(store.peek().unwrap(), Some(handoff()));
        assert_eq!(store.take().unwrap(), Some(handoff()));
        assert_eq!(store.take().unwrap(), None);
    }

    #[test]
    fn test_corrupt_record_is_reported_and_removed() {
        let store = InMemoryHandoffStore::with_raw("{not json");
        assert!(matches!(store.take(), Err(HandoffError::Corrupt(_))));
        assert_eq!(store.take().unwrap(), None);
    }

    #[test]
    fn test_file_store_lifecycle() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileHandoffStore::new(dir.path().join("nested").join("pending-booking.json"));

        assert_eq!(store.take().unwrap(), None);
        store.save(&handoff()).unwrap();
        assert!(store.path().exists());

        assert_eq!(store.take().unwrap(), Some(handoff()));
        assert!(!store.path().exists());
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_removes_corrupt_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pending-booking.json");
        std::fs::write(&path, "garbage").unwrap();

        let store = FileHandoffStore::new(&path);
        assert!(matches!(store.take(), Err(HandoffError::Corrupt(_))));
        assert!(!path.exists());
    }
}
