//! Error types for the event store.

use thiserror::Error;

/// Errors returned by [`EventStore`](crate::EventStore) operations.
///
/// The store never retries on behalf of the caller, never partially applies
/// a batch, and never downgrades a conflict to success. Callers map these
/// onto their own domain errors; the store itself carries no domain
/// vocabulary.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The filter is malformed: empty type set or a blank type tag.
    ///
    /// Surfaced by the [`EventFilter`](crate::EventFilter) constructors; a
    /// constructed filter is always valid.
    #[error("invalid filter: {0}")]
    BadFilter(String),

    /// An event is malformed, or the append batch exceeds the hard cap.
    #[error("invalid event: {0}")]
    BadEvent(String),

    /// The conditional append's guard failed: an event matching the filter
    /// was appended after the caller read its context. Safe to retry after
    /// re-reading.
    #[error("context changed: expected max sequence number {expected}")]
    ConcurrencyConflict {
        /// The max sequence number the caller expected to still hold.
        expected: i64,
    },

    /// The backend is unreachable, the pool is exhausted, or the store has
    /// been closed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An unexpected backend failure.
    #[error("store internal error: {0}")]
    Internal(String),
}

impl StoreError {
    /// Classifies a rusqlite error into the store taxonomy: connectivity
    /// and lock-contention failures are `Unavailable`, everything else is
    /// `Internal`.
    pub(crate) fn from_sqlite(err: rusqlite::Error) -> Self {
        use rusqlite::ErrorCode;

        match &err {
            rusqlite::Error::SqliteFailure(e, _) => match e.code {
                ErrorCode::CannotOpen
                | ErrorCode::NotADatabase
                | ErrorCode::DatabaseBusy
                | ErrorCode::DatabaseLocked => StoreError::Unavailable(err.to_string()),
                _ => StoreError::Internal(err.to_string()),
            },
            _ => StoreError::Internal(err.to_string()),
        }
    }
}

impl From<r2d2::Error> for StoreError {
    fn from(err: r2d2::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Internal(err.to_string())
    }
}
