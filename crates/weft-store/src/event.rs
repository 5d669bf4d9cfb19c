//! Event shapes: what callers append and what queries return.
//!
//! An event exists in two forms. [`NewEvent`] is the shape callers supply
//! to `append` — a type tag, a JSON payload, and optional metadata.
//! [`StoredEvent`] is the shape queries return — the same three fields plus
//! the sequence number and timestamp the store assigned at insertion.
//!
//! The store treats payloads as opaque except for subset-containment
//! matching; their schema is the caller's concern. The `event_type` field
//! on a returned event is the authoritative discriminator — readers
//! dispatch on the tag, not on any runtime-type mechanism.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::StoreError;

/// An event supplied to `append`. Sequence number and timestamp are
/// assigned by the store at insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Short textual tag identifying the event's kind. Must not be blank.
    pub event_type: String,
    /// The event payload. Must be a JSON object.
    pub payload: Value,
    /// Additional context the store never examines. Must be a JSON object;
    /// defaults to `{}`.
    #[serde(default = "empty_object")]
    pub metadata: Value,
}

fn empty_object() -> Value {
    Value::Object(Map::new())
}

impl NewEvent {
    /// Creates an event with the given type tag and payload, and empty
    /// metadata.
    pub fn new(event_type: impl Into<String>, payload: Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            metadata: empty_object(),
        }
    }

    /// Replaces the metadata (builder pattern).
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), StoreError> {
        if self.event_type.trim().is_empty() {
            return Err(StoreError::BadEvent(
                "event type tag must not be blank".to_string(),
            ));
        }
        if !self.payload.is_object() {
            return Err(StoreError::BadEvent(format!(
                "payload of '{}' must be a JSON object",
                self.event_type
            )));
        }
        if !self.metadata.is_object() {
            return Err(StoreError::BadEvent(format!(
                "metadata of '{}' must be a JSON object",
                self.event_type
            )));
        }
        Ok(())
    }
}

/// A stored event read back from the log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    /// Position in the global log: strictly increasing with insertion
    /// order, unique, never reused. The sole definition of before/after.
    pub sequence_number: i64,
    /// ISO 8601 UTC timestamp assigned at insertion. Informational; never
    /// used for ordering or consistency.
    pub occurred_at: String,
    /// The event's type tag.
    pub event_type: String,
    /// The event payload.
    pub payload: Value,
    /// The event metadata.
    pub metadata: Value,
}
