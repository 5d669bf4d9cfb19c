//! Composable, immutable filters over the event log.
//!
//! A filter is a value, not a session: it names a non-empty set of event
//! type tags and an optional disjunction of payload subset objects. Equal
//! filters produce identical query and append behaviour. Builders return a
//! new filter on every call; a filter is never mutated in place.

use std::collections::BTreeSet;

use rusqlite::types::ToSql;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::StoreError;
use crate::event::StoredEvent;

/// A description of which events are in scope: a set of event type tags
/// plus a disjunction of payload subset predicates.
///
/// An event matches iff its type tag is in `event_types` and either the
/// predicate list is empty or at least one subset object is contained in
/// the event's payload. Within a subset object, keys are ANDed by
/// containment; across subset objects, the predicates are ORed. Adding a
/// predicate therefore broadens the match.
///
/// The type set is a `BTreeSet`, so equality ignores construction order
/// and duplicate tags collapse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventFilter {
    event_types: BTreeSet<String>,
    payload_predicates: Vec<Map<String, Value>>,
}

impl EventFilter {
    /// Creates a filter matching the given event types, with no payload
    /// constraint.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BadFilter`] if `event_types` is empty or any
    /// tag is blank.
    pub fn new<I, S>(event_types: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_types(event_types, Vec::new())
    }

    /// Creates a filter with the given type set and predicate list.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::BadFilter`] if `event_types` is empty or any
    /// tag is blank.
    pub fn with_types<I, S>(
        event_types: I,
        payload_predicates: Vec<Map<String, Value>>,
    ) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let event_types: BTreeSet<String> = event_types.into_iter().map(Into::into).collect();
        if event_types.is_empty() {
            return Err(StoreError::BadFilter(
                "filter requires at least one event type".to_string(),
            ));
        }
        if event_types.iter().any(|t| t.trim().is_empty()) {
            return Err(StoreError::BadFilter(
                "event type tags must not be blank".to_string(),
            ));
        }
        Ok(Self {
            event_types,
            payload_predicates,
        })
    }

    /// Returns a new filter with one additional single-key subset predicate
    /// `{ key: value }`.
    pub fn with_payload_predicate(mut self, key: impl Into<String>, value: Value) -> Self {
        let mut predicate = Map::new();
        predicate.insert(key.into(), value);
        self.payload_predicates.push(predicate);
        self
    }

    /// Returns a new filter with one additional subset predicate equal to
    /// `predicate` (all its keys ANDed by containment).
    pub fn with_payload_predicates(mut self, predicate: Map<String, Value>) -> Self {
        self.payload_predicates.push(predicate);
        self
    }

    /// The event type tags this filter matches.
    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.event_types.iter().map(String::as_str)
    }

    /// The payload subset predicates, in the order they were added.
    pub fn payload_predicates(&self) -> &[Map<String, Value>] {
        &self.payload_predicates
    }

    /// Authoritative matching semantics: type membership AND (no predicates
    /// OR any subset object contained in the payload).
    pub fn matches(&self, event: &StoredEvent) -> bool {
        if !self.event_types.contains(&event.event_type) {
            return false;
        }
        if self.payload_predicates.is_empty() {
            return true;
        }
        self.payload_predicates
            .iter()
            .any(|p| weft_db::json::object_contains(&event.payload, p))
    }

    /// Renders the filter as a SQL WHERE clause over the `events` table,
    /// appending its bind values to `params`. Placeholders are numbered
    /// from `params.len() + 1`, so the clause composes with parameters the
    /// caller has already collected.
    pub(crate) fn to_sql_clause(
        &self,
        params: &mut Vec<Box<dyn ToSql>>,
    ) -> Result<String, StoreError> {
        let mut placeholders = Vec::with_capacity(self.event_types.len());
        for tag in &self.event_types {
            params.push(Box::new(tag.clone()));
            placeholders.push(format!("?{}", params.len()));
        }
        let mut clause = format!("event_type IN ({})", placeholders.join(", "));

        if !self.payload_predicates.is_empty() {
            let mut predicates = Vec::with_capacity(self.payload_predicates.len());
            for predicate in &self.payload_predicates {
                params.push(Box::new(serde_json::to_string(predicate)?));
                predicates.push(format!("json_contains(payload, ?{})", params.len()));
            }
            clause.push_str(&format!(" AND ({})", predicates.join(" OR ")));
        }

        Ok(clause)
    }
}
