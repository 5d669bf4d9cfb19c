//! Aggregateless event store over a globally ordered log.
//!
//! The store persists an append-only sequence of events and lets callers
//! implement decisions without aggregates, per-entity versions, or row
//! locks. A feature slice:
//!
//! 1. builds an [`EventFilter`] describing the events its decision depends
//!    on (type tags plus payload subset predicates),
//! 2. calls [`EventStore::query`] to read that context and its
//!    `max_sequence_number`,
//! 3. runs a pure decision over the context, and
//! 4. calls [`EventStore::append`] with the same filter, the new events,
//!    and the observed max sequence number.
//!
//! The append re-verifies the context's max sequence number and inserts in
//! one atomic statement. If any matching event appeared in between, the
//! append fails with [`StoreError::ConcurrencyConflict`] and the slice
//! re-reads and retries. This yields serialisable consistency across
//! arbitrary subsets of the log.
//!
//! The filter used on append should cover the same scope as the filter
//! used on query; the store applies whatever filter it is given, so slice
//! authors own that contract.
//!
//! # Usage
//!
//! ```rust,ignore
//! use serde_json::json;
//! use weft_store::{EventFilter, EventStore, NewEvent, StoreConfig};
//!
//! let store = EventStore::open(&StoreConfig::from_env())?;
//! store.migrate().await?;
//!
//! let filter = EventFilter::new(["CourseRegistered"])?
//!     .with_payload_predicate("course_id", json!("rust-101"));
//!
//! let context = store.query(&filter).await?;
//! // ... decide ...
//! store
//!     .append(
//!         &filter,
//!         vec![NewEvent::new("CourseRegistered", json!({"course_id": "rust-101"}))],
//!         Some(context.max_sequence_number),
//!     )
//!     .await?;
//! ```

mod config;
mod error;
mod event;
mod filter;
mod store;

pub use config::StoreConfig;
pub use error::StoreError;
pub use event::{NewEvent, StoredEvent};
pub use filter::EventFilter;
pub use store::{EventStore, QueryResult, MAX_APPEND_BATCH};
