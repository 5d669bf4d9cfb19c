//! Database layer for the weft event store.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded SQL migrations, and JSON subset containment. The event log table
//! is created through versioned migrations managed by this crate.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: no external database process required. WAL
//!   mode allows concurrent readers with a single writer, which matches the
//!   append-only access pattern of the event log.
//! - **`r2d2` connection pool**: bounded connection reuse without manual
//!   lifetime management. Every pooled connection is initialized with the
//!   same pragmas and SQL functions.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, ensuring the schema ships with the code that depends
//!   on it.
//! - **`json_contains` SQL function**: SQLite has no native `@>` operator,
//!   so subset containment is installed as a deterministic scalar function
//!   on every connection. This lets payload filters run inside a single SQL
//!   statement, which the conditional append protocol requires.

pub mod json;
mod migrations;
mod pool;

pub use migrations::{run_migrations, MigrationError};
pub use pool::{create_pool, DbPool, DbRuntimeSettings, PoolError};
