//! The event store: query engine and conditional appender.
//!
//! All operations run their SQLite work on `tokio::task::spawn_blocking`
//! with a connection borrowed from the pool for exactly one statement.
//! Dropping an operation's future abandons the caller's interest in the
//! result, nothing more: once dispatched to the blocking pool the
//! statement is not interruptible and runs to its terminal outcome. An
//! append whose future was dropped may therefore still commit; the next
//! query reveals whether it did. Atomicity is unaffected — the batch
//! lands whole or not at all.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use rusqlite::types::ToSql;
use rusqlite::{Connection, TransactionBehavior};

use weft_db::{create_pool, DbPool, DbRuntimeSettings};

use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::event::{NewEvent, StoredEvent};
use crate::filter::EventFilter;

/// Hard upper bound on events accepted by a single `append` call.
pub const MAX_APPEND_BATCH: usize = 10_000;

/// The result of a query: matching events in ascending sequence order plus
/// the highest sequence number observed within the filter.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Every event matching the filter, ascending by sequence number.
    pub events: Vec<StoredEvent>,
    /// The largest sequence number among the returned events, or 0 if none
    /// match. This is the caller's witness for a later conditional append.
    pub max_sequence_number: i64,
}

/// Handle to an event store backed by a pooled SQLite database.
///
/// Cloning is cheap; clones share the pool and the closed flag.
#[derive(Clone)]
pub struct EventStore {
    pool: DbPool,
    closed: Arc<AtomicBool>,
}

impl EventStore {
    /// Opens a store over the configured database, creating the file if it
    /// does not exist. Call [`migrate`](Self::migrate) before the first
    /// query or append.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the pool cannot be created.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = create_pool(
            &config.path,
            DbRuntimeSettings {
                busy_timeout_ms: config.busy_timeout_ms,
                pool_max_size: config.pool_max_size,
            },
        )
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        tracing::info!(path = %config.path, "opened event store");
        Ok(Self {
            pool,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Creates the event log schema if absent. Idempotent: running it any
    /// number of times produces the same schema.
    pub async fn migrate(&self) -> Result<(), StoreError> {
        let pool = self.checked_pool()?;
        run_blocking(move || {
            let conn = pool.get()?;
            let applied =
                weft_db::run_migrations(&conn).map_err(|e| StoreError::Internal(e.to_string()))?;
            if applied > 0 {
                tracing::info!(count = applied, "applied event store migrations");
            }
            Ok(())
        })
        .await
    }

    /// Returns every event matching `filter`, ascending by sequence number,
    /// together with the highest sequence number observed.
    ///
    /// The whole result is read by one SELECT statement, so it observes a
    /// consistent prefix of the log. An empty result set is success with
    /// `max_sequence_number = 0`, not a failure.
    pub async fn query(&self, filter: &EventFilter) -> Result<QueryResult, StoreError> {
        let pool = self.checked_pool()?;
        let filter = filter.clone();
        run_blocking(move || {
            let conn = pool.get()?;
            query_sync(&conn, &filter)
        })
        .await
    }

    /// Atomically verifies the filter's context and appends `events`.
    ///
    /// When `expected_max_sequence_number` is `Some(n)`, the append succeeds
    /// only if the largest sequence number currently matching `filter`
    /// equals `n` (0 for an empty context); otherwise nothing is inserted
    /// and the call fails with [`StoreError::ConcurrencyConflict`]. When it
    /// is `None` the check is skipped and the append is unconditional.
    ///
    /// The check and the insert are fused into a single SQL statement, so
    /// no concurrent append can slip a matching event between them. The
    /// batch is all-or-nothing, and events receive sequence numbers in the
    /// order supplied.
    ///
    /// An empty `events` list still performs the check and inserts nothing.
    pub async fn append(
        &self,
        filter: &EventFilter,
        events: Vec<NewEvent>,
        expected_max_sequence_number: Option<i64>,
    ) -> Result<(), StoreError> {
        if events.len() > MAX_APPEND_BATCH {
            return Err(StoreError::BadEvent(format!(
                "append batch of {} events exceeds the cap of {MAX_APPEND_BATCH}",
                events.len()
            )));
        }
        for event in &events {
            event.validate()?;
        }

        let pool = self.checked_pool()?;
        let filter = filter.clone();
        run_blocking(move || {
            let mut conn = pool.get()?;
            append_sync(&mut conn, &filter, &events, expected_max_sequence_number)
        })
        .await
    }

    /// Marks the store closed. Every subsequent operation fails with
    /// [`StoreError::Unavailable`]; operations already in flight run to
    /// completion. This call only flips the flag — pooled connections are
    /// reclaimed when the last clone of the store is dropped, not here.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        tracing::info!("event store closed");
    }

    fn checked_pool(&self) -> Result<DbPool, StoreError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("store is closed".to_string()));
        }
        Ok(self.pool.clone())
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Internal(format!("blocking task failed: {e}")))?
}

fn query_sync(conn: &Connection, filter: &EventFilter) -> Result<QueryResult, StoreError> {
    let mut params: Vec<Box<dyn ToSql>> = Vec::new();
    let clause = filter.to_sql_clause(&mut params)?;
    let sql = format!(
        "SELECT sequence_number, occurred_at, event_type, payload, metadata
         FROM events
         WHERE {clause}
         ORDER BY sequence_number ASC"
    );
    let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| &**p).collect();

    let mut stmt = conn.prepare(&sql).map_err(StoreError::from_sqlite)?;
    let rows = stmt
        .query_map(param_refs.as_slice(), |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })
        .map_err(StoreError::from_sqlite)?;

    let mut events = Vec::new();
    for row in rows {
        let (sequence_number, occurred_at, event_type, payload, metadata) =
            row.map_err(StoreError::from_sqlite)?;
        events.push(StoredEvent {
            sequence_number,
            occurred_at,
            event_type,
            payload: serde_json::from_str(&payload)?,
            metadata: serde_json::from_str(&metadata)?,
        });
    }

    // Rows arrive in ascending order, so the max is the last one.
    let max_sequence_number = events.last().map_or(0, |e| e.sequence_number);
    Ok(QueryResult {
        events,
        max_sequence_number,
    })
}

fn append_sync(
    conn: &mut Connection,
    filter: &EventFilter,
    events: &[NewEvent],
    expected: Option<i64>,
) -> Result<(), StoreError> {
    if events.is_empty() {
        // Nothing to insert: the call degrades to the check alone, a single
        // read statement.
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();
        let clause = filter.to_sql_clause(&mut params)?;
        let sql =
            format!("SELECT COALESCE(MAX(sequence_number), 0) FROM events WHERE {clause}");
        let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| &**p).collect();
        let current: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(StoreError::from_sqlite)?;
        return match expected {
            Some(exp) if current != exp => Err(StoreError::ConcurrencyConflict { expected: exp }),
            _ => Ok(()),
        };
    }

    let batch = serde_json::to_string(events)?;

    // IMMEDIATE takes the write lock before the statement runs, so the
    // guard's recomputed max cannot go stale between check and insert, and
    // a racing writer waits on the busy timeout instead of failing on a
    // stale snapshot.
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(StoreError::from_sqlite)?;

    let changed = match expected {
        Some(exp) => {
            // The optimistic check and the insert are one statement: the CTE
            // recomputes the filter's max sequence number and guards the
            // INSERT ... SELECT. Zero rows changed means the guard failed.
            let mut params: Vec<Box<dyn ToSql>> = Vec::new();
            let clause = filter.to_sql_clause(&mut params)?;
            params.push(Box::new(batch));
            let batch_idx = params.len();
            params.push(Box::new(exp));
            let expected_idx = params.len();

            let sql = format!(
                "WITH context(current) AS (
                     SELECT COALESCE(MAX(sequence_number), 0) FROM events WHERE {clause}
                 )
                 INSERT INTO events (event_type, payload, metadata)
                 SELECT json_extract(batch.value, '$.event_type'),
                        json_extract(batch.value, '$.payload'),
                        json_extract(batch.value, '$.metadata')
                 FROM context, json_each(?{batch_idx}) AS batch
                 WHERE context.current = ?{expected_idx}
                 ORDER BY batch.key"
            );
            let param_refs: Vec<&dyn ToSql> = params.iter().map(|p| &**p).collect();
            tx.execute(&sql, param_refs.as_slice())
                .map_err(StoreError::from_sqlite)?
        }
        None => tx
            .execute(
                "INSERT INTO events (event_type, payload, metadata)
                 SELECT json_extract(batch.value, '$.event_type'),
                        json_extract(batch.value, '$.payload'),
                        json_extract(batch.value, '$.metadata')
                 FROM json_each(?1) AS batch
                 ORDER BY batch.key",
                [&batch],
            )
            .map_err(StoreError::from_sqlite)?,
    };

    tx.commit().map_err(StoreError::from_sqlite)?;

    if changed == 0 {
        // Only the guarded path can insert zero rows from a non-empty batch.
        let expected = expected.unwrap_or(0);
        tracing::debug!(expected, "append rejected: context changed");
        return Err(StoreError::ConcurrencyConflict { expected });
    }

    tracing::debug!(count = changed, "appended events");
    Ok(())
}
