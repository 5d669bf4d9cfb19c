//! JSON subset containment.
//!
//! Implements the `@>` relation over [`serde_json::Value`]: value `a`
//! contains value `b` iff every key of `b` is present in `a` with a
//! matching value, recursively. This is the matching primitive behind
//! payload filters, exposed both as a Rust function for in-process checks
//! and as the `json_contains` SQL scalar for use inside statements.

use rusqlite::functions::FunctionFlags;
use rusqlite::Connection;
use serde_json::{Map, Value};

/// Returns true if `a` contains `b` under JSON subset containment.
///
/// - If `b` is an object, `a` must be an object holding every key of `b`
///   with a value that recursively contains `b`'s value.
/// - If `b` is an array, `a` must be an array in which every element of `b`
///   is contained by some element of `a`.
/// - Otherwise the comparison is structural equality, never string-form
///   equality.
///
/// The empty object is contained by every object; the empty array by every
/// array.
pub fn contains(a: &Value, b: &Value) -> bool {
    match b {
        Value::Object(want) => object_contains(a, want),
        Value::Array(want) => match a {
            Value::Array(have) => want.iter().all(|wv| have.iter().any(|hv| contains(hv, wv))),
            _ => false,
        },
        _ => a == b,
    }
}

/// Returns true if `a` is an object containing every binding of `want`.
pub fn object_contains(a: &Value, want: &Map<String, Value>) -> bool {
    match a {
        Value::Object(have) => want
            .iter()
            .all(|(k, v)| have.get(k).map_or(false, |hv| contains(hv, v))),
        _ => false,
    }
}

/// Registers the `json_contains(haystack, needle)` SQL scalar function on
/// the given connection.
///
/// Both arguments are JSON text; the function returns 1 when `haystack`
/// contains `needle` per [`contains`]. The function is deterministic, so
/// SQLite may cache and reorder calls freely.
///
/// # Errors
///
/// Returns the underlying SQLite error if registration fails. Invalid JSON
/// passed to the function at query time surfaces as a statement error.
pub fn register_json_contains(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_scalar_function(
        "json_contains",
        2,
        FunctionFlags::SQLITE_UTF8 | FunctionFlags::SQLITE_DETERMINISTIC,
        |ctx| {
            let haystack: String = ctx.get(0)?;
            let needle: String = ctx.get(1)?;
            let haystack: Value = serde_json::from_str(&haystack)
                .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
            let needle: Value = serde_json::from_str(&needle)
                .map_err(|e| rusqlite::Error::UserFunctionError(Box::new(e)))?;
            Ok(contains(&haystack, &needle))
        },
    )
}
