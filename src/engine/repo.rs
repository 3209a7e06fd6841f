//! Request Store: All database operations in one place.

mod requests;
mod tasks;

pub use requests::RequestRepo;
pub use tasks::TaskRepo;

use super::types::coerce_hours;
use rusqlite::types::ValueRef;

/// Reads an hour figure stored in any SQLite type.
///
/// Numbers pass through, text is parsed, everything else is zero. Clamping
/// happens later, at summation.
#[allow(clippy::cast_precision_loss)]
fn hours_from_sql(value: ValueRef<'_>) -> Option<f64> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(f),
        ValueRef::Text(bytes) => Some(std::str::from_utf8(bytes).map_or(0.0, coerce_hours)),
        ValueRef::Blob(_) => Some(0.0),
    }
}
