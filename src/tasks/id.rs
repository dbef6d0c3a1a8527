//! Task id assignment.
//!
//! Ids are integers chosen as one more than the largest id currently stored,
//! starting at 1 for an empty store. The lookup and the later insert are two
//! separate store calls, so two writers can pick the same id; the second
//! insert then fails with [`Error::DuplicateKey`](crate::error::Error::DuplicateKey).

use crate::error::{Error, Result};
use crate::tasks::models::Field;
use crate::tasks::store::{Filter, FindOptions, Projection, SortOrder, TaskStore};

/// The id given to the first task in an empty store.
pub const FIRST_ID: i64 = 1;

/// Compute the next unused task id.
///
/// Queries the store for the highest id (sorted descending, limited to one
/// result) and returns it plus one, or [`FIRST_ID`] if the store is empty.
///
/// # Errors
///
/// Returns an error if the store query fails, or [`Error::Store`] if the
/// largest id is already `i64::MAX`.
pub fn next_available_id(store: &dyn TaskStore) -> Result<i64> {
    let options = FindOptions::default().sort(Field::Id, SortOrder::Descending).limit(1);
    let mut cursor = store.find(&Filter::all(), &Projection::only([Field::Id]), options)?;

    match cursor.next().and_then(|doc| doc.id) {
        None => Ok(FIRST_ID),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| Error::Store(format!("no task id left after {max}"))),
    }
}
