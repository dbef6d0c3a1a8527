//! Testing utilities and store doubles.
//!
//! These types are provided for use in tests. They may appear unused in
//! the library itself but are consumed by unit and integration tests.

#![allow(dead_code)]

use crate::error::Result;
use crate::tasks::{
    Cursor, DeleteResult, Filter, FindOptions, InMemoryTaskStore, InsertOneResult, Projection,
    Task, TaskStore, TaskUpdate, UpdateResult,
};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A store where another writer wins the next `races` inserts.
///
/// Before each of those inserts, a competing task is written under the same
/// id, so the caller's insert fails with a duplicate key exactly as it would
/// if a concurrent request had computed the same next id first.
#[derive(Debug)]
pub struct RacingTaskStore {
    inner: InMemoryTaskStore,
    races_remaining: AtomicUsize,
    races_lost: AtomicUsize,
    same_description: bool,
}

impl RacingTaskStore {
    /// Create an empty store that loses the next `races` inserts.
    #[must_use]
    pub fn new(races: usize) -> Self {
        Self {
            inner: InMemoryTaskStore::new(),
            races_remaining: AtomicUsize::new(races),
            races_lost: AtomicUsize::new(0),
            same_description: false,
        }
    }

    /// Like [`RacingTaskStore::new`], but the competing writer submits the
    /// caller's own description, as a double-submitted form would.
    #[must_use]
    pub fn mirroring(races: usize) -> Self {
        Self { same_description: true, ..Self::new(races) }
    }

    /// How many inserts have been pre-empted so far.
    #[must_use]
    pub fn races_lost(&self) -> usize {
        self.races_lost.load(Ordering::SeqCst)
    }

    fn take_race(&self) -> bool {
        self.races_remaining
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl TaskStore for RacingTaskStore {
    fn find(
        &self,
        filter: &Filter,
        projection: &Projection,
        options: FindOptions,
    ) -> Result<Cursor> {
        self.inner.find(filter, projection, options)
    }

    fn find_one(&self, filter: &Filter) -> Result<Option<Task>> {
        self.inner.find_one(filter)
    }

    fn insert_one(&self, id: i64, description: &str, status: bool) -> Result<InsertOneResult> {
        if self.take_race() {
            let competitor = if self.same_description {
                description.to_string()
            } else {
                format!("concurrent writer {id}")
            };
            self.inner.insert_one(id, &competitor, false)?;
            self.races_lost.fetch_add(1, Ordering::SeqCst);
        }
        self.inner.insert_one(id, description, status)
    }

    fn update_one(&self, filter: &Filter, update: &TaskUpdate) -> Result<UpdateResult> {
        self.inner.update_one(filter, update)
    }

    fn delete_one(&self, filter: &Filter) -> Result<DeleteResult> {
        self.inner.delete_one(filter)
    }

    fn drop_collection(&self) -> Result<()> {
        self.inner.drop_collection()
    }
}
