//! In-memory task store.
//!
//! Used for tests and for running the app without a database file. Records
//! are kept in insertion order, which is the "natural" order `find` returns
//! when no sort is requested.

use crate::error::{Error, Result};
use crate::tasks::models::{Task, TaskDocument};
use crate::tasks::store::{
    Cursor, DeleteResult, Filter, FindOptions, InsertOneResult, Projection, TaskStore, TaskUpdate,
    UpdateResult,
};
use std::sync::{Mutex, MutexGuard};

/// A task store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl InMemoryTaskStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `tasks`.
    #[must_use]
    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        Self { tasks: Mutex::new(tasks) }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Task>>> {
        self.tasks.lock().map_err(|e| Error::Store(e.to_string()))
    }
}

impl TaskStore for InMemoryTaskStore {
    fn find(
        &self,
        filter: &Filter,
        projection: &Projection,
        options: FindOptions,
    ) -> Result<Cursor> {
        let mut matching: Vec<Task> =
            self.lock()?.iter().filter(|task| filter.matches(task)).cloned().collect();

        if let Some(sort) = options.sort {
            matching.sort_by(|a, b| sort.compare(a, b));
        }
        if let Some(limit) = options.limit {
            matching.truncate(limit);
        }

        Ok(Cursor::new(
            matching.into_iter().map(|task| TaskDocument::project(task, projection)).collect(),
        ))
    }

    fn find_one(&self, filter: &Filter) -> Result<Option<Task>> {
        Ok(self.lock()?.iter().find(|task| filter.matches(task)).cloned())
    }

    fn insert_one(&self, id: i64, description: &str, status: bool) -> Result<InsertOneResult> {
        let mut tasks = self.lock()?;
        if tasks.iter().any(|task| task.id == id) {
            return Err(Error::DuplicateKey(id));
        }
        tasks.push(Task::new(id, description, status));
        Ok(InsertOneResult { inserted_id: id })
    }

    fn update_one(&self, filter: &Filter, update: &TaskUpdate) -> Result<UpdateResult> {
        let mut tasks = self.lock()?;
        let Some(task) = tasks.iter_mut().find(|task| filter.matches(task)) else {
            return Ok(UpdateResult::default());
        };
        let modified = update.apply(task);
        Ok(UpdateResult { matched_count: 1, modified_count: u64::from(modified) })
    }

    fn delete_one(&self, filter: &Filter) -> Result<DeleteResult> {
        let mut tasks = self.lock()?;
        let Some(index) = tasks.iter().position(|task| filter.matches(task)) else {
            return Ok(DeleteResult::default());
        };
        tasks.remove(index);
        Ok(DeleteResult { deleted_count: 1 })
    }

    fn drop_collection(&self) -> Result<()> {
        self.lock()?.clear();
        Ok(())
    }
}
