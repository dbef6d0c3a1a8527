//! Task operations behind the web pages.
//!
//! Each method is one request's worth of work: validate the input, consult
//! the store, then mutate it. Nothing here coordinates concurrent callers;
//! uniqueness of descriptions is checked with a lookup before writing.

use crate::error::{Error, Result, ValidationError};
use crate::tasks::{
    next_available_id, Field, Filter, FindOptions, Projection, SortOrder, Task, TaskDocument,
    TaskStore, TaskUpdate,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// How many times `create` recomputes the id after losing an insert race.
pub const MAX_INSERT_ATTEMPTS: usize = 3;

/// What `create` did with the submitted description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// A new task was inserted with this id.
    Created(i64),
    /// A task with the same description already existed; its status was set.
    StatusUpdated(i64),
}

impl CreateOutcome {
    /// The id of the task that was created or updated.
    #[must_use]
    pub const fn id(self) -> i64 {
        match self {
            Self::Created(id) | Self::StatusUpdated(id) => id,
        }
    }
}

/// Task operations over a shared store.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl std::fmt::Debug for TaskService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskService").finish_non_exhaustive()
    }
}

impl TaskService {
    /// Create a service over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &dyn TaskStore {
        self.store.as_ref()
    }

    /// All tasks, ascending by id.
    ///
    /// # Errors
    ///
    /// Returns an error if the store query fails.
    pub fn list(&self) -> Result<Vec<Task>> {
        let options = FindOptions::default().sort(Field::Id, SortOrder::Ascending);
        let cursor = self.store.find(&Filter::all(), &Projection::all(), options)?;
        Ok(cursor.filter_map(TaskDocument::into_task).collect())
    }

    /// Fetch one task.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no task has `id`.
    pub fn get(&self, id: i64) -> Result<Task> {
        self.store.find_one(&Filter::by_id(id))?.ok_or(Error::NotFound(id))
    }

    /// Create a task, or set the status of the task that already has this description.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDescription`] for a missing or empty
    /// description, [`Error::DuplicateKey`] if every id attempt was taken by
    /// a concurrent writer, or a store error.
    pub fn create(&self, description: Option<&str>, status: bool) -> Result<CreateOutcome> {
        let description = non_empty(description)?;

        let mut attempt = 1;
        loop {
            // Re-checked on every attempt: the writer that took our id may
            // have submitted this same description.
            if let Some(existing) = self.store.find_one(&Filter::by_description(description))? {
                self.store.update_one(&Filter::by_id(existing.id), &TaskUpdate::status(status))?;
                info!(id = existing.id, status, "description exists, status updated");
                return Ok(CreateOutcome::StatusUpdated(existing.id));
            }

            let id = next_available_id(self.store.as_ref())?;
            match self.store.insert_one(id, description, status) {
                Ok(result) => {
                    info!(id = result.inserted_id, status, "task created");
                    return Ok(CreateOutcome::Created(result.inserted_id));
                }
                Err(Error::DuplicateKey(taken)) if attempt < MAX_INSERT_ATTEMPTS => {
                    warn!(id = taken, attempt, "id taken by a concurrent insert, retrying");
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Change a task's description.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no task has `id`,
    /// [`ValidationError::EmptyDescription`] for a missing or empty description,
    /// [`ValidationError::DuplicateDescription`] if a different task already
    /// uses the description, or a store error.
    pub fn update_description(&self, id: i64, description: Option<&str>) -> Result<()> {
        let task = self.get(id)?;
        let description = non_empty(description)?;

        if let Some(other) = self.store.find_one(&Filter::by_description(description))? {
            if other.id != task.id {
                return Err(ValidationError::DuplicateDescription {
                    id: other.id,
                    description: other.description,
                }
                .into());
            }
        }

        let result =
            self.store.update_one(&Filter::by_id(task.id), &TaskUpdate::description(description))?;
        debug!(id, modified = result.modified_count, "description updated");
        Ok(())
    }

    /// Flip a task between pending and done. Returns the new status.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no task has `id`, or a store error.
    pub fn toggle_status(&self, id: i64) -> Result<bool> {
        let task = self.get(id)?;
        let status = !task.status;
        self.store.update_one(&Filter::by_id(task.id), &TaskUpdate::status(status))?;
        info!(id, status, "status toggled");
        Ok(status)
    }

    /// Delete a task. Deleting an id that does not exist succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if the store call fails.
    pub fn delete(&self, id: i64) -> Result<()> {
        let result = self.store.delete_one(&Filter::by_id(id))?;
        info!(id, deleted = result.deleted_count, "delete");
        Ok(())
    }
}

fn non_empty(description: Option<&str>) -> Result<&str> {
    match description {
        Some(d) if !d.is_empty() => Ok(d),
        _ => Err(ValidationError::EmptyDescription.into()),
    }
}
