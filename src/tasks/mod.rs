//! Task storage.
//!
//! This module provides:
//! - The [`Task`] record and its projected form, [`TaskDocument`]
//! - The [`TaskStore`] trait with `SQLite` and in-memory implementations
//! - Id assignment via [`next_available_id`]
//!
//! # Example
//!
//! ```no_run
//! use tasklist_web::tasks::{next_available_id, Filter, SqliteTaskStore, TaskStore};
//!
//! let store = SqliteTaskStore::new("/tmp/tasks.db").unwrap();
//!
//! let id = next_available_id(&store).unwrap();
//! store.insert_one(id, "Buy milk", false).unwrap();
//!
//! let task = store.find_one(&Filter::by_description("Buy milk")).unwrap();
//! assert_eq!(task.map(|t| t.id), Some(id));
//! ```

pub mod id;
pub mod memory;
pub mod models;
pub mod store;

pub use id::{next_available_id, FIRST_ID};
pub use memory::InMemoryTaskStore;
pub use models::{parse_status, Field, Task, TaskDocument};
pub use store::{
    Cursor, DeleteResult, Filter, FindOptions, InsertOneResult, Projection, Sort, SortOrder,
    SqliteTaskStore, TaskStore, TaskUpdate, UpdateResult,
};

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

/// Which [`TaskStore`] implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    /// Durable `SQLite` database file.
    #[default]
    Sqlite,
    /// Process-local store, emptied on restart.
    Memory,
}

impl StoreKind {
    /// Get the string representation of the store kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sqlite => "sqlite",
            Self::Memory => "memory",
        }
    }
}

impl FromStr for StoreKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Self::Sqlite),
            "memory" | "in_memory" | "inmemory" => Ok(Self::Memory),
            _ => Err(Error::Config(format!(
                "invalid store '{value}' (must be one of: sqlite, memory)"
            ))),
        }
    }
}

impl std::fmt::Display for StoreKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Construct the configured store.
///
/// `database_path` is only used by [`StoreKind::Sqlite`].
///
/// # Errors
///
/// Returns an error if the `SQLite` database cannot be initialized.
pub fn open_store(kind: StoreKind, database_path: &Path) -> Result<Arc<dyn TaskStore>> {
    match kind {
        StoreKind::Sqlite => Ok(Arc::new(SqliteTaskStore::new(database_path)?)),
        StoreKind::Memory => Ok(Arc::new(InMemoryTaskStore::new())),
    }
}
