//! Task store trait and `SQLite` implementation.
//!
//! The store speaks in document-collection terms: equality filters,
//! field projections, and `*_one` mutations that report how many records
//! they touched.

use crate::error::{Error, Result};
use crate::tasks::models::{Field, Task, TaskDocument};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, ToSql, TransactionBehavior};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Trait for task storage operations.
///
/// Implementations provide no cross-call coordination: a read followed by a
/// write may interleave with other callers.
#[allow(clippy::missing_errors_doc)]
pub trait TaskStore: Send + Sync {
    /// Return every task matching `filter`, projected and ordered per the arguments.
    fn find(&self, filter: &Filter, projection: &Projection, options: FindOptions)
        -> Result<Cursor>;

    /// Return the first task matching `filter`.
    fn find_one(&self, filter: &Filter) -> Result<Option<Task>>;

    /// Insert a task. Fails with [`Error::DuplicateKey`] if `id` is taken.
    fn insert_one(&self, id: i64, description: &str, status: bool) -> Result<InsertOneResult>;

    /// Set the given fields on the first task matching `filter`.
    fn update_one(&self, filter: &Filter, update: &TaskUpdate) -> Result<UpdateResult>;

    /// Remove the first task matching `filter`.
    fn delete_one(&self, filter: &Filter) -> Result<DeleteResult>;

    /// Remove every task.
    fn drop_collection(&self) -> Result<()>;
}

/// Equality constraints used to select tasks. Unset fields match anything.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Match this id.
    pub id: Option<i64>,
    /// Match this exact description.
    pub description: Option<String>,
    /// Match this status.
    pub status: Option<bool>,
}

impl Filter {
    /// A filter matching every task.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// A filter on the task id.
    #[must_use]
    pub fn by_id(id: i64) -> Self {
        Self { id: Some(id), ..Self::default() }
    }

    /// A filter on the exact description.
    #[must_use]
    pub fn by_description(description: impl Into<String>) -> Self {
        Self { description: Some(description.into()), ..Self::default() }
    }

    /// Check if no constraints are set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.id.is_none() && self.description.is_none() && self.status.is_none()
    }

    /// Check whether `task` satisfies every constraint.
    #[must_use]
    pub fn matches(&self, task: &Task) -> bool {
        self.id.map_or(true, |id| task.id == id)
            && self.description.as_deref().map_or(true, |d| task.description == d)
            && self.status.map_or(true, |s| task.status == s)
    }

    /// Render as a SQL `WHERE` clause plus its bound parameters.
    fn to_sql(&self) -> (String, Vec<Box<dyn ToSql>>) {
        let mut conditions = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(id) = self.id {
            conditions.push("id = ?");
            values.push(Box::new(id));
        }
        if let Some(ref description) = self.description {
            conditions.push("description = ?");
            values.push(Box::new(description.clone()));
        }
        if let Some(status) = self.status {
            conditions.push("status = ?");
            values.push(Box::new(status));
        }

        let clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        (clause, values)
    }
}

/// The set of fields a query returns. Empty means all fields.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Projection {
    fields: BTreeSet<Field>,
}

impl Projection {
    /// Return every field.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Return only the listed fields.
    #[must_use]
    pub fn only(fields: impl IntoIterator<Item = Field>) -> Self {
        Self { fields: fields.into_iter().collect() }
    }

    /// Check whether `field` is part of the result.
    #[must_use]
    pub fn includes(&self, field: Field) -> bool {
        self.fields.is_empty() || self.fields.contains(&field)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    /// Smallest first.
    #[default]
    Ascending,
    /// Largest first.
    Descending,
}

impl SortOrder {
    const fn as_sql(self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }
}

/// A single-field sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sort {
    /// Field to order by.
    pub field: Field,
    /// Direction.
    pub order: SortOrder,
}

impl Sort {
    /// Compare two tasks under this sort.
    #[must_use]
    pub fn compare(&self, a: &Task, b: &Task) -> Ordering {
        let ordering = match self.field {
            Field::Id => a.id.cmp(&b.id),
            Field::Description => a.description.cmp(&b.description),
            Field::Status => a.status.cmp(&b.status),
        };
        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// Ordering and size limits for [`TaskStore::find`].
///
/// Without a sort the result order is unspecified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FindOptions {
    /// Optional sort.
    pub sort: Option<Sort>,
    /// Maximum number of results.
    pub limit: Option<usize>,
}

impl FindOptions {
    /// Order results by `field`.
    #[must_use]
    pub const fn sort(mut self, field: Field, order: SortOrder) -> Self {
        self.sort = Some(Sort { field, order });
        self
    }

    /// Return at most `limit` results.
    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// One-shot iterator over query results.
///
/// Once exhausted it stays exhausted; issue the query again to re-read.
#[derive(Debug)]
pub struct Cursor {
    documents: std::vec::IntoIter<TaskDocument>,
}

impl Cursor {
    /// Wrap already-fetched documents.
    #[must_use]
    pub fn new(documents: Vec<TaskDocument>) -> Self {
        Self { documents: documents.into_iter() }
    }
}

impl Iterator for Cursor {
    type Item = TaskDocument;

    fn next(&mut self) -> Option<Self::Item> {
        self.documents.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.documents.size_hint()
    }
}

/// Fields to set on a task. `None` leaves the field untouched.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TaskUpdate {
    /// New description (if Some).
    pub description: Option<String>,
    /// New status (if Some).
    pub status: Option<bool>,
}

impl TaskUpdate {
    /// An update that sets the description.
    #[must_use]
    pub fn description(description: impl Into<String>) -> Self {
        Self { description: Some(description.into()), status: None }
    }

    /// An update that sets the status.
    #[must_use]
    pub const fn status(status: bool) -> Self {
        Self { description: None, status: Some(status) }
    }

    /// Check if any fields are set for update.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.description.is_none() && self.status.is_none()
    }

    /// Apply the update to `task`, returning whether anything changed.
    pub fn apply(&self, task: &mut Task) -> bool {
        let mut changed = false;
        if let Some(ref description) = self.description {
            if task.description != *description {
                task.description.clone_from(description);
                changed = true;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                task.status = status;
                changed = true;
            }
        }
        changed
    }

    /// Render as an `UPDATE` of task `id` touching only the set fields.
    ///
    /// Rows whose values already equal the update are not matched, so the
    /// affected-row count is the modified count. Returns `None` for an
    /// empty update.
    fn to_sql(&self, id: i64) -> Option<(String, Vec<Box<dyn ToSql>>)> {
        let mut assignments = Vec::new();
        let mut differences = Vec::new();
        let mut values: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref description) = self.description {
            values.push(Box::new(description.clone()));
            assignments.push(format!("description = ?{}", values.len()));
            differences.push(format!("description IS NOT ?{}", values.len()));
        }
        if let Some(status) = self.status {
            values.push(Box::new(status));
            assignments.push(format!("status = ?{}", values.len()));
            differences.push(format!("status IS NOT ?{}", values.len()));
        }
        if assignments.is_empty() {
            return None;
        }

        values.push(Box::new(id));
        let sql = format!(
            "UPDATE tasks SET {} WHERE id = ?{} AND ({})",
            assignments.join(", "),
            values.len(),
            differences.join(" OR ")
        );
        Some((sql, values))
    }
}

/// Confirmation of [`TaskStore::insert_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertOneResult {
    /// Id of the new task.
    pub inserted_id: i64,
}

/// Confirmation of [`TaskStore::update_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateResult {
    /// Tasks that matched the filter (0 or 1).
    pub matched_count: u64,
    /// Tasks whose stored values changed (0 or 1).
    pub modified_count: u64,
}

/// Confirmation of [`TaskStore::delete_one`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeleteResult {
    /// Tasks removed (0 or 1).
    pub deleted_count: u64,
}

/// SQLite-based task store.
///
/// Each operation opens its own connection to the database file, so the
/// store is cheap to share across threads.
#[derive(Debug, Clone)]
pub struct SqliteTaskStore {
    db_path: PathBuf,
}

impl SqliteTaskStore {
    /// Create a new `SQLite` task store at the given database path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be initialized.
    pub fn new(db_path: impl AsRef<Path>) -> Result<Self> {
        let store = Self { db_path: db_path.as_ref().to_path_buf() };
        store.init_schema()?;
        Ok(store)
    }

    /// Get the database path.
    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    /// Open a connection to the database.
    fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(&self.db_path)?;
        conn.execute_batch("PRAGMA busy_timeout = 5000; PRAGMA journal_mode = WAL;")?;
        Ok(conn)
    }

    /// Initialize the database schema.
    fn init_schema(&self) -> Result<()> {
        let conn = self.open()?;

        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY,
                description TEXT NOT NULL,
                status INTEGER NOT NULL DEFAULT 0 CHECK (status IN (0, 1))
            );
            ",
        )?;

        Ok(())
    }

    /// Parse a task from a row.
    fn parse_task(row: &rusqlite::Row) -> rusqlite::Result<Task> {
        Ok(Task { id: row.get(0)?, description: row.get(1)?, status: row.get(2)? })
    }

    /// Fetch the first row matching `filter`.
    fn first_match(conn: &Connection, filter: &Filter) -> Result<Option<Task>> {
        let (where_clause, values) = filter.to_sql();
        let sql = format!("SELECT id, description, status FROM tasks {where_clause} LIMIT 1");
        let params: Vec<&dyn ToSql> = values.iter().map(AsRef::as_ref).collect();
        let task = conn.query_row(&sql, params.as_slice(), Self::parse_task).optional()?;
        Ok(task)
    }
}

impl TaskStore for SqliteTaskStore {
    fn find(
        &self,
        filter: &Filter,
        projection: &Projection,
        options: FindOptions,
    ) -> Result<Cursor> {
        let conn = self.open()?;
        let (where_clause, mut values) = filter.to_sql();

        let mut sql = format!("SELECT id, description, status FROM tasks {where_clause}");
        if let Some(sort) = options.sort {
            sql.push_str(&format!(" ORDER BY {} {}", sort.field.as_str(), sort.order.as_sql()));
        }
        if let Some(limit) = options.limit {
            sql.push_str(" LIMIT ?");
            values.push(Box::new(i64::try_from(limit).unwrap_or(i64::MAX)));
        }

        debug!(%sql, "find");
        let params: Vec<&dyn ToSql> = values.iter().map(AsRef::as_ref).collect();
        let mut stmt = conn.prepare(&sql)?;
        let documents = stmt
            .query_map(params.as_slice(), Self::parse_task)?
            .map(|task| task.map(|task| TaskDocument::project(task, projection)))
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Cursor::new(documents))
    }

    fn find_one(&self, filter: &Filter) -> Result<Option<Task>> {
        let conn = self.open()?;
        Self::first_match(&conn, filter)
    }

    fn insert_one(&self, id: i64, description: &str, status: bool) -> Result<InsertOneResult> {
        let conn = self.open()?;

        match conn.execute(
            "INSERT INTO tasks (id, description, status) VALUES (?1, ?2, ?3)",
            params![id, description, status],
        ) {
            Ok(_) => Ok(InsertOneResult { inserted_id: id }),
            Err(rusqlite::Error::SqliteFailure(e, _)) if e.code == ErrorCode::ConstraintViolation => {
                Err(Error::DuplicateKey(id))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update_one(&self, filter: &Filter, update: &TaskUpdate) -> Result<UpdateResult> {
        let mut conn = self.open()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let Some(task) = Self::first_match(&tx, filter)? else {
            return Ok(UpdateResult::default());
        };
        let Some((sql, values)) = update.to_sql(task.id) else {
            return Ok(UpdateResult { matched_count: 1, modified_count: 0 });
        };

        let params: Vec<&dyn ToSql> = values.iter().map(AsRef::as_ref).collect();
        let rows = tx.execute(&sql, params.as_slice())?;
        tx.commit()?;
        debug!(id = task.id, rows, "update_one");

        Ok(UpdateResult { matched_count: 1, modified_count: rows as u64 })
    }

    fn delete_one(&self, filter: &Filter) -> Result<DeleteResult> {
        let conn = self.open()?;
        let (where_clause, values) = filter.to_sql();
        let sql =
            format!("DELETE FROM tasks WHERE id = (SELECT id FROM tasks {where_clause} LIMIT 1)");

        let params: Vec<&dyn ToSql> = values.iter().map(AsRef::as_ref).collect();
        let rows = conn.execute(&sql, params.as_slice())?;
        debug!(?filter, rows, "delete_one");

        Ok(DeleteResult { deleted_count: rows as u64 })
    }

    fn drop_collection(&self) -> Result<()> {
        let conn = self.open()?;
        let rows = conn.execute("DELETE FROM tasks", [])?;
        debug!(rows, "drop_collection");
        Ok(())
    }
}
