//! Task model types for the task list.

use serde::{Deserialize, Serialize};

use crate::tasks::store::Projection;

/// A to-do record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier, assigned by the service as `max(id) + 1`.
    pub id: i64,
    /// What needs doing. Unique across tasks by convention, not by storage.
    pub description: String,
    /// `false` while pending, `true` once done.
    pub status: bool,
}

impl Task {
    /// Create a task value.
    #[must_use]
    pub fn new(id: i64, description: impl Into<String>, status: bool) -> Self {
        Self { id, description: description.into(), status }
    }
}

/// A task field, used to build projections and sorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    /// The integer key.
    Id,
    /// The description text.
    Description,
    /// The done flag.
    Status,
}

impl Field {
    /// Every field, in column order.
    pub const ALL: [Self; 3] = [Self::Id, Self::Description, Self::Status];

    /// Column name in the `tasks` table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::Description => "description",
            Self::Status => "status",
        }
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A task as returned by a projected query.
///
/// Fields left out of the projection are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDocument {
    /// The integer key, if projected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    /// The description, if projected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The done flag, if projected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
}

impl TaskDocument {
    /// Keep only the fields named by `projection`.
    #[must_use]
    pub fn project(task: Task, projection: &Projection) -> Self {
        Self {
            id: projection.includes(Field::Id).then_some(task.id),
            description: projection.includes(Field::Description).then_some(task.description),
            status: projection.includes(Field::Status).then_some(task.status),
        }
    }

    /// Convert back into a full task. Returns `None` if any field was projected away.
    #[must_use]
    pub fn into_task(self) -> Option<Task> {
        Some(Task { id: self.id?, description: self.description?, status: self.status? })
    }
}

impl From<Task> for TaskDocument {
    fn from(task: Task) -> Self {
        Self { id: Some(task.id), description: Some(task.description), status: Some(task.status) }
    }
}

/// Interpret the `status` form field.
///
/// A checked HTML checkbox submits `on`; programmatic clients send `True`.
/// Everything else, including a missing field, means pending.
#[must_use]
pub fn parse_status(value: Option<&str>) -> bool {
    matches!(value, Some("on" | "True"))
}
