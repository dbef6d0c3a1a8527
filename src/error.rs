//! Error types for `tasklist_web`.

use std::path::PathBuf;

/// Errors that can occur while serving or storing tasks.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// User input was rejected.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// No task has the requested id.
    #[error("Task not found: {0}")]
    NotFound(i64),

    /// A task with this id already exists in the store.
    #[error("Duplicate key: a task with id {0} already exists")]
    DuplicateKey(i64),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A `SQLite` database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// The in-memory store is unusable (a writer panicked mid-operation).
    #[error("Store error: {0}")]
    Store(String),

    /// A YAML parsing error occurred.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A template error occurred.
    #[error("Template error: {0}")]
    Template(String),

    /// A configuration value was invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The configuration file was not found.
    #[error("Config file not found: {0}")]
    ConfigNotFound(PathBuf),

    /// The log subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(String),

    /// A blocking store call panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Join(String),
}

/// Reasons a task description is rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The description was empty or missing.
    #[error("A task description is required. Fill in the Description field.")]
    EmptyDescription,

    /// Another task already uses this description.
    #[error(
        "A task with the description '{description}' already exists (task {id}). Choose another description."
    )]
    DuplicateDescription {
        /// Id of the task that already holds the description.
        id: i64,
        /// The conflicting description.
        description: String,
    },
}

impl From<tera::Error> for Error {
    fn from(e: tera::Error) -> Self {
        // tera's Display only shows the outermost message
        let mut message = e.to_string();
        let mut source = std::error::Error::source(&e);
        while let Some(inner) = source {
            message.push_str(": ");
            message.push_str(&inner.to_string());
            source = inner.source();
        }
        Self::Template(message)
    }
}

/// A specialized Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
