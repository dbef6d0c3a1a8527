//! # `tasklist_web`
//!
//! A small task-list web application. Tasks live in a document-style store
//! (`SQLite` or in-memory) and are managed through server-rendered pages.

#[cfg(feature = "server")]
pub mod cli;
pub mod config;
pub mod error;
#[cfg(feature = "server")]
pub mod logging;
pub mod service;
pub mod tasks;
pub mod templates;
pub mod testing;
#[cfg(feature = "server")]
pub mod web;

pub use error::{Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
