//! Storage Module
//!
//! SQLite reference implementation of the repository capabilities:
//! - Versioned schema migrations on `user_version`
//! - Optimistic version-checked schedule writes (the lost-update guard)
//! - Append-only study-record log

mod migrations;
mod sqlite;

pub use migrations::{apply_migrations, Migration, MIGRATIONS};
pub use sqlite::{Result, SqliteStore, StorageError};
