//! Database Migrations
//!
//! Schema migration definitions for the SQLite repository.

use rusqlite::Connection;

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: review schedules and study records",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Covering index for due-queue ordering",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: i64,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS review_schedules (
    student_id TEXT NOT NULL,
    problem_id TEXT NOT NULL,

    -- Scheduling state
    interval_days INTEGER NOT NULL DEFAULT 0,
    ease_factor REAL NOT NULL DEFAULT 2.5,
    review_count INTEGER NOT NULL DEFAULT 0,
    consecutive_failures INTEGER NOT NULL DEFAULT 0,
    last_reviewed_at TEXT,
    next_review_at TEXT NOT NULL,

    -- Optimistic concurrency
    version INTEGER NOT NULL DEFAULT 1,

    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,

    PRIMARY KEY (student_id, problem_id)
);

CREATE INDEX IF NOT EXISTS idx_schedules_due ON review_schedules(student_id, next_review_at);

-- Append-only review attempt log
CREATE TABLE IF NOT EXISTS study_records (
    id TEXT PRIMARY KEY,
    student_id TEXT NOT NULL,
    problem_id TEXT NOT NULL,
    feedback TEXT NOT NULL,
    is_correct INTEGER NOT NULL,
    response_time_ms INTEGER,
    answer_content TEXT,
    created_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_records_pair ON study_records(student_id, problem_id);
CREATE INDEX IF NOT EXISTS idx_records_created ON study_records(created_at);
"#;

/// V2: The due queue orders by next_review_at then ease_factor; let the
/// index cover both
const MIGRATION_V2_UP: &str = r#"
CREATE INDEX IF NOT EXISTS idx_schedules_queue
    ON review_schedules(student_id, next_review_at, ease_factor);
"#;

/// Apply all pending migrations, tracking progress in `user_version`
pub fn apply_migrations(conn: &Connection) -> rusqlite::Result<()> {
    let current: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

    for migration in MIGRATIONS.iter().filter(|m| m.version > current) {
        conn.execute_batch(migration.up)?;
        conn.pragma_update(None, "user_version", migration.version)?;
        tracing::debug!(
            version = migration.version,
            description = migration.description,
            "applied migration"
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations_are_ordered_and_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        apply_migrations(&conn).unwrap();
        let version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(version, MIGRATIONS.last().unwrap().version);

        // Re-applying is a no-op
        apply_migrations(&conn).unwrap();

        for pair in MIGRATIONS.windows(2) {
            assert!(pair[0].version < pair[1].version);
        }
    }
}
