//! Test environment: SQLite store on a temp dir, pinned clock, buffered sink

use chrono::{DateTime, TimeZone, Utc};
use retain_core::{BufferedEventSink, ReviewInput, ReviewQueueService, SqliteStore, TestClock};
use std::sync::Arc;
use tempfile::TempDir;

/// Service wired to real storage with deterministic time
pub type E2eService =
    ReviewQueueService<Arc<SqliteStore>, Arc<SqliteStore>, Arc<TestClock>, Arc<BufferedEventSink>>;

/// One test's world
pub struct TestEnv {
    /// The service under test
    pub service: E2eService,
    /// Shared handle to the service's clock
    pub clock: Arc<TestClock>,
    /// Shared handle to the service's event sink
    pub events: Arc<BufferedEventSink>,
    /// Direct store access for assertions
    pub store: Arc<SqliteStore>,
    _dir: TempDir,
}

/// 2026-01-10 09:00 UTC, the reference "day 0" of the journeys
pub fn day0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 10, 9, 0, 0).unwrap()
}

/// Build a fresh environment on a temp database
pub fn test_env() -> TestEnv {
    let dir = TempDir::new().expect("temp dir");
    let store =
        Arc::new(SqliteStore::new(Some(dir.path().join("retain.db"))).expect("open store"));
    let clock = Arc::new(TestClock::new(day0()));
    let events = Arc::new(BufferedEventSink::new());

    let service = ReviewQueueService::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::clone(&clock),
        Arc::clone(&events),
    );

    TestEnv {
        service,
        clock,
        events,
        store,
        _dir: dir,
    }
}

/// Shorthand for a feedback submission
pub fn feedback(student: &str, problem: &str, level: &str) -> ReviewInput {
    ReviewInput {
        student_id: student.to_string(),
        problem_id: problem.to_string(),
        feedback: level.to_string(),
        response_time_ms: Some(2500),
        answer_content: None,
    }
}
