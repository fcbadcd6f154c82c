//! SQLite Repository Implementation
//!
//! Reference implementation of the schedule and study-record repositories.
//! Separate reader/writer connections for interior mutability: all methods
//! take `&self`, so the store is `Send + Sync` and callers can share an
//! `Arc<SqliteStore>` without an outer mutex.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::queue::{ScheduleRepository, StudyRecordRepository};
use crate::schedule::{ReviewSchedule, ReviewState, StudyRecord};
use crate::sm2::Feedback;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// A concurrent writer already advanced this schedule; re-read and retry
    #[error("stale version for schedule ({student_id}, {problem_id})")]
    Conflict {
        /// The student of the contested pair
        student_id: String,
        /// The problem of the contested pair
        problem_id: String,
    },
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

// ============================================================================
// STORE
// ============================================================================

/// SQLite-backed schedule and study-record store
pub struct SqliteStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
}

impl SqliteStore {
    /// Apply PRAGMAs to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;
        Ok(())
    }

    /// Create a new store, defaulting to the platform data directory
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("dev", "retain", "core").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;
                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                data_dir.join("retain.db")
            }
        };

        let writer = Connection::open(&path)?;
        Self::configure_connection(&writer)?;
        super::migrations::apply_migrations(&writer)?;

        let reader = Connection::open(&path)?;
        Self::configure_connection(&reader)?;

        Ok(SqliteStore {
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        })
    }

    fn reader(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))
    }

    fn writer(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))
    }

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Invalid {} timestamp '{}': {}", field_name, value, e),
                    )),
                )
            })
    }

    /// Convert a row to ReviewSchedule, re-validating state invariants at
    /// the persistence boundary
    fn row_to_schedule(row: &rusqlite::Row) -> rusqlite::Result<ReviewSchedule> {
        let last_reviewed_at: Option<String> = row.get("last_reviewed_at")?;
        let last_reviewed_at = match last_reviewed_at {
            Some(s) => Some(Self::parse_timestamp(&s, "last_reviewed_at")?),
            None => None,
        };
        let next_review_at: String = row.get("next_review_at")?;
        let next_review_at = Self::parse_timestamp(&next_review_at, "next_review_at")?;

        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        let state = ReviewState::from_raw(
            row.get("interval_days")?,
            row.get("ease_factor")?,
            row.get("review_count")?,
            last_reviewed_at,
            Some(next_review_at),
        )
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Null,
                Box::new(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!("Invalid review state: {}", e),
                )),
            )
        })?;

        let consecutive_failures: i64 = row.get("consecutive_failures")?;

        Ok(ReviewSchedule {
            student_id: row.get("student_id")?,
            problem_id: row.get("problem_id")?,
            state,
            consecutive_failures: consecutive_failures.max(0) as u32,
            version: row.get("version")?,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
            updated_at: Self::parse_timestamp(&updated_at, "updated_at")?,
        })
    }

    fn insert_schedule(&self, schedule: &ReviewSchedule) -> Result<ReviewSchedule> {
        let writer = self.writer()?;
        let inserted = writer.execute(
            "INSERT INTO review_schedules (
                student_id, problem_id,
                interval_days, ease_factor, review_count, consecutive_failures,
                last_reviewed_at, next_review_at,
                version, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?10)",
            params![
                schedule.student_id,
                schedule.problem_id,
                i64::from(schedule.state.interval.days()),
                schedule.state.ease_factor.value(),
                i64::from(schedule.state.review_count),
                i64::from(schedule.consecutive_failures),
                schedule.state.last_reviewed_at.map(|t| t.to_rfc3339()),
                schedule.state.next_review_at.to_rfc3339(),
                schedule.created_at.to_rfc3339(),
                schedule.updated_at.to_rfc3339(),
            ],
        );

        match inserted {
            Ok(_) => {
                let mut saved = schedule.clone();
                saved.version = 1;
                Ok(saved)
            }
            // Another writer created the pair first; the unique (student,
            // problem) key turns that race into a retryable conflict
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StorageError::Conflict {
                    student_id: schedule.student_id.clone(),
                    problem_id: schedule.problem_id.clone(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update_schedule(&self, schedule: &ReviewSchedule) -> Result<ReviewSchedule> {
        let writer = self.writer()?;
        let rows = writer.execute(
            "UPDATE review_schedules SET
                interval_days = ?1,
                ease_factor = ?2,
                review_count = ?3,
                consecutive_failures = ?4,
                last_reviewed_at = ?5,
                next_review_at = ?6,
                version = version + 1,
                updated_at = ?7
            WHERE student_id = ?8 AND problem_id = ?9 AND version = ?10",
            params![
                i64::from(schedule.state.interval.days()),
                schedule.state.ease_factor.value(),
                i64::from(schedule.state.review_count),
                i64::from(schedule.consecutive_failures),
                schedule.state.last_reviewed_at.map(|t| t.to_rfc3339()),
                schedule.state.next_review_at.to_rfc3339(),
                schedule.updated_at.to_rfc3339(),
                schedule.student_id,
                schedule.problem_id,
                schedule.version,
            ],
        )?;

        if rows == 0 {
            return Err(StorageError::Conflict {
                student_id: schedule.student_id.clone(),
                problem_id: schedule.problem_id.clone(),
            });
        }

        let mut saved = schedule.clone();
        saved.version += 1;
        Ok(saved)
    }
}

// ============================================================================
// REPOSITORY IMPLS
// ============================================================================

impl ScheduleRepository for SqliteStore {
    fn find_by_student_and_problem(
        &self,
        student_id: &str,
        problem_id: &str,
    ) -> Result<Option<ReviewSchedule>> {
        let reader = self.reader()?;
        let mut stmt = reader
            .prepare("SELECT * FROM review_schedules WHERE student_id = ?1 AND problem_id = ?2")?;

        let schedule = stmt
            .query_row(params![student_id, problem_id], |row| {
                Self::row_to_schedule(row)
            })
            .optional()?;
        Ok(schedule)
    }

    fn find_due_reviews(
        &self,
        student_id: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ReviewSchedule>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM review_schedules
             WHERE student_id = ?1 AND next_review_at <= ?2
             ORDER BY next_review_at ASC, ease_factor ASC",
        )?;

        let schedules = stmt.query_map(params![student_id, cutoff.to_rfc3339()], |row| {
            Self::row_to_schedule(row)
        })?;

        let mut result = Vec::new();
        for schedule in schedules {
            result.push(schedule?);
        }
        Ok(result)
    }

    fn save(&self, schedule: &ReviewSchedule) -> Result<ReviewSchedule> {
        if schedule.version == 0 {
            self.insert_schedule(schedule)
        } else {
            self.update_schedule(schedule)
        }
    }

    fn delete(&self, student_id: &str, problem_id: &str) -> Result<bool> {
        let writer = self.writer()?;
        let rows = writer.execute(
            "DELETE FROM review_schedules WHERE student_id = ?1 AND problem_id = ?2",
            params![student_id, problem_id],
        )?;
        Ok(rows > 0)
    }
}

impl StudyRecordRepository for SqliteStore {
    fn append(&self, record: &StudyRecord) -> Result<()> {
        let writer = self.writer()?;
        writer.execute(
            "INSERT INTO study_records (
                id, student_id, problem_id, feedback, is_correct,
                response_time_ms, answer_content, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                record.id,
                record.student_id,
                record.problem_id,
                record.feedback.as_str(),
                record.is_correct as i64,
                record.response_time_ms,
                record.answer_content,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

impl SqliteStore {
    /// Load a pair's study history, newest first (diagnostics and tests;
    /// the engine itself never reads records back)
    pub fn study_records(&self, student_id: &str, problem_id: &str) -> Result<Vec<StudyRecord>> {
        let reader = self.reader()?;
        let mut stmt = reader.prepare(
            "SELECT * FROM study_records
             WHERE student_id = ?1 AND problem_id = ?2
             ORDER BY created_at DESC",
        )?;

        let records = stmt.query_map(params![student_id, problem_id], |row| {
            let feedback: String = row.get("feedback")?;
            let feedback = Feedback::parse(&feedback).map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        e.to_string(),
                    )),
                )
            })?;
            let created_at: String = row.get("created_at")?;

            Ok(StudyRecord {
                id: row.get("id")?,
                student_id: row.get("student_id")?,
                problem_id: row.get("problem_id")?,
                feedback,
                is_correct: row.get::<_, i64>("is_correct")? != 0,
                response_time_ms: row.get("response_time_ms")?,
                answer_content: row.get("answer_content")?,
                created_at: Self::parse_timestamp(&created_at, "created_at")?,
            })
        })?;

        let mut result = Vec::new();
        for record in records {
            result.push(record?);
        }
        Ok(result)
    }
}

// ============================================================================
// TESTS
// ============================================================================
