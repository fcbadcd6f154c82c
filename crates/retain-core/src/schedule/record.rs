//! Review Schedule aggregate and the append-only study record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::state::ReviewState;
use crate::sm2::Feedback;

// ============================================================================
// REVIEW SCHEDULE
// ============================================================================

/// Aggregate root for one student-problem pair's review lifecycle.
///
/// Created the first time a student reviews a problem, mutated exclusively by
/// the queue service applying the scheduling policy. `version` implements the
/// optimistic-concurrency guard: saving with a stale version is rejected by
/// the repository so concurrent submissions for the same pair can never lose
/// an update. Version 0 marks a schedule that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewSchedule {
    /// The student this schedule belongs to
    pub student_id: String,
    /// The problem being reviewed
    pub problem_id: String,
    /// Current scheduling state
    pub state: ReviewState,
    /// "again"/"hard" streak; reset by any passing feedback
    pub consecutive_failures: u32,
    /// Optimistic concurrency counter (0 = never persisted)
    pub version: i64,
    /// When the pair first entered spaced repetition
    pub created_at: DateTime<Utc>,
    /// When the schedule last changed
    pub updated_at: DateTime<Utc>,
}

impl ReviewSchedule {
    /// Start a fresh, unpersisted schedule for a pair
    pub fn new(
        student_id: impl Into<String>,
        problem_id: impl Into<String>,
        state: ReviewState,
        now: DateTime<Utc>,
    ) -> Self {
        ReviewSchedule {
            student_id: student_id.into(),
            problem_id: problem_id.into(),
            state,
            consecutive_failures: 0,
            version: 0,
            created_at: now,
            updated_at: now,
        }
    }
}

// ============================================================================
// STUDY RECORD
// ============================================================================

/// One review attempt, logged as a side effect of feedback submission.
///
/// Append-only: never mutated or deleted by this engine. Retention and
/// archival are the surrounding system's concern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyRecord {
    /// Unique identifier (UUID v4)
    pub id: String,
    /// The student who reviewed
    pub student_id: String,
    /// The problem reviewed
    pub problem_id: String,
    /// Feedback the student gave
    pub feedback: Feedback,
    /// Whether the attempt counts as a pass (everything but "again")
    pub is_correct: bool,
    /// Time the student took, if the caller measured it
    pub response_time_ms: Option<i64>,
    /// What the student answered, if the caller captured it
    pub answer_content: Option<String>,
    /// When the attempt happened
    pub created_at: DateTime<Utc>,
}

impl StudyRecord {
    /// Create a record for one attempt, deriving correctness from feedback
    pub fn new(
        student_id: impl Into<String>,
        problem_id: impl Into<String>,
        feedback: Feedback,
        response_time_ms: Option<i64>,
        answer_content: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        StudyRecord {
            id: Uuid::new_v4().to_string(),
            student_id: student_id.into(),
            problem_id: problem_id.into(),
            feedback,
            is_correct: feedback.is_pass(),
            response_time_ms,
            answer_content,
            created_at: now,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
