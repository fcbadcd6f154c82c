//! Review queue orchestration over the repository and clock boundaries

use chrono::{DateTime, Duration, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clock::Clock;
use crate::events::{EventSink, ReviewEvent};
use crate::schedule::{ReviewSchedule, StudyRecord, ValidationError};
use crate::sm2::{Feedback, Sm2Policy};
use crate::storage::StorageError;

/// A review landing within this many days of the feedback instant schedules
/// a near-term notification
pub const NOTIFY_HORIZON_DAYS: u32 = 1;

/// Optimistic-concurrency retry budget for one feedback submission
const MAX_SAVE_ATTEMPTS: u32 = 3;

// ============================================================================
// REPOSITORY CAPABILITIES
// ============================================================================

/// Persistence capability for review schedules.
///
/// Repositories only load and store; they never apply policy. `save` must
/// serialize concurrent writers on the same (student, problem) pair by
/// rejecting stale versions with [`StorageError::Conflict`].
pub trait ScheduleRepository: Send + Sync {
    /// Load the schedule for a pair, if the student has one
    fn find_by_student_and_problem(
        &self,
        student_id: &str,
        problem_id: &str,
    ) -> std::result::Result<Option<ReviewSchedule>, StorageError>;

    /// All of a student's schedules with next_review_at <= cutoff, in any
    /// order (the service enforces queue ordering)
    fn find_due_reviews(
        &self,
        student_id: &str,
        cutoff: DateTime<Utc>,
    ) -> std::result::Result<Vec<ReviewSchedule>, StorageError>;

    /// Persist a schedule, returning the stored copy with its new version.
    /// A version mismatch is a [`StorageError::Conflict`].
    fn save(&self, schedule: &ReviewSchedule) -> std::result::Result<ReviewSchedule, StorageError>;

    /// Remove a schedule (administrative cleanup). Returns whether it existed.
    fn delete(&self, student_id: &str, problem_id: &str) -> std::result::Result<bool, StorageError>;
}

/// Append-only persistence capability for study records
pub trait StudyRecordRepository: Send + Sync {
    /// Append one review attempt to the log
    fn append(&self, record: &StudyRecord) -> std::result::Result<(), StorageError>;
}

impl<T: ScheduleRepository + ?Sized> ScheduleRepository for Arc<T> {
    fn find_by_student_and_problem(
        &self,
        student_id: &str,
        problem_id: &str,
    ) -> std::result::Result<Option<ReviewSchedule>, StorageError> {
        (**self).find_by_student_and_problem(student_id, problem_id)
    }

    fn find_due_reviews(
        &self,
        student_id: &str,
        cutoff: DateTime<Utc>,
    ) -> std::result::Result<Vec<ReviewSchedule>, StorageError> {
        (**self).find_due_reviews(student_id, cutoff)
    }

    fn save(&self, schedule: &ReviewSchedule) -> std::result::Result<ReviewSchedule, StorageError> {
        (**self).save(schedule)
    }

    fn delete(&self, student_id: &str, problem_id: &str) -> std::result::Result<bool, StorageError> {
        (**self).delete(student_id, problem_id)
    }
}

impl<T: StudyRecordRepository + ?Sized> StudyRecordRepository for Arc<T> {
    fn append(&self, record: &StudyRecord) -> std::result::Result<(), StorageError> {
        (**self).append(record)
    }
}

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Review queue error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum ReviewError {
    /// Malformed input (unrecognized feedback, invalid raw values)
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),
    /// The pair has no schedule where one was required
    #[error("no review schedule for student {student_id} and problem {problem_id}")]
    NotFound {
        /// The student looked up
        student_id: String,
        /// The problem looked up
        problem_id: String,
    },
    /// Repository call failed; retry policy belongs to the caller
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Review queue result type
pub type Result<T> = std::result::Result<T, ReviewError>;

// ============================================================================
// INPUT
// ============================================================================

/// One feedback submission from the use-case layer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
    /// The reviewing student
    pub student_id: String,
    /// The reviewed problem
    pub problem_id: String,
    /// Raw feedback level: "again", "hard", "good" or "easy"
    pub feedback: String,
    /// Time the student took, if measured
    pub response_time_ms: Option<i64>,
    /// What the student answered, if captured
    pub answer_content: Option<String>,
}

// ============================================================================
// SERVICE
// ============================================================================

/// Orchestrates policy application against persisted schedules.
///
/// The only mutator of [`ReviewSchedule`]s: queries are pure reads, and
/// `submit_feedback` runs the read-modify-write cycle with bounded optimistic
/// retries, appends the study record, and hands events to the sink.
pub struct ReviewQueueService<R, L, C, E> {
    schedules: R,
    records: L,
    clock: C,
    events: E,
    policy: Sm2Policy,
}

impl<R, L, C, E> ReviewQueueService<R, L, C, E>
where
    R: ScheduleRepository,
    L: StudyRecordRepository,
    C: Clock,
    E: EventSink,
{
    /// Create a service with the default SM-2 parameters
    pub fn new(schedules: R, records: L, clock: C, events: E) -> Self {
        Self::with_policy(schedules, records, clock, events, Sm2Policy::default())
    }

    /// Create a service with a custom policy
    pub fn with_policy(schedules: R, records: L, clock: C, events: E, policy: Sm2Policy) -> Self {
        ReviewQueueService {
            schedules,
            records,
            clock,
            events,
            policy,
        }
    }

    /// The active scheduling policy
    pub fn policy(&self) -> &Sm2Policy {
        &self.policy
    }

    /// Schedules due at `as_of` (next_review_at <= as_of), hardest first:
    /// ordered by next_review_at ascending, then ease factor ascending
    pub fn due_reviews(&self, student_id: &str, as_of: DateTime<Utc>) -> Result<Vec<ReviewSchedule>> {
        let items = self.schedules.find_due_reviews(student_id, as_of)?;
        Ok(into_queue_order(items))
    }

    /// Schedules due by the end of `as_of`'s UTC calendar day, same ordering
    pub fn today_reviews(
        &self,
        student_id: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<ReviewSchedule>> {
        let cutoff = start_of_next_day(as_of);
        let mut items = self.schedules.find_due_reviews(student_id, cutoff)?;
        items.retain(|s| s.state.next_review_at < cutoff);
        Ok(into_queue_order(items))
    }

    /// Schedules that were already due before `as_of`'s day began, i.e.
    /// strictly before yesterday's end, same ordering
    pub fn overdue_reviews(
        &self,
        student_id: &str,
        as_of: DateTime<Utc>,
    ) -> Result<Vec<ReviewSchedule>> {
        let cutoff = start_of_day(as_of);
        let mut items = self.schedules.find_due_reviews(student_id, cutoff)?;
        items.retain(|s| s.state.next_review_at < cutoff);
        Ok(into_queue_order(items))
    }

    /// Load the schedule for a pair, failing with NotFound if the student has
    /// never reviewed the problem
    pub fn get_schedule(&self, student_id: &str, problem_id: &str) -> Result<ReviewSchedule> {
        self.schedules
            .find_by_student_and_problem(student_id, problem_id)?
            .ok_or_else(|| ReviewError::NotFound {
                student_id: student_id.to_string(),
                problem_id: problem_id.to_string(),
            })
    }

    /// Apply one feedback submission.
    ///
    /// Loads (or creates, on first encounter) the pair's schedule, applies
    /// the policy, persists with optimistic retries on version conflicts,
    /// appends the study record, and emits `ReviewCompleted` plus, for
    /// near-term reviews, `ReviewNotificationScheduled`. Event delivery
    /// failures are logged and never undo the persisted write.
    pub fn submit_feedback(&self, input: &ReviewInput) -> Result<ReviewSchedule> {
        let feedback = Feedback::parse(&input.feedback)?;
        let now = self.clock.now();

        let mut attempts = 0;
        let saved = loop {
            attempts += 1;

            let mut schedule = match self
                .schedules
                .find_by_student_and_problem(&input.student_id, &input.problem_id)?
            {
                Some(existing) => existing,
                None => ReviewSchedule::new(
                    input.student_id.clone(),
                    input.problem_id.clone(),
                    self.policy.initial_state(now),
                    now,
                ),
            };

            let transition =
                self.policy
                    .apply(&schedule.state, schedule.consecutive_failures, feedback, now);
            schedule.state = transition.state;
            schedule.consecutive_failures = transition.consecutive_failures;
            schedule.updated_at = now;

            match self.schedules.save(&schedule) {
                Ok(saved) => break saved,
                Err(StorageError::Conflict { .. }) if attempts < MAX_SAVE_ATTEMPTS => {
                    tracing::warn!(
                        student_id = %input.student_id,
                        problem_id = %input.problem_id,
                        attempts,
                        "concurrent schedule update, retrying"
                    );
                }
                Err(e) => return Err(e.into()),
            }
        };

        let record = StudyRecord::new(
            input.student_id.clone(),
            input.problem_id.clone(),
            feedback,
            input.response_time_ms,
            input.answer_content.clone(),
            now,
        );
        self.records.append(&record)?;

        self.emit(ReviewEvent::ReviewCompleted {
            student_id: saved.student_id.clone(),
            problem_id: saved.problem_id.clone(),
            feedback,
            state: saved.state,
            occurred_at: now,
        });

        if saved.state.interval.days() <= NOTIFY_HORIZON_DAYS {
            self.emit(ReviewEvent::ReviewNotificationScheduled {
                student_id: saved.student_id.clone(),
                problem_id: saved.problem_id.clone(),
                notify_at: saved.state.next_review_at,
                occurred_at: now,
            });
        }

        tracing::debug!(
            student_id = %saved.student_id,
            problem_id = %saved.problem_id,
            feedback = %feedback,
            interval_days = saved.state.interval.days(),
            review_count = saved.state.review_count,
            "review applied"
        );

        Ok(saved)
    }

    /// Remove a pair's schedule (administrative cleanup)
    pub fn delete_schedule(&self, student_id: &str, problem_id: &str) -> Result<bool> {
        Ok(self.schedules.delete(student_id, problem_id)?)
    }

    fn emit(&self, event: ReviewEvent) {
        if let Err(e) = self.events.publish(event) {
            tracing::warn!(error = %e, "event delivery failed, left for async dispatch");
        }
    }
}

// ============================================================================
// DAY-GRANULARITY CUTOFFS
// ============================================================================

/// Midnight starting `at`'s UTC calendar day
fn start_of_day(at: DateTime<Utc>) -> DateTime<Utc> {
    at.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Midnight ending `at`'s UTC calendar day
fn start_of_next_day(at: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(at) + Duration::days(1)
}

/// Queue order: soonest due first, harder (lower ease) items first on ties
fn into_queue_order(mut items: Vec<ReviewSchedule>) -> Vec<ReviewSchedule> {
    items.sort_by(|a, b| {
        a.state
            .next_review_at
            .cmp(&b.state.next_review_at)
            .then(a.state.ease_factor.value().total_cmp(&b.state.ease_factor.value()))
    });
    items
}

// ============================================================================
// TESTS
// ============================================================================
