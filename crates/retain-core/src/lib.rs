//! # Retain Core
//!
//! Spaced-repetition review scheduling engine for education backends:
//!
//! - **SM-2 family policy**: pure interval/ease-factor transitions over
//!   four-level feedback (again/hard/good/easy), ease floored at 1.3
//! - **Review queues**: due, today, and overdue views per student, ordered
//!   soonest-due first and hardest first on ties
//! - **Study records**: append-only log of every review attempt
//! - **Domain events**: `ReviewCompleted` and `ReviewNotificationScheduled`
//!   handed to an at-least-once sink
//! - **Deterministic time**: every operation reads a `Clock`, so tests pin
//!   and advance time explicitly
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use retain_core::{ReviewInput, ReviewQueueService, SqliteStore, SystemClock, BufferedEventSink};
//! use std::sync::Arc;
//!
//! let store = Arc::new(SqliteStore::new(None)?);
//! let service = ReviewQueueService::new(
//!     Arc::clone(&store),
//!     Arc::clone(&store),
//!     SystemClock,
//!     BufferedEventSink::new(),
//! );
//!
//! // Apply a student's feedback for one problem
//! let schedule = service.submit_feedback(&ReviewInput {
//!     student_id: "student-1".into(),
//!     problem_id: "problem-42".into(),
//!     feedback: "good".into(),
//!     ..Default::default()
//! })?;
//!
//! // What should the student work on right now?
//! let due = service.due_reviews("student-1", chrono::Utc::now())?;
//! ```
//!
//! ## Concurrency model
//!
//! Request/response, no internal threading. Concurrent submissions for the
//! same (student, problem) pair are serialized through optimistic versioning
//! at the repository: a stale write is rejected and retried, so no update is
//! ever silently lost. Queue reads are lock-free and may go stale; a review
//! coming due between read and display is expected.

#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod clock;
pub mod events;
pub mod queue;
pub mod schedule;
pub mod sm2;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Data model
pub use schedule::{
    EaseFactor, ReviewInterval, ReviewPhase, ReviewSchedule, ReviewState, StudyRecord,
    ValidationError, DEFAULT_EASE_FACTOR, MATURE_INTERVAL_DAYS, MIN_EASE_FACTOR,
};

// Scheduling policy
pub use sm2::{Feedback, ScheduleTransition, Sm2Params, Sm2Policy};

// Queue service
pub use queue::{
    Result, ReviewError, ReviewInput, ReviewQueueService, ScheduleRepository,
    StudyRecordRepository, NOTIFY_HORIZON_DAYS,
};

// Time and events
pub use clock::{Clock, SystemClock, TestClock};
pub use events::{BufferedEventSink, EventDeliveryError, EventSink, ReviewEvent};

// Storage layer
pub use storage::{SqliteStore, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        BufferedEventSink, Clock, EaseFactor, EventSink, Feedback, Result, ReviewError,
        ReviewEvent, ReviewInput, ReviewInterval, ReviewPhase, ReviewQueueService, ReviewSchedule,
        ReviewState, ScheduleRepository, Sm2Params, Sm2Policy, SqliteStore, StorageError,
        StudyRecord, StudyRecordRepository, SystemClock, TestClock,
    };
}
