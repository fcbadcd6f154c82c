//! Schedule Module
//!
//! Data model for the scheduling engine:
//! - Validated value types (interval, ease factor, review state)
//! - The `ReviewSchedule` aggregate keyed by (student, problem)
//! - Append-only `StudyRecord` log entries

mod record;
mod state;

pub use record::{ReviewSchedule, StudyRecord};
pub use state::{
    EaseFactor, ReviewInterval, ReviewPhase, ReviewState, ValidationError, DEFAULT_EASE_FACTOR,
    MATURE_INTERVAL_DAYS, MIN_EASE_FACTOR,
};
