//! Review Queue Module
//!
//! The orchestration layer of the engine:
//! - Repository capabilities the surrounding system supplies
//! - The `ReviewQueueService` (due/today/overdue queries, feedback
//!   application, study-record logging, event emission)
//! - The review error taxonomy

mod service;

pub use service::{
    Result, ReviewError, ReviewInput, ReviewQueueService, ScheduleRepository,
    StudyRecordRepository, NOTIFY_HORIZON_DAYS,
};
