//! Domain events emitted by the review queue service.
//!
//! Events are consumed asynchronously by excluded subsystems (notification
//! dispatch, study analytics). Delivery is at-least-once handoff: a sink that
//! fails to accept an event synchronously leaves it for an external
//! dispatcher, it never rolls back the persisted review.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

use crate::schedule::ReviewState;
use crate::sm2::Feedback;

// ============================================================================
// EVENTS
// ============================================================================

/// Event raised while applying review feedback
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ReviewEvent {
    /// A review attempt was applied and persisted
    ReviewCompleted {
        /// The student who reviewed
        student_id: String,
        /// The problem reviewed
        problem_id: String,
        /// Feedback that was applied
        feedback: Feedback,
        /// Snapshot of the scheduling state after application
        state: ReviewState,
        /// When the review happened
        occurred_at: DateTime<Utc>,
    },
    /// The new next-review instant is near enough to warrant a notification
    ReviewNotificationScheduled {
        /// The student to notify
        student_id: String,
        /// The problem that will be due
        problem_id: String,
        /// When the item comes due
        notify_at: DateTime<Utc>,
        /// When the triggering review happened
        occurred_at: DateTime<Utc>,
    },
}

// ============================================================================
// SINK
// ============================================================================

/// Synchronous event delivery failed; the event should be queued for
/// asynchronous at-least-once redelivery by the surrounding system
#[derive(Debug, Clone, thiserror::Error)]
#[error("event delivery failed: {0}")]
pub struct EventDeliveryError(pub String);

/// Where the queue service hands events off to
pub trait EventSink: Send + Sync {
    /// Accept one event. Failure is reported but never fails the review.
    fn publish(&self, event: ReviewEvent) -> Result<(), EventDeliveryError>;
}

impl<T: EventSink + ?Sized> EventSink for Arc<T> {
    fn publish(&self, event: ReviewEvent) -> Result<(), EventDeliveryError> {
        (**self).publish(event)
    }
}

/// In-process sink that buffers events until an external dispatcher drains
/// them. Also the standard capture point in tests.
#[derive(Debug, Default)]
pub struct BufferedEventSink {
    events: Mutex<Vec<ReviewEvent>>,
}

impl BufferedEventSink {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Take everything buffered so far
    pub fn drain(&self) -> Vec<ReviewEvent> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of undelivered events
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ReviewEvent>> {
        self.events.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl EventSink for BufferedEventSink {
    fn publish(&self, event: ReviewEvent) -> Result<(), EventDeliveryError> {
        self.lock().push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{EaseFactor, ReviewInterval};
    use chrono::TimeZone;

    #[test]
    fn test_buffered_sink_collects_and_drains() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let sink = BufferedEventSink::new();
        assert!(sink.is_empty());

        sink.publish(ReviewEvent::ReviewNotificationScheduled {
            student_id: "s".into(),
            problem_id: "p".into(),
            notify_at: now,
            occurred_at: now,
        })
        .unwrap();

        assert_eq!(sink.len(), 1);
        let drained = sink.drain();
        assert_eq!(drained.len(), 1);
        assert!(sink.is_empty());
    }

    #[test]
    fn test_event_wire_shape() {
        let now = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        let event = ReviewEvent::ReviewCompleted {
            student_id: "student-1".into(),
            problem_id: "problem-9".into(),
            feedback: Feedback::Good,
            state: ReviewState::new(
                ReviewInterval::new(1),
                EaseFactor::default(),
                1,
                Some(now),
                now + chrono::Duration::days(1),
            ),
            occurred_at: now,
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "reviewCompleted");
        assert_eq!(json["studentId"], "student-1");
        assert_eq!(json["state"]["reviewCount"], 1);
    }
}
