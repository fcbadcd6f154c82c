//! SM-2 transition function and its tunable parameters

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::schedule::{
    EaseFactor, ReviewInterval, ReviewState, ValidationError, DEFAULT_EASE_FACTOR,
};

// ============================================================================
// FEEDBACK
// ============================================================================

/// Four-level feedback a student gives after a review attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feedback {
    /// Forgot the item; review again tomorrow
    Again,
    /// Recalled with difficulty
    Hard,
    /// Recalled normally
    Good,
    /// Recalled effortlessly
    Easy,
}

impl Feedback {
    /// All feedback levels, hardest outcome first
    pub const ALL: [Feedback; 4] = [
        Feedback::Again,
        Feedback::Hard,
        Feedback::Good,
        Feedback::Easy,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Feedback::Again => "again",
            Feedback::Hard => "hard",
            Feedback::Good => "good",
            Feedback::Easy => "easy",
        }
    }

    /// Parse an untrusted feedback string (API boundary). Case-insensitive.
    pub fn parse(s: &str) -> Result<Self, ValidationError> {
        match s.trim().to_lowercase().as_str() {
            "again" => Ok(Feedback::Again),
            "hard" => Ok(Feedback::Hard),
            "good" => Ok(Feedback::Good),
            "easy" => Ok(Feedback::Easy),
            _ => Err(ValidationError::UnknownFeedback(s.to_string())),
        }
    }

    /// Whether this feedback counts as a successful recall. "hard" is a
    /// difficult pass; only "again" is a lapse.
    pub fn is_pass(&self) -> bool {
        !matches!(self, Feedback::Again)
    }
}

impl std::fmt::Display for Feedback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Feedback {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Feedback::parse(s)
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// Tunable knobs of the SM-2 family policy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sm2Params {
    /// Interval an "again" answer resets to
    pub again_interval_days: u32,
    /// Ease penalty on "again"
    pub again_penalty: f64,
    /// Ease penalty on "hard"
    pub hard_penalty: f64,
    /// Sub-linear interval growth on "hard"
    pub hard_multiplier: f64,
    /// Extra interval growth on "easy", on top of the ease factor
    pub easy_bonus: f64,
    /// Ease reward on "easy"
    pub easy_reward: f64,
    /// Ease factor assigned to brand-new items
    pub initial_ease: f64,
}

impl Default for Sm2Params {
    fn default() -> Self {
        Self {
            again_interval_days: 1,
            again_penalty: 0.2,
            hard_penalty: 0.15,
            hard_multiplier: 1.2,
            easy_bonus: 1.3,
            easy_reward: 0.15,
            initial_ease: DEFAULT_EASE_FACTOR,
        }
    }
}

// ============================================================================
// POLICY
// ============================================================================

/// Result of one policy application: the successor state plus the updated
/// failure streak carried on the schedule aggregate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleTransition {
    /// Successor scheduling state
    pub state: ReviewState,
    /// Updated "again"/"hard" streak counter
    pub consecutive_failures: u32,
}

/// The SM-2 family scheduling policy.
///
/// A pure transition function over [`ReviewState`]: total and infallible for
/// every recognized [`Feedback`] level, with no side effects. Interval and
/// ease arithmetic follow the classic shape:
///
/// - again: interval resets short, ease drops (floored at 1.3)
/// - hard: interval x 1.2, ease drops slightly
/// - good: interval x ease, ease unchanged
/// - easy: interval x ease x bonus, ease rises slightly
///
/// Every successful branch guarantees the interval grows by at least one day,
/// and every branch increments the review count.
#[derive(Debug, Clone, Default)]
pub struct Sm2Policy {
    params: Sm2Params,
}

impl Sm2Policy {
    /// Create a policy with custom parameters
    pub fn new(params: Sm2Params) -> Self {
        Sm2Policy { params }
    }

    /// The active parameters
    pub fn params(&self) -> &Sm2Params {
        &self.params
    }

    /// State for an item entering spaced repetition: due immediately, with
    /// the default ease factor and no review history.
    pub fn initial_state(&self, now: DateTime<Utc>) -> ReviewState {
        ReviewState::new(
            ReviewInterval::ZERO,
            EaseFactor::clamped(self.params.initial_ease),
            0,
            None,
            now,
        )
    }

    /// Apply feedback to a state, producing the successor state and failure
    /// streak. `now` becomes the last-reviewed instant; the next review lands
    /// `interval` days after it.
    pub fn apply(
        &self,
        state: &ReviewState,
        consecutive_failures: u32,
        feedback: Feedback,
        now: DateTime<Utc>,
    ) -> ScheduleTransition {
        let p = &self.params;
        let ease = state.ease_factor.value();

        let (interval, ease_factor, failures) = match feedback {
            Feedback::Again => (
                ReviewInterval::new(p.again_interval_days),
                EaseFactor::clamped(ease - p.again_penalty),
                consecutive_failures.saturating_add(1),
            ),
            Feedback::Hard => (
                Self::grown(state.interval, p.hard_multiplier),
                EaseFactor::clamped(ease - p.hard_penalty),
                0,
            ),
            Feedback::Good => (Self::grown(state.interval, ease), state.ease_factor, 0),
            Feedback::Easy => (
                Self::grown(state.interval, ease * p.easy_bonus),
                EaseFactor::clamped(ease + p.easy_reward),
                0,
            ),
        };

        ScheduleTransition {
            state: ReviewState::new(
                interval,
                ease_factor,
                state.review_count.saturating_add(1),
                Some(now),
                now + Duration::days(i64::from(interval.days())),
            ),
            consecutive_failures: failures,
        }
    }

    /// Grow an interval by a multiplier, guaranteeing at least one extra day
    fn grown(interval: ReviewInterval, multiplier: f64) -> ReviewInterval {
        let scaled = (interval.as_f64() * multiplier).round();
        let scaled = if scaled.is_finite() && scaled > 0.0 {
            scaled.min(f64::from(u32::MAX)) as u32
        } else {
            0
        };
        ReviewInterval::new(scaled.max(interval.days().saturating_add(1)))
    }
}

// ============================================================================
// TESTS
// ============================================================================
