//! Review State - per-item spaced-repetition parameters
//!
//! Validated value types for the scheduling state machine:
//! - `ReviewInterval`: non-negative whole days until the next review
//! - `EaseFactor`: interval growth multiplier with a 1.3 floor
//! - `ReviewState`: the composite an `Sm2Policy` transition maps over

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest ease factor the policy will ever produce. Below this, intervals
/// stop growing meaningfully and items churn forever (the SM-2 floor).
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor assigned to items that have never been reviewed.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Interval (in days) at which an item counts as mature.
pub const MATURE_INTERVAL_DAYS: u32 = 21;

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Validation error for scheduling inputs
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// Interval was negative
    #[error("review interval cannot be negative: {0}")]
    NegativeInterval(i64),
    /// Ease factor below the 1.3 floor
    #[error("ease factor {0} is below the minimum of {MIN_EASE_FACTOR}")]
    EaseFactorTooLow(f64),
    /// Ease factor was NaN or infinite
    #[error("ease factor must be a finite number")]
    EaseFactorNotFinite,
    /// Review count was negative
    #[error("review count cannot be negative: {0}")]
    NegativeReviewCount(i64),
    /// A state without a next-review timestamp is unschedulable
    #[error("review state is missing its next review timestamp")]
    MissingNextReview,
    /// Feedback string did not name a known feedback level
    #[error("unrecognized feedback value: {0:?}")]
    UnknownFeedback(String),
}

// ============================================================================
// VALUE TYPES
// ============================================================================

/// Number of whole days until an item should be reviewed again.
///
/// Always non-negative; a zero interval means "due immediately" and is the
/// state every schedule starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct ReviewInterval(u32);

impl ReviewInterval {
    /// Interval of zero days (due immediately)
    pub const ZERO: ReviewInterval = ReviewInterval(0);

    /// Create an interval from a known-valid day count
    pub const fn new(days: u32) -> Self {
        ReviewInterval(days)
    }

    /// Create an interval from an untrusted day count (persistence or API
    /// boundary). Fails on negative values.
    pub fn from_days(days: i64) -> Result<Self, ValidationError> {
        if days < 0 {
            return Err(ValidationError::NegativeInterval(days));
        }
        Ok(ReviewInterval(days.min(u32::MAX as i64) as u32))
    }

    /// The interval in days
    pub const fn days(self) -> u32 {
        self.0
    }

    /// The interval as a float, for growth arithmetic
    pub fn as_f64(self) -> f64 {
        f64::from(self.0)
    }
}

impl std::fmt::Display for ReviewInterval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d", self.0)
    }
}

/// Multiplier bounding how quickly intervals grow.
///
/// Never below [`MIN_EASE_FACTOR`]; there is no upper bound beyond f64
/// finiteness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EaseFactor(f64);

impl EaseFactor {
    /// Create an ease factor from an untrusted value. Fails below the floor
    /// or on non-finite input.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() {
            return Err(ValidationError::EaseFactorNotFinite);
        }
        if value < MIN_EASE_FACTOR {
            return Err(ValidationError::EaseFactorTooLow(value));
        }
        Ok(EaseFactor(value))
    }

    /// Create an ease factor, clamping anything below the floor up to it.
    /// Policy arithmetic goes through here so repeated penalties can never
    /// drive the factor under the floor.
    pub fn clamped(value: f64) -> Self {
        // f64::max returns the other operand for NaN input
        EaseFactor(MIN_EASE_FACTOR.max(value))
    }

    /// The raw multiplier
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Default for EaseFactor {
    fn default() -> Self {
        EaseFactor(DEFAULT_EASE_FACTOR)
    }
}

impl std::fmt::Display for EaseFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

// ============================================================================
// REVIEW STATE
// ============================================================================

/// Maturity phase of a schedule, derived from its state rather than stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewPhase {
    /// Never reviewed
    New,
    /// Reviewed at least once, interval still short
    Learning,
    /// Interval at or beyond [`MATURE_INTERVAL_DAYS`]
    Mature,
}

impl ReviewPhase {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewPhase::New => "new",
            ReviewPhase::Learning => "learning",
            ReviewPhase::Mature => "mature",
        }
    }
}

impl std::fmt::Display for ReviewPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One student-problem pair's spaced-repetition parameters.
///
/// Immutable: policy application produces a new state, it never mutates in
/// place. `next_review_at` is always `last_reviewed_at + interval` once an
/// item has been reviewed; for a never-reviewed item it is set at creation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewState {
    /// Days until the next review
    pub interval: ReviewInterval,
    /// Interval growth multiplier
    pub ease_factor: EaseFactor,
    /// Number of policy applications; increments monotonically
    pub review_count: u32,
    /// When this item was last reviewed, if ever
    pub last_reviewed_at: Option<DateTime<Utc>>,
    /// When this item is next due
    pub next_review_at: DateTime<Utc>,
}

impl ReviewState {
    /// Assemble a state from already-validated parts
    pub fn new(
        interval: ReviewInterval,
        ease_factor: EaseFactor,
        review_count: u32,
        last_reviewed_at: Option<DateTime<Utc>>,
        next_review_at: DateTime<Utc>,
    ) -> Self {
        ReviewState {
            interval,
            ease_factor,
            review_count,
            last_reviewed_at,
            next_review_at,
        }
    }

    /// Assemble a state from untrusted raw values (persistence boundary).
    /// Fails on negative intervals or counts, out-of-range ease factors, and
    /// a missing next-review timestamp.
    pub fn from_raw(
        interval_days: i64,
        ease_factor: f64,
        review_count: i64,
        last_reviewed_at: Option<DateTime<Utc>>,
        next_review_at: Option<DateTime<Utc>>,
    ) -> Result<Self, ValidationError> {
        if review_count < 0 {
            return Err(ValidationError::NegativeReviewCount(review_count));
        }
        Ok(ReviewState {
            interval: ReviewInterval::from_days(interval_days)?,
            ease_factor: EaseFactor::new(ease_factor)?,
            review_count: review_count.min(u32::MAX as i64) as u32,
            last_reviewed_at,
            next_review_at: next_review_at.ok_or(ValidationError::MissingNextReview)?,
        })
    }

    /// Whether this item is due at the given instant
    pub fn is_due(&self, as_of: DateTime<Utc>) -> bool {
        self.next_review_at <= as_of
    }

    /// Maturity phase, derived from review count and interval
    pub fn phase(&self) -> ReviewPhase {
        if self.review_count == 0 {
            ReviewPhase::New
        } else if self.interval.days() >= MATURE_INTERVAL_DAYS {
            ReviewPhase::Mature
        } else {
            ReviewPhase::Learning
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
