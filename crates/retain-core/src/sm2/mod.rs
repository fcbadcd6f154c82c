//! SM-2 (SuperMemo 2 family) Scheduling Policy Module
//!
//! Pure interval/ease-factor arithmetic mapping a [`crate::schedule::ReviewState`]
//! and a feedback level to the successor state. No I/O, no clock access: the
//! review instant is passed in, which keeps every transition deterministic
//! and testable.
//!
//! ## Transition rules (defaults)
//! - again: interval -> 1d, ease -0.20, failure streak +1
//! - hard:  interval x 1.2, ease -0.15, streak reset
//! - good:  interval x ease, ease unchanged, streak reset
//! - easy:  interval x ease x 1.3, ease +0.15, streak reset
//!
//! The ease factor is floored at 1.3 and passing intervals always grow by at
//! least one day.

mod policy;

pub use policy::{Feedback, ScheduleTransition, Sm2Params, Sm2Policy};
