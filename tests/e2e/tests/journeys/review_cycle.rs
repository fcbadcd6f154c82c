//! Full review lifecycle against real storage: first encounter, interval
//! growth, lapse and recovery, queue views across day boundaries, events.

use chrono::Duration;
use retain_core::{Clock, Feedback, ReviewEvent, ReviewPhase, MIN_EASE_FACTOR};
use retain_e2e_tests::harness::{day0, feedback, test_env};

#[test]
fn first_review_creates_schedule_and_logs_attempt() {
    let env = test_env();

    let schedule = env
        .service
        .submit_feedback(&feedback("alice", "algebra-1", "good"))
        .unwrap();

    assert_eq!(schedule.state.review_count, 1);
    assert_eq!(schedule.state.interval.days(), 1);
    assert_eq!(schedule.state.phase(), ReviewPhase::Learning);
    assert_eq!(schedule.state.next_review_at, day0() + Duration::days(1));

    let records = env.store.study_records("alice", "algebra-1").unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].feedback, Feedback::Good);
    assert!(records[0].is_correct);
    assert_eq!(records[0].response_time_ms, Some(2500));
}

#[test]
fn good_streak_matures_a_schedule() {
    let env = test_env();

    // Review every time the item comes due, always "good"
    let mut schedule = env
        .service
        .submit_feedback(&feedback("alice", "algebra-1", "good"))
        .unwrap();
    for _ in 0..4 {
        env.clock.set(schedule.state.next_review_at);
        schedule = env
            .service
            .submit_feedback(&feedback("alice", "algebra-1", "good"))
            .unwrap();
    }

    // 1 -> 3 -> 8 -> 20 -> 50 days with the default 2.5 ease
    assert_eq!(schedule.state.interval.days(), 50);
    assert_eq!(schedule.state.review_count, 5);
    assert_eq!(schedule.state.phase(), ReviewPhase::Mature);
    assert_eq!(schedule.state.ease_factor.value(), 2.5);
}

#[test]
fn lapse_resets_interval_but_history_survives() {
    let env = test_env();

    let mut schedule = env
        .service
        .submit_feedback(&feedback("alice", "geometry-7", "good"))
        .unwrap();
    for _ in 0..3 {
        env.clock.set(schedule.state.next_review_at);
        schedule = env
            .service
            .submit_feedback(&feedback("alice", "geometry-7", "good"))
            .unwrap();
    }
    let matured_count = schedule.state.review_count;

    // Forgot it
    env.clock.set(schedule.state.next_review_at);
    let lapsed = env
        .service
        .submit_feedback(&feedback("alice", "geometry-7", "again"))
        .unwrap();

    assert_eq!(lapsed.state.interval.days(), 1);
    assert_eq!(lapsed.consecutive_failures, 1);
    assert_eq!(lapsed.state.review_count, matured_count + 1);
    assert!(lapsed.state.ease_factor.value() >= MIN_EASE_FACTOR);
    assert!(lapsed.state.ease_factor.value() < 2.5);

    let records = env.store.study_records("alice", "geometry-7").unwrap();
    assert_eq!(records.len() as u32, lapsed.state.review_count);
}

#[test]
fn queue_views_respect_day_boundaries() {
    let env = test_env();

    // Three problems reviewed on day 0, all landing 1 day out; one more
    // reviewed so it lands 3 days out
    for problem in ["p1", "p2", "p3"] {
        env.service
            .submit_feedback(&feedback("alice", problem, "again"))
            .unwrap();
    }
    env.service
        .submit_feedback(&feedback("alice", "p4", "good"))
        .unwrap();
    env.clock.advance_days(1);
    env.service
        .submit_feedback(&feedback("alice", "p4", "good"))
        .unwrap(); // 3 days out now

    // Two days later: p1-p3 came due yesterday, p4 is still out
    env.clock.advance_days(2);
    let now = env.clock.now();

    let due = env.service.due_reviews("alice", now).unwrap();
    assert_eq!(due.len(), 3);

    let overdue = env.service.overdue_reviews("alice", now).unwrap();
    let mut overdue_ids: Vec<&str> = overdue.iter().map(|s| s.problem_id.as_str()).collect();
    overdue_ids.sort_unstable();
    assert_eq!(overdue_ids, vec!["p1", "p2", "p3"]);

    // Today's view picks up everything due through end of day, still
    // nothing from p4
    let today = env.service.today_reviews("alice", now).unwrap();
    assert_eq!(today.len(), 3);

    // The day p4 lands, it shows in today but not in overdue
    env.clock.advance_days(1);
    let now = env.clock.now();
    let today = env.service.today_reviews("alice", now).unwrap();
    assert!(today.iter().any(|s| s.problem_id == "p4"));
    let overdue = env.service.overdue_reviews("alice", now).unwrap();
    assert!(!overdue.iter().any(|s| s.problem_id == "p4"));
}

#[test]
fn queues_are_per_student() {
    let env = test_env();

    env.service
        .submit_feedback(&feedback("alice", "p1", "again"))
        .unwrap();
    env.service
        .submit_feedback(&feedback("bob", "p1", "again"))
        .unwrap();

    env.clock.advance_days(2);
    let alice = env.service.due_reviews("alice", env.clock.now()).unwrap();
    assert_eq!(alice.len(), 1);
    assert_eq!(alice[0].student_id, "alice");
}

#[test]
fn events_flow_through_the_sink() {
    let env = test_env();

    env.service
        .submit_feedback(&feedback("alice", "p1", "again"))
        .unwrap();
    let drained = env.events.drain();

    // "again" lands tomorrow, inside the notification horizon
    assert_eq!(drained.len(), 2);
    match &drained[0] {
        ReviewEvent::ReviewCompleted {
            student_id,
            feedback,
            state,
            occurred_at,
            ..
        } => {
            assert_eq!(student_id, "alice");
            assert_eq!(*feedback, Feedback::Again);
            assert_eq!(state.review_count, 1);
            assert_eq!(*occurred_at, day0());
        }
        other => panic!("expected ReviewCompleted, got {other:?}"),
    }
    match &drained[1] {
        ReviewEvent::ReviewNotificationScheduled { notify_at, .. } => {
            assert_eq!(*notify_at, day0() + Duration::days(1));
        }
        other => panic!("expected ReviewNotificationScheduled, got {other:?}"),
    }

    // A long interval emits no notification
    env.clock.advance_days(1);
    env.service
        .submit_feedback(&feedback("alice", "p1", "easy"))
        .unwrap();
    let drained = env.events.drain();
    assert_eq!(drained.len(), 1);
    assert!(matches!(drained[0], ReviewEvent::ReviewCompleted { .. }));
}

#[test]
fn events_serialize_for_external_dispatch() {
    let env = test_env();
    env.service
        .submit_feedback(&feedback("alice", "p1", "good"))
        .unwrap();

    let drained = env.events.drain();
    let json = serde_json::to_value(&drained[0]).unwrap();
    assert_eq!(json["type"], "reviewCompleted");
    assert_eq!(json["problemId"], "p1");
    assert_eq!(json["state"]["interval"], 1);
    assert_eq!(json["state"]["reviewCount"], 1);
}
