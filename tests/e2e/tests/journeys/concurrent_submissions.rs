//! Lost-update guard under real concurrency: parallel feedback submissions
//! for the same pair must all be applied, never silently dropped.

use retain_core::Clock;
use retain_e2e_tests::harness::{feedback, test_env};
use std::thread;

#[test]
fn same_pair_submissions_are_serialized() {
    let env = test_env();
    env.service
        .submit_feedback(&feedback("alice", "p1", "good"))
        .unwrap();

    thread::scope(|scope| {
        let a = scope.spawn(|| {
            env.service
                .submit_feedback(&feedback("alice", "p1", "good"))
                .unwrap()
        });
        let b = scope.spawn(|| {
            env.service
                .submit_feedback(&feedback("alice", "p1", "hard"))
                .unwrap()
        });
        a.join().unwrap();
        b.join().unwrap();
    });

    // 1 initial + 2 concurrent reviews: none lost
    let schedule = env.service.get_schedule("alice", "p1").unwrap();
    assert_eq!(schedule.state.review_count, 3);
    assert_eq!(schedule.version, 3);
    assert_eq!(env.store.study_records("alice", "p1").unwrap().len(), 3);
}

#[test]
fn different_pairs_proceed_independently() {
    let env = test_env();

    let service = &env.service;
    thread::scope(|scope| {
        for problem in ["p1", "p2", "p3", "p4"] {
            scope.spawn(move || {
                service
                    .submit_feedback(&feedback("alice", problem, "good"))
                    .unwrap()
            });
        }
    });

    env.clock.advance_days(2);
    let due = env.service.due_reviews("alice", env.clock.now()).unwrap();
    assert_eq!(due.len(), 4);
    for schedule in &due {
        assert_eq!(schedule.state.review_count, 1);
        assert_eq!(schedule.version, 1);
    }
}
