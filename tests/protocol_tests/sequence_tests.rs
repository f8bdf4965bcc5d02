//! Tests for SequenceTracker
//!
//! These tests verify:
//! - Advancing only on matching, successful replies
//! - State left untouched on mismatch or failure
//! - Wrap-around at 65535

use openshowvar::protocol::SequenceTracker;

#[test]
fn test_confirm_advances_on_match_and_success() {
    let mut tracker = SequenceTracker::starting_at(42);

    assert!(tracker.confirm(42, true));
    assert_eq!(tracker.next_id(), 43);
}

#[test]
fn test_mismatch_in_the_middle_leaves_state() {
    let mut tracker = SequenceTracker::starting_at(10);

    assert!(tracker.confirm(10, true));
    assert_eq!(tracker.next_id(), 11);

    // Stale reply for the previous request
    assert!(!tracker.confirm(10, true));
    assert_eq!(tracker.next_id(), 11);

    assert!(tracker.confirm(11, true));
    assert_eq!(tracker.next_id(), 12);
}

#[test]
fn test_failure_status_leaves_state() {
    let mut tracker = SequenceTracker::starting_at(42);

    assert!(!tracker.confirm(42, false));
    assert_eq!(tracker.next_id(), 42);
}

#[test]
fn test_future_id_is_a_mismatch() {
    let mut tracker = SequenceTracker::starting_at(42);

    assert!(!tracker.confirm(43, true));
    assert_eq!(tracker.next_id(), 42);
}

#[test]
fn test_wraps_from_65535_to_0() {
    let mut tracker = SequenceTracker::starting_at(u16::MAX);

    assert!(tracker.confirm(u16::MAX, true));
    assert_eq!(tracker.next_id(), 0);

    assert!(tracker.confirm(0, true));
    assert_eq!(tracker.next_id(), 1);
}

#[test]
fn test_many_confirmations_are_monotonic() {
    let mut tracker = SequenceTracker::starting_at(1);

    for expected in 1..=500u16 {
        assert_eq!(tracker.next_id(), expected);
        assert!(tracker.confirm(expected, true));
    }
    assert_eq!(tracker.next_id(), 501);
}
