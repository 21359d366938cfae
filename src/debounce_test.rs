use super::*;

const T0: u64 = 1_700_000_000_000;
const SETTLE: u64 = 500;
const MAX: u32 = 5;

fn debouncer() -> AuthDebouncer {
    AuthDebouncer::new(SETTLE, MAX)
}

fn user(id: &str) -> AuthSnapshot {
    AuthSnapshot::signed_in(id, format!("{id}@example.com"), true)
}

#[test]
fn emits_after_settle_window() {
    let mut d = debouncer();
    d.notify_at(user("a"), T0);
    assert_eq!(d.phase(), DebouncePhase::Settling);
    assert_eq!(d.poll_at(T0 + SETTLE - 1), None);
    let settled = d.poll_at(T0 + SETTLE).expect("settled");
    assert_eq!(settled.user_id.as_deref(), Some("a"));
    assert_eq!(d.phase(), DebouncePhase::Idle);
}

#[test]
fn burst_coalesces_to_last_snapshot() {
    // One emission per burst, carrying the final snapshot.
    let mut d = debouncer();
    d.notify_at(user("a"), T0);
    d.notify_at(user("b"), T0 + 100);
    d.notify_at(user("c"), T0 + 200);

    // Deadline restarted with each notification.
    assert_eq!(d.poll_at(T0 + SETTLE), None);
    let settled = d.poll_at(T0 + 200 + SETTLE).expect("settled");
    assert_eq!(settled.user_id.as_deref(), Some("c"));
    assert_eq!(d.poll_at(T0 + 200 + SETTLE + 1), None);
}

#[test]
fn repeat_notification_for_processed_user_is_dropped() {
    // The provider re-fires for the same user; the repeat never settles.
    let mut d = debouncer();
    d.notify_at(user("a"), T0);
    assert!(d.poll_at(T0 + SETTLE).is_some());

    d.notify_at(user("a"), T0 + 1_000);
    assert_eq!(d.phase(), DebouncePhase::Idle);
    assert_eq!(d.poll_at(T0 + 1_000 + SETTLE), None);
}

#[test]
fn repeat_signed_out_notification_is_dropped() {
    let mut d = debouncer();
    d.notify_at(AuthSnapshot::signed_out(), T0);
    assert!(d.poll_at(T0 + SETTLE).is_some());

    d.notify_at(AuthSnapshot::signed_out(), T0 + 1_000);
    assert_eq!(d.phase(), DebouncePhase::Idle);
}

#[test]
fn different_user_after_processing_settles_normally() {
    let mut d = debouncer();
    d.notify_at(user("a"), T0);
    assert!(d.poll_at(T0 + SETTLE).is_some());

    d.notify_at(user("b"), T0 + 1_000);
    let settled = d.poll_at(T0 + 1_000 + SETTLE).expect("settled");
    assert_eq!(settled.user_id.as_deref(), Some("b"));
}

#[test]
fn loop_breaker_trips_after_lifetime_budget() {
    let mut d = debouncer();
    let mut now = T0;
    for i in 0..MAX {
        // Alternate users so the no-change drop does not interfere.
        let id = format!("user-{}", i % 2);
        d.notify_at(user(&id), now);
        now += SETTLE;
        assert!(d.poll_at(now).is_some(), "transition {i} should settle");
        now += 1;
    }

    // The sixth settling transition trips the breaker instead of emitting.
    d.notify_at(user("fresh"), now);
    now += SETTLE;
    assert_eq!(d.poll_at(now), None);
    assert_eq!(d.phase(), DebouncePhase::BlockedLoop);

    // Once tripped, everything is discarded permanently.
    d.notify_at(user("another"), now + 1_000);
    assert_eq!(d.phase(), DebouncePhase::BlockedLoop);
    assert_eq!(d.poll_at(now + 1_000 + SETTLE), None);
}
