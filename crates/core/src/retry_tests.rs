// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn delay_grows_exponentially_up_to_cap() {
    let policy = RetryPolicy::database_busy();
    let d0 = policy.delay_for(0, 0.0);
    let d1 = policy.delay_for(1, 0.0);
    let d2 = policy.delay_for(2, 0.0);
    assert_eq!(d0, Duration::from_millis(50));
    assert_eq!(d1, Duration::from_millis(100));
    assert_eq!(d2, Duration::from_millis(200));
}

#[test]
fn delay_never_exceeds_cap() {
    let policy = RetryPolicy::database_busy();
    let d = policy.delay_for(20, 1.0);
    assert!(d <= policy.cap);
}

#[test]
fn jitter_moves_delay_within_bounds() {
    let policy = RetryPolicy::database_busy();
    let base = policy.delay_for(0, 0.0).as_millis() as f64;
    let high = policy.delay_for(0, 1.0).as_millis() as f64;
    let low = policy.delay_for(0, -1.0).as_millis() as f64;
    assert!(high > base);
    assert!(low < base);
}

#[test]
fn should_retry_respects_max_attempts() {
    let policy = RetryPolicy::database_busy();
    assert!(policy.should_retry(0));
    assert!(policy.should_retry(policy.max_attempts - 1));
    assert!(!policy.should_retry(policy.max_attempts));
}
