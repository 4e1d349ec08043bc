// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Explicit retry policy value type.
//!
//! Design Notes call for replacing the original's context-manager retry
//! wrappers with a plain value consumed by an explicit loop — no hidden
//! control flow, callers can see exactly what will be retried and how.

use std::time::Duration;

/// `base * factor^attempt`, jittered by `±jitter`, capped at `cap`,
/// abandoned after `max_attempts`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub base: Duration,
    pub factor: f64,
    pub jitter: f64,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Default backoff for database-busy retries (`spec.md` §4.1):
    /// 50ms base, factor 2, ±25% jitter, 2s cap, 6 attempts.
    pub const fn database_busy() -> Self {
        Self {
            base: Duration::from_millis(50),
            factor: 2.0,
            jitter: 0.25,
            cap: Duration::from_secs(2),
            max_attempts: 6,
        }
    }

    /// Bounded, opt-in retry for subprocess-calling handlers (PlantUML,
    /// Draw.io) on transient exit codes and timeouts (`spec.md` §7).
    pub const fn subprocess_transient() -> Self {
        Self {
            base: Duration::from_millis(200),
            factor: 2.0,
            jitter: 0.25,
            cap: Duration::from_secs(5),
            max_attempts: 3,
        }
    }

    /// Delay before the `attempt`th retry (0-indexed: `attempt=0` is the
    /// delay before the first retry). Jitter is deterministic given
    /// `jitter_sample` ∈ `[-1.0, 1.0]` so callers can test without RNG.
    pub fn delay_for(&self, attempt: u32, jitter_sample: f64) -> Duration {
        let exp = self.factor.powi(attempt as i32);
        let raw_ms = (self.base.as_secs_f64() * exp * 1000.0).min(self.cap.as_millis() as f64);
        let jitter_range = raw_ms * self.jitter;
        let jittered_ms = (raw_ms + jitter_sample.clamp(-1.0, 1.0) * jitter_range).max(0.0);
        Duration::from_millis(jittered_ms.min(self.cap.as_millis() as f64) as u64)
    }

    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

#[cfg(test)]
#[path = "retry_tests.rs"]
mod tests;
