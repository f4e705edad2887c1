// ABOUTME: Exponential retry delay for failed scheduled jobs
// ABOUTME: base * factor^(attempt - 1), capped
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::time::Duration;

/// Retry delay policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Delay after the first failed attempt
    pub base: Duration,
    /// Multiplier per further attempt
    pub factor: u32,
    /// Upper bound on any delay
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_secs(2),
            factor: 2,
            cap: Duration::from_secs(300),
        }
    }
}

impl RetryPolicy {
    /// Delay before the retry that follows failed attempt number `attempt` (1-based)
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let multiplier = self.factor.saturating_pow(attempt - 1);
        self.base.saturating_mul(multiplier).min(self.cap)
    }
}
