// ABOUTME: Token accounting for generations whose backend did not report usage
// ABOUTME: Falls back to a words-per-token heuristic of 0.75
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use crate::llm::TokenUsage;

/// Estimate tokens for `text` as `ceil(words / 0.75)`
#[must_use]
pub fn estimate_tokens(text: &str) -> u32 {
    let words = u32::try_from(text.split_whitespace().count()).unwrap_or(u32::MAX);
    // words / 0.75 == words * 4 / 3
    words.saturating_mul(4).div_ceil(3)
}

/// Tokens to bill: reported total when present, otherwise the estimate
#[must_use]
pub fn billable_tokens(usage: Option<&TokenUsage>, generated_text: &str) -> u32 {
    usage.map_or_else(|| estimate_tokens(generated_text), |u| u.total_tokens)
}
