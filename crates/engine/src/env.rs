// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the assigner.

use std::time::Duration;

pub const POLL_MS_VAR: &str = "BF_ASSIGNER_POLL_MS";
pub const PRIORITY_PERCENTAGE_VAR: &str = "BF_ASSIGNER_PRIORITY_PERCENTAGE";
pub const ENUM_WARN_VAR: &str = "BF_ASSIGNER_ENUM_WARN";

/// Raw value of `var`, if set. Parse failures are reported by the caller.
fn raw(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|s| !s.trim().is_empty())
}

/// Poll interval override
pub fn poll_interval() -> Option<Result<Duration, String>> {
    raw(POLL_MS_VAR).map(|s| {
        s.trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|_| s)
    })
}

/// Priority percentage override
pub fn priority_percentage() -> Option<Result<u8, String>> {
    raw(PRIORITY_PERCENTAGE_VAR).map(|s| s.trim().parse::<u8>().map_err(|_| s))
}

/// Enumeration warn threshold override
pub fn enumeration_warn_threshold() -> Option<Result<usize, String>> {
    raw(ENUM_WARN_VAR).map(|s| s.trim().parse::<usize>().map_err(|_| s))
}
