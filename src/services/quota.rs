// ABOUTME: Monthly token quota checks applied around every generation
// ABOUTME: Rejects before generation once exhausted and after generation when the spend overshoots
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use chrono::{DateTime, Utc};

use crate::database::Database;
use crate::logging::AppLogger;
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::{QuotaStatus, TenantId};

/// Current usage against the tenant's plan cap
///
/// # Errors
///
/// Returns an error if either lookup fails
pub async fn quota_status(
    database: &Database,
    tenant_id: TenantId,
    now: DateTime<Utc>,
) -> AppResult<QuotaStatus> {
    let cap = database.tenant_token_cap(tenant_id).await?;
    let used = database.monthly_usage(tenant_id, now).await?;
    Ok(QuotaStatus { cap, used })
}

/// Fail with `QuotaExceeded` when usage already reached the cap
///
/// # Errors
///
/// `QuotaExceeded` when the tenant has no tokens left
pub fn ensure_not_exhausted(tenant_id: TenantId, status: &QuotaStatus) -> AppResult<()> {
    match status.cap {
        Some(cap) if status.is_exhausted() => {
            AppLogger::log_quota_rejection(&tenant_id.to_string(), status.used, cap, 0);
            Err(AppError::quota_exceeded(status.used, cap, 0))
        }
        _ => Ok(()),
    }
}

/// Fail with `QuotaExceeded` when `tokens` on top of the pre-call usage overshoots the cap
///
/// The tokens are already billed at this point; the caller drops the result.
///
/// # Errors
///
/// `QuotaExceeded` when `used + tokens > cap`
pub fn ensure_within_cap(tenant_id: TenantId, before: &QuotaStatus, tokens: u32) -> AppResult<()> {
    let requested = u64::from(tokens);
    match before.cap {
        Some(cap) if before.would_exceed(requested) => {
            AppLogger::log_quota_rejection(&tenant_id.to_string(), before.used, cap, requested);
            Err(AppError::quota_exceeded(before.used, cap, requested))
        }
        _ => Ok(()),
    }
}

/// Quota left after spending `tokens` on top of `before`
#[must_use]
pub fn remaining_after(before: &QuotaStatus, tokens: u32) -> Option<u64> {
    QuotaStatus {
        cap: before.cap,
        used: before.used.saturating_add(u64::from(tokens)),
    }
    .remaining()
}

#[cfg(test)]
mod tests {
    use super::*;
    use founderhub_core::errors::ErrorCode;

    #[test]
    fn test_exhausted_quota_rejected_before_generation() {
        let status = QuotaStatus {
            cap: Some(1000),
            used: 1000,
        };
        let err = ensure_not_exhausted(TenantId::new(), &status).unwrap_err();
        assert_eq!(err.code, ErrorCode::QuotaExceeded);
    }

    #[test]
    fn test_overshoot_rejected_after_generation() {
        let status = QuotaStatus {
            cap: Some(1000),
            used: 950,
        };
        assert!(ensure_not_exhausted(TenantId::new(), &status).is_ok());
        let err = ensure_within_cap(TenantId::new(), &status, 800).unwrap_err();
        assert_eq!(err.code, ErrorCode::QuotaExceeded);
        assert!(ensure_within_cap(TenantId::new(), &status, 50).is_ok());
    }

    #[test]
    fn test_remaining_after_spend() {
        let status = QuotaStatus {
            cap: Some(1000),
            used: 900,
        };
        assert_eq!(remaining_after(&status, 40), Some(60));
        assert_eq!(remaining_after(&QuotaStatus { cap: None, used: 5 }, 40), None);
    }
}
