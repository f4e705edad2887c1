// ABOUTME: Tenant identifier newtype used to scope every persisted record
// ABOUTME: Wraps a UUID so tenant ids cannot be confused with user or project ids
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Workspace that owns ideas, leads, sessions, jobs and usage
///
/// Serialized as the bare UUID string, which is also how it is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(Uuid);

impl TenantId {
    /// Fresh random tenant, used when provisioning and in tests
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Tenant read back from storage or a token claim
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Underlying UUID
    #[must_use]
    pub const fn into_uuid(self) -> Uuid {
        self.0
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        raw.trim().parse().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parses_back() {
        let tenant = TenantId::new();
        let parsed: TenantId = tenant.to_string().parse().unwrap_or_default();
        assert_eq!(parsed, tenant);
        assert_eq!(parsed.into_uuid(), tenant.into_uuid());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!("not-a-tenant".parse::<TenantId>().is_err());
    }
}
