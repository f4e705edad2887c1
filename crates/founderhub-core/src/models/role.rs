// ABOUTME: Persona role tag such as "ceo", "cfo" or "startup_critic"
// ABOUTME: Normalizes case on construction so lookups are case-insensitive
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::errors::AppError;

/// Persona role tag, always stored lowercase
///
/// `"CEO"`, `" ceo "` and `"ceo"` all parse to the same role.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct PersonaRole(String);

impl PersonaRole {
    /// Parse and normalize a role tag
    ///
    /// # Errors
    ///
    /// Returns an invalid-input error when the tag is blank or contains
    /// characters other than ASCII letters, digits, `_` and `-`.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(AppError::invalid_input("Role must not be empty"));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AppError::invalid_input(format!(
                "Invalid role '{raw}': only letters, digits, '_' and '-' are allowed"
            )));
        }
        Ok(Self(normalized))
    }

    /// Lowercase role tag
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Uppercase form used in persona names and fallback instructions
    #[must_use]
    pub fn display_upper(&self) -> String {
        self.0.to_uppercase()
    }
}

impl fmt::Display for PersonaRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for PersonaRole {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl<'de> Deserialize<'de> for PersonaRole {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
