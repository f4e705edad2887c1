// ABOUTME: Short-lived HS256 token minting for calls to the self-hosted GPU backend
// ABOUTME: Each request gets a fresh token whose subject is the calling user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use founderhub_core::constants::INFERENCE_TOKEN_SCOPE;
use founderhub_core::errors::AppError;

/// Claims carried by an inference token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct InferenceClaims {
    /// Calling user
    pub sub: String,
    /// Always `inference`
    pub scope: String,
    /// Issued at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

/// Mints HS256 tokens from a shared secret
#[derive(Clone)]
pub struct InferenceTokenSigner {
    key: EncodingKey,
    ttl_secs: i64,
}

impl std::fmt::Debug for InferenceTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferenceTokenSigner")
            .field("ttl_secs", &self.ttl_secs)
            .finish_non_exhaustive()
    }
}

impl InferenceTokenSigner {
    /// Create a signer for `secret` issuing tokens valid for `ttl_secs`
    #[must_use]
    pub fn new(secret: &[u8], ttl_secs: u64) -> Self {
        Self {
            key: EncodingKey::from_secret(secret),
            ttl_secs: i64::try_from(ttl_secs).unwrap_or(i64::MAX),
        }
    }

    /// Token lifetime in seconds
    #[must_use]
    pub const fn ttl_secs(&self) -> i64 {
        self.ttl_secs
    }

    /// Mint a token for `user_id`
    ///
    /// # Errors
    ///
    /// Returns an internal error if encoding fails
    pub fn sign(&self, user_id: &str) -> Result<String, AppError> {
        let now = Utc::now().timestamp();
        let claims = InferenceClaims {
            sub: user_id.to_owned(),
            scope: INFERENCE_TOKEN_SCOPE.to_owned(),
            iat: now,
            exp: now.saturating_add(self.ttl_secs),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.key)
            .map_err(|e| AppError::internal(format!("Failed to sign inference token: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{decode, DecodingKey, Validation};

    #[test]
    fn test_signed_token_carries_user_scope_and_expiry() {
        let signer = InferenceTokenSigner::new(b"gpu-secret", 60);
        let token = signer.sign("user-42").unwrap();

        let decoded = decode::<InferenceClaims>(
            &token,
            &DecodingKey::from_secret(b"gpu-secret"),
            &Validation::new(Algorithm::HS256),
        )
        .unwrap();

        assert_eq!(decoded.claims.sub, "user-42");
        assert_eq!(decoded.claims.scope, "inference");
        assert_eq!(decoded.claims.exp - decoded.claims.iat, 60);
    }

    #[test]
    fn test_token_rejected_with_wrong_secret() {
        let token = InferenceTokenSigner::new(b"right", 60).sign("u").unwrap();
        let result = decode::<InferenceClaims>(
            &token,
            &DecodingKey::from_secret(b"wrong"),
            &Validation::new(Algorithm::HS256),
        );
        assert!(result.is_err());
    }
}
