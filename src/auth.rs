// ABOUTME: JWT bearer authentication for REST callers
// ABOUTME: Validates HS256 tokens carrying the user id and tenant id claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! # Authentication
//!
//! Every API route except `/health` expects `Authorization: Bearer <jwt>`.
//! Tokens are HS256 signed with the server secret and carry the caller's
//! user id (`sub`) and tenant (`tenant_id`).

use chrono::{Duration, Utc};
use http::header::AUTHORIZATION;
use http::HeaderMap;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::logging::AppLogger;
use founderhub_core::errors::{AppError, AppResult};
use founderhub_core::models::TenantId;

/// JWT claims for API callers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: String,
    /// Tenant the user belongs to
    pub tenant_id: String,
    /// Issued at timestamp
    pub iat: i64,
    /// Expiration timestamp
    pub exp: i64,
}

/// Authenticated caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    /// Caller
    pub user_id: Uuid,
    /// Caller's tenant
    pub tenant_id: TenantId,
}

/// Issues and validates caller tokens
#[derive(Clone)]
pub struct AuthManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl std::fmt::Debug for AuthManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthManager").finish_non_exhaustive()
    }
}

impl AuthManager {
    /// Create a manager for `secret`
    #[must_use]
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Issue a token for a caller, valid for `ttl`
    ///
    /// # Errors
    ///
    /// Returns an internal error if encoding fails
    pub fn generate_token(&self, context: &AuthContext, ttl: Duration) -> AppResult<String> {
        let now = Utc::now();
        let claims = Claims {
            sub: context.user_id.to_string(),
            tenant_id: context.tenant_id.to_string(),
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::internal(format!("Failed to generate token: {e}")))
    }

    /// Validate a raw token
    ///
    /// # Errors
    ///
    /// `AuthExpired` for an expired token, `AuthInvalid` for anything else wrong
    pub fn validate_token(&self, token: &str) -> AppResult<AuthContext> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| Self::convert_jwt_error(&e))?
            .claims;

        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::auth_invalid("Token subject is not a user id"))?;
        let tenant_id = claims
            .tenant_id
            .parse::<TenantId>()
            .map_err(|_| AppError::auth_invalid("Token tenant_id is not a tenant id"))?;

        Ok(AuthContext { user_id, tenant_id })
    }

    /// Authenticate a request from its `Authorization` header
    ///
    /// # Errors
    ///
    /// `AuthRequired` when the header is absent, otherwise see [`Self::validate_token`]
    pub fn authenticate(&self, headers: &HeaderMap) -> AppResult<AuthContext> {
        let header = headers
            .get(AUTHORIZATION)
            .ok_or_else(AppError::auth_required)?
            .to_str()
            .map_err(|_| AppError::auth_invalid("Authorization header is not valid UTF-8"))?;

        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                AppLogger::log_auth_failure("malformed authorization header");
                AppError::auth_invalid("Authorization header must be 'Bearer <token>'")
            })?;

        self.validate_token(token)
    }

    fn convert_jwt_error(e: &jsonwebtoken::errors::Error) -> AppError {
        match e.kind() {
            ErrorKind::ExpiredSignature => {
                AppLogger::log_auth_failure("token expired");
                AppError::auth_expired()
            }
            ErrorKind::InvalidSignature => {
                AppLogger::log_auth_failure("signature verification failed");
                AppError::auth_invalid("Token signature verification failed")
            }
            _ => {
                AppLogger::log_auth_failure("malformed token");
                AppError::auth_invalid(format!("Token validation failed: {e}"))
            }
        }
    }
}
