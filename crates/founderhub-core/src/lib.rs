// ABOUTME: Core types and constants for the FounderHub backend
// ABOUTME: Foundation crate with error handling, identifiers and domain models
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

#![deny(unsafe_code)]

//! # FounderHub Core
//!
//! Foundation crate providing shared types for the FounderHub backend. It is
//! designed to change infrequently so the server crate compiles incrementally.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode` and HTTP payloads
//! - **models**: Tenant identifiers, persona roles, assistant sessions, usage records, ideas
//! - **constants**: Fixed strings shared across the server and its tests

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Core data models
pub mod models;

/// Shared constants
pub mod constants;
