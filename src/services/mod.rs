// ABOUTME: Domain service layer for business logic extracted from route handlers
// ABOUTME: Persona chat, idea analysis and quota checks shared by the REST routes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! Domain service layer
//!
//! Route handlers stay thin: they authenticate, parse input and delegate to
//! the functions here, which own the ordering of session resolution, quota
//! checks, generation and persistence.

/// Persona chat turns
pub mod chat;

/// Idea analysis and summarization
pub mod ideas;

/// Monthly token quota checks
pub mod quota;
