// ABOUTME: Core types and constants for the MaaS Workflow Creator backend
// ABOUTME: Foundation crate with error handling, domain models, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

#![deny(unsafe_code)]

//! # MaaS Core
//!
//! Foundation crate providing shared types for the workflow creator backend.
//! It changes infrequently, so the main crate gets incremental compilation
//! benefits when only handlers or services change.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError` and `ErrorCode`
//! - **models**: Users, generations, credit transactions and chat messages
//! - **constants**: Header names, route paths and service defaults

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Domain models shared by persistence, services and routes
pub mod models;

/// Application constants organized by domain
pub mod constants;
