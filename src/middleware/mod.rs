// ABOUTME: HTTP middleware for CORS and request tracing
// ABOUTME: Layers shared by every router the server assembles
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

pub mod cors;
pub mod tracing;

// CORS configuration
pub use self::cors::setup_cors;

// Request tracing
pub use self::tracing::{request_id, request_span};
