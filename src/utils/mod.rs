// ABOUTME: Shared utility modules
// ABOUTME: Currently the pooled outbound HTTP client factory
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

/// Outbound HTTP clients with per-upstream timeouts
pub mod http_client;
