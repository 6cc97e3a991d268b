// ABOUTME: Shared HTTP client utilities with connection pooling and timeout configuration
// ABOUTME: Builds one pooled reqwest client per upstream so each call carries its own deadline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use std::time::Duration;

use maas_core::constants::timeouts::CONNECT_TIMEOUT_SECS;
use reqwest::{Client, ClientBuilder};

/// User agent sent on every outbound request
pub const USER_AGENT: &str = concat!("maas-workflow-creator/", env!("CARGO_PKG_VERSION"));

/// Create a new HTTP client with custom timeout settings
///
/// # Arguments
/// * `timeout_secs` - Whole-request timeout in seconds
/// * `connect_timeout_secs` - Connection timeout in seconds
///
/// Falls back to a default client if the builder fails.
#[must_use]
pub fn create_client_with_timeout(timeout_secs: u64, connect_timeout_secs: u64) -> Client {
    ClientBuilder::new()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .connect_timeout(Duration::from_secs(connect_timeout_secs.min(timeout_secs)))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Client for an upstream with the standard connect timeout
#[must_use]
pub fn upstream_client(timeout_secs: u64) -> Client {
    create_client_with_timeout(timeout_secs, CONNECT_TIMEOUT_SECS)
}

/// Client-safe reason for a transport failure
///
/// reqwest's `Display` includes the request URL, so it only goes to the logs.
#[must_use]
pub fn failure_reason(error: &reqwest::Error) -> &'static str {
    if error.is_timeout() {
        "request timed out"
    } else if error.is_connect() {
        "connection refused"
    } else if error.is_decode() || error.is_body() {
        "unreadable response"
    } else {
        "request failed"
    }
}
