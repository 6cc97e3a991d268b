// ABOUTME: Request tracing helpers for correlation and structured logging
// ABOUTME: Builds the per-request span carrying the x-request-id set at the edge
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use http::Request;
use maas_core::constants::headers::REQUEST_ID;
use tracing::{info_span, Span};

/// Request id of a request, `unknown` if none was assigned
#[must_use]
pub fn request_id<B>(request: &Request<B>) -> &str {
    request
        .headers()
        .get(REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Span for one HTTP request
pub fn request_span<B>(request: &Request<B>) -> Span {
    info_span!(
        "http_request",
        method = %request.method(),
        path = %request.uri().path(),
        request_id = %request_id(request),
    )
}
