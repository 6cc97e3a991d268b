// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Header names, route paths, timeouts and credit defaults for the workflow creator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Constants module
//!
//! Values shared by the configuration layer, the routes and the tests are
//! grouped here by domain so the string literals live in one place.

/// API endpoints
pub mod endpoints {
    /// Liveness endpoint
    pub const HEALTH_CHECK: &str = "/health";
    /// Readiness endpoint
    pub const READINESS_CHECK: &str = "/ready";
    /// Session status
    pub const AUTH_STATUS: &str = "/api/auth/status";
    /// Manual user synchronisation
    pub const AUTH_SYNC: &str = "/api/auth/sync";
    /// Current user profile
    pub const USERS_ME: &str = "/api/users/me";
    /// Live chat call to the agent
    pub const CHAT_MESSAGES: &str = "/api/chat/messages";
    /// Generation create/list
    pub const GENERATIONS: &str = "/api/generations";
    /// Generation status read
    pub const GENERATION_BY_ID: &str = "/api/generations/:id";
    /// Completion callback from the generation backend
    pub const GENERATION_CALLBACK: &str = "/api/webhook/generation-callback";
    /// Identity provider lifecycle events
    pub const IDENTITY_WEBHOOK: &str = "/api/webhooks/identity";
    /// Agent connectivity diagnostics
    pub const AGENT_PROBE: &str = "/api/agent/probe";
}

/// HTTP header names
pub mod headers {
    /// Shared secret presented by the generation backend
    pub const WEBHOOK_SECRET: &str = "x-webhook-secret";
    /// Request correlation id
    pub const REQUEST_ID: &str = "x-request-id";
    /// Svix message id
    pub const SVIX_ID: &str = "svix-id";
    /// Svix unix timestamp (seconds)
    pub const SVIX_TIMESTAMP: &str = "svix-timestamp";
    /// Svix signature list
    pub const SVIX_SIGNATURE: &str = "svix-signature";
    /// Cookie carrying the session token in browsers
    pub const SESSION_COOKIE: &str = "__session";
}

/// Network defaults
pub mod network {
    /// Default bind address
    pub const DEFAULT_HOST: &str = "0.0.0.0";
    /// Default HTTP port
    pub const DEFAULT_HTTP_PORT: u16 = 3000;
    /// Default public base URL
    pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
    /// Default database location
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/maas.db";
    /// Maximum accepted request body in bytes
    pub const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;
}

/// Outbound call timeouts in seconds
pub mod timeouts {
    /// Live chat call to the agent
    pub const AGENT_TIMEOUT_SECS: u64 = 30;
    /// Connectivity probe GET
    pub const PROBE_TIMEOUT_SECS: u64 = 5;
    /// Generation dispatch
    pub const DISPATCH_TIMEOUT_SECS: u64 = 30;
    /// Email provider call
    pub const EMAIL_TIMEOUT_SECS: u64 = 10;
    /// Connect timeout for every outbound client
    pub const CONNECT_TIMEOUT_SECS: u64 = 5;
    /// Accepted clock skew for signed identity events
    pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;
}

/// Credit accounting
pub mod credits {
    /// Balance granted to newly created users
    pub const DEFAULT_INITIAL_BALANCE: i64 = 5;
    /// Amount recorded for one generation
    pub const GENERATION_COST: i64 = 1;
}

/// Email defaults
pub mod email {
    /// Resend API base URL
    pub const DEFAULT_RESEND_API_URL: &str = "https://api.resend.com";
    /// Sender used for onboarding mail
    pub const DEFAULT_FROM: &str = "MaaS Workflow Creator <onboarding@resend.dev>";
    /// Sender used for generation notifications
    pub const DEFAULT_NOTIFICATIONS_FROM: &str = "MaaS Workflow Creator <notifications@resend.dev>";
}

/// Messages shared with clients
pub mod messages {
    /// Body of the test message sent by the POST probe
    pub const DEFAULT_PROBE_MESSAGE: &str = "Test message";
}
