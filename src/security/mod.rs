// ABOUTME: Security module for inbound webhook verification
// ABOUTME: Hosts the shared-secret gate used by generation callbacks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

/// Constant-time shared-secret header check
pub mod webhook_secret;

pub use webhook_secret::{SecretValidation, SharedSecretGate};
