// ABOUTME: Shared-secret verification for generation backend callbacks
// ABOUTME: Compares the x-webhook-secret header with the configured secret in constant time
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Shared-secret gate
//!
//! Both sides are hashed with SHA-256 before the constant-time comparison so
//! the comparison time does not depend on the presented value's length.
//! An empty configured secret never validates anything.

use axum::http::HeaderMap;
use maas_core::constants::headers::WEBHOOK_SECRET;
use maas_core::errors::{AppError, AppResult};
use ring::digest;
use subtle::ConstantTimeEq;

use crate::config::SecretString;

/// Shared-secret validation result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecretValidation {
    /// Presented secret matches
    Valid,
    /// Presented secret differs
    Invalid,
    /// Header absent
    Missing,
    /// No secret configured, nothing can be validated
    NotConfigured,
}

/// Validates the shared secret presented by the generation backend
#[derive(Debug, Clone)]
pub struct SharedSecretGate {
    secret: SecretString,
}

impl SharedSecretGate {
    /// Create a gate for the configured secret
    #[must_use]
    pub const fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// The secret sent on outbound dispatches
    #[must_use]
    pub const fn secret(&self) -> &SecretString {
        &self.secret
    }

    /// Compare a presented value with the configured secret
    #[must_use]
    pub fn validate(&self, presented: Option<&str>) -> SecretValidation {
        if self.secret.is_blank() {
            return SecretValidation::NotConfigured;
        }
        let Some(presented) = presented else {
            return SecretValidation::Missing;
        };

        let expected = digest::digest(&digest::SHA256, self.secret.expose().as_bytes());
        let actual = digest::digest(&digest::SHA256, presented.as_bytes());
        if expected.as_ref().ct_eq(actual.as_ref()).into() {
            SecretValidation::Valid
        } else {
            SecretValidation::Invalid
        }
    }

    /// Check the `x-webhook-secret` header of a request
    ///
    /// Missing or wrong secrets are authentication failures; an unconfigured
    /// secret is a server configuration error.
    pub fn verify_headers(&self, headers: &HeaderMap) -> AppResult<()> {
        let presented = headers.get(WEBHOOK_SECRET).and_then(|v| v.to_str().ok());
        match self.validate(presented) {
            SecretValidation::Valid => Ok(()),
            SecretValidation::Missing => Err(AppError::auth_invalid(format!(
                "Missing {WEBHOOK_SECRET} header"
            ))),
            SecretValidation::Invalid => Err(AppError::auth_invalid("Invalid webhook secret")),
            SecretValidation::NotConfigured => Err(AppError::config_missing("BACKEND_WEBHOOK_SECRET")),
        }
    }
}
