// ABOUTME: Authentication context for dependency injection of identity and webhook gates
// ABOUTME: Holds the session/identity provider and the generation-callback secret gate
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use std::sync::Arc;

use crate::identity::IdentityProvider;
use crate::security::SharedSecretGate;

/// Authentication context
///
/// # Dependencies
/// - `identity`: session verification and signed lifecycle events
/// - `callback_gate`: shared-secret check for backend callbacks
#[derive(Clone)]
pub struct AuthContext {
    identity: Arc<dyn IdentityProvider>,
    callback_gate: SharedSecretGate,
}

impl AuthContext {
    /// Create new auth context
    #[must_use]
    pub fn new(identity: Arc<dyn IdentityProvider>, callback_gate: SharedSecretGate) -> Self {
        Self {
            identity,
            callback_gate,
        }
    }

    /// Identity provider
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.identity.as_ref()
    }

    /// Gate for `POST /api/webhook/generation-callback`
    #[must_use]
    pub const fn callback_gate(&self) -> &SharedSecretGate {
        &self.callback_gate
    }
}
