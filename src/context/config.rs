// ABOUTME: Configuration context for dependency injection of server settings
// ABOUTME: Shares the validated ServerConfig with handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use std::sync::Arc;

use crate::config::ServerConfig;

/// Configuration context
#[derive(Clone)]
pub struct ConfigContext {
    config: Arc<ServerConfig>,
}

impl ConfigContext {
    /// Create new configuration context
    #[must_use]
    pub const fn new(config: Arc<ServerConfig>) -> Self {
        Self { config }
    }

    /// Server configuration
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Starting balance for new users
    #[must_use]
    pub fn initial_credit_balance(&self) -> i64 {
        self.config.credits.initial_balance
    }
}
