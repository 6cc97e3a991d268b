// ABOUTME: Composed server context with explicit initialisation and teardown
// ABOUTME: Builds every client once from configuration and hands focused contexts to handlers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use std::sync::Arc;

use anyhow::{Context as _, Result};
use maas_core::constants::credits::GENERATION_COST;
use tracing::info;

use super::{AuthContext, ConfigContext, DataContext, NotificationContext, UpstreamContext};
use crate::agent::AgentClient;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::generation::{GenerationBackend, GenerationService, HttpGenerationBackend};
use crate::identity::{IdentityProvider, SessionTokenProvider};
use crate::notifications::{EmailSender, NotificationService, ResendEmailSender};
use crate::security::SharedSecretGate;

/// Externally provided collaborators, swappable in tests
pub struct ServerComponents {
    /// Opened and migrated database
    pub database: Database,
    /// Session and lifecycle-event verification
    pub identity: Arc<dyn IdentityProvider>,
    /// Generation dispatch target
    pub backend: Arc<dyn GenerationBackend>,
    /// Email delivery, `None` disables notifications
    pub email: Option<Arc<dyn EmailSender>>,
}

/// Composed server context containing all focused contexts
#[derive(Clone)]
pub struct ServerContext {
    auth: AuthContext,
    data: DataContext,
    upstream: UpstreamContext,
    notification: NotificationContext,
    config: ConfigContext,
}

impl ServerContext {
    /// Open the database and build every client from configuration
    ///
    /// # Errors
    ///
    /// Fails when the configuration is invalid, the database cannot be
    /// opened, or the identity keys cannot be parsed.
    pub async fn init(config: ServerConfig) -> Result<Self> {
        config.validate()?;

        let database = Database::new(&config.database.url.to_connection_string())
            .await
            .context("Failed to initialise database")?;
        let identity = SessionTokenProvider::new(&config.identity)
            .context("Failed to initialise identity provider")?;
        let backend = HttpGenerationBackend::new(&config.backend);
        let email = ResendEmailSender::from_config(&config.email)
            .map(|sender| Arc::new(sender) as Arc<dyn EmailSender>);

        let components = ServerComponents {
            database,
            identity: Arc::new(identity),
            backend: Arc::new(backend),
            email,
        };
        info!("Server context initialised");
        Ok(Self::from_components(config, components))
    }

    /// Assemble the context from already built collaborators
    #[must_use]
    pub fn from_components(config: ServerConfig, components: ServerComponents) -> Self {
        if components.email.is_none() {
            info!("Email delivery not configured, notifications disabled");
        }
        let notifications =
            NotificationService::new(components.email, &config.email, &config.app_url);
        let generations = GenerationService::new(
            components.database.clone(),
            components.backend,
            notifications.clone(),
            config.callback_url(),
            GENERATION_COST,
        );

        let auth = AuthContext::new(
            components.identity,
            SharedSecretGate::new(config.backend.webhook_secret.clone()),
        );
        let data = DataContext::new(components.database);
        let upstream = UpstreamContext::new(AgentClient::new(&config.agent), generations);
        let notification = NotificationContext::new(notifications);
        let config = ConfigContext::new(Arc::new(config));

        Self {
            auth,
            data,
            upstream,
            notification,
            config,
        }
    }

    /// Release pooled resources
    pub async fn shutdown(&self) {
        self.data.database().close().await;
        info!("Server context shut down");
    }

    /// Get authentication context
    #[must_use]
    pub const fn auth(&self) -> &AuthContext {
        &self.auth
    }

    /// Get data context
    #[must_use]
    pub const fn data(&self) -> &DataContext {
        &self.data
    }

    /// Get upstream context
    #[must_use]
    pub const fn upstream(&self) -> &UpstreamContext {
        &self.upstream
    }

    /// Get notification context
    #[must_use]
    pub const fn notification(&self) -> &NotificationContext {
        &self.notification
    }

    /// Get configuration context
    #[must_use]
    pub const fn config(&self) -> &ConfigContext {
        &self.config
    }
}
