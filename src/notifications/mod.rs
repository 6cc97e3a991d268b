// ABOUTME: Transactional email notifications for account and generation events
// ABOUTME: Best-effort delivery on spawned tasks whose failures are logged, never surfaced
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! Email notifications
//!
//! Delivery never blocks or fails the request that triggered it: each send
//! runs on its own task and the [`JoinHandle`] is handed back so tests can
//! await completion. Without a configured sender every notification is a
//! logged no-op.

/// Resend API client
pub mod email;
/// HTML bodies
pub mod templates;

use std::sync::Arc;

use async_trait::async_trait;
use maas_core::errors::AppResult;
use maas_core::models::{Generation, User};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub use email::ResendEmailSender;

use crate::config::EmailConfig;

/// A single outbound email
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    /// Sender address
    pub from: String,
    /// Recipient address
    pub to: String,
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
}

/// Capability to deliver one email
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Deliver the message or report why it could not be
    async fn send(&self, message: &EmailMessage) -> AppResult<()>;
}

/// Builds and dispatches notification emails
#[derive(Clone)]
pub struct NotificationService {
    sender: Option<Arc<dyn EmailSender>>,
    app_url: String,
    from: String,
    notifications_from: String,
    send_welcome_email: bool,
}

impl NotificationService {
    /// Service with an explicit sender, `None` to disable delivery
    #[must_use]
    pub fn new(sender: Option<Arc<dyn EmailSender>>, config: &EmailConfig, app_url: &str) -> Self {
        Self {
            sender,
            app_url: app_url.trim_end_matches('/').to_owned(),
            from: config.from.clone(),
            notifications_from: config.notifications_from.clone(),
            send_welcome_email: config.send_welcome_email,
        }
    }

    /// Service backed by the Resend API when a key is configured
    #[must_use]
    pub fn from_config(config: &EmailConfig, app_url: &str) -> Self {
        let sender = ResendEmailSender::from_config(config)
            .map(|s| Arc::new(s) as Arc<dyn EmailSender>);
        if sender.is_none() {
            info!("RESEND_API_KEY not set, email notifications disabled");
        }
        Self::new(sender, config, app_url)
    }

    /// Whether a sender is configured
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Link to a generation in the dashboard
    #[must_use]
    pub fn generation_url(&self, generation_id: &str) -> String {
        format!("{}/generations/{generation_id}", self.app_url)
    }

    /// Welcome a newly created user
    ///
    /// Returns `None` when nothing was scheduled.
    pub fn spawn_welcome(&self, user: &User) -> Option<JoinHandle<()>> {
        if !self.send_welcome_email {
            return None;
        }
        let to = recipient(user)?;
        let message = EmailMessage {
            from: self.from.clone(),
            to,
            subject: templates::WELCOME_SUBJECT.to_owned(),
            html: templates::welcome_email(
                user.display_name(),
                &format!("{}/chat", self.app_url),
            ),
        };
        self.spawn(message, "welcome")
    }

    /// Tell the owner a generation completed
    ///
    /// Returns `None` when nothing was scheduled.
    pub fn spawn_generation_complete(
        &self,
        user: &User,
        generation: &Generation,
    ) -> Option<JoinHandle<()>> {
        let to = recipient(user)?;
        let generation_id = generation.id.to_string();
        let message = EmailMessage {
            from: self.notifications_from.clone(),
            to,
            subject: templates::GENERATION_COMPLETE_SUBJECT.to_owned(),
            html: templates::generation_complete_email(
                user.display_name(),
                &generation_id,
                None,
                &self.generation_url(&generation_id),
            ),
        };
        self.spawn(message, "generation_complete")
    }

    fn spawn(&self, message: EmailMessage, kind: &'static str) -> Option<JoinHandle<()>> {
        let Some(sender) = self.sender.clone() else {
            info!(kind, "Email delivery disabled, skipping notification");
            return None;
        };
        Some(tokio::spawn(async move {
            match sender.send(&message).await {
                Ok(()) => info!(kind, "Notification email sent"),
                Err(e) => warn!(kind, error = %e, "Notification email failed"),
            }
        }))
    }
}

fn recipient(user: &User) -> Option<String> {
    let email = user.email.as_deref().filter(|e| !e.trim().is_empty());
    if email.is_none() {
        info!(user_id = %user.id, "User has no email address, skipping notification");
    }
    email.map(ToOwned::to_owned)
}
