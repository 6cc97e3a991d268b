// ABOUTME: Identity provider capability: session verification and signed lifecycle events
// ABOUTME: Defines the IdentityProvider trait and the event types it produces
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! # Identity
//!
//! Users authenticate with an external identity provider. The service only
//! sees two things from it:
//!
//! - a session token on every browser request, turned into a
//!   [`SessionIdentity`] by [`IdentityProvider::current_session`]
//! - signed lifecycle webhooks, turned into an [`IdentityEvent`] by
//!   [`IdentityProvider::verify_webhook`] once the signature checks out

/// JWT session verification and the default provider
pub mod session;
/// Svix-style webhook signatures
pub mod svix;

use axum::http::HeaderMap;
use maas_core::errors::{AppError, AppResult};
use serde::{Deserialize, Serialize};

pub use session::SessionTokenProvider;
pub use svix::SvixVerifier;

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdentity {
    /// Identity provider user id
    pub external_id: String,
    /// Email claim, if present
    pub email: Option<String>,
    /// Display name claim, if present
    pub name: Option<String>,
}

/// User attributes carried by lifecycle events
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    /// Identity provider user id
    pub external_id: String,
    /// First listed email address
    pub email: Option<String>,
    /// First and last name joined by a space
    pub name: Option<String>,
}

/// A verified lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentityEvent {
    /// `user.created`
    UserCreated(IdentityUser),
    /// `user.updated`
    UserUpdated(IdentityUser),
    /// `user.deleted`
    UserDeleted {
        /// Identity provider user id
        external_id: String,
    },
    /// Any other event type, acknowledged and ignored
    Ignored {
        /// The event type as sent
        event_type: String,
    },
}

impl IdentityEvent {
    /// Event type name as sent by the provider
    #[must_use]
    pub fn event_type(&self) -> &str {
        match self {
            Self::UserCreated(_) => "user.created",
            Self::UserUpdated(_) => "user.updated",
            Self::UserDeleted { .. } => "user.deleted",
            Self::Ignored { event_type } => event_type,
        }
    }
}

#[derive(Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: EventUser,
}

#[derive(Default, Deserialize)]
struct EventUser {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<EventEmail>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Deserialize)]
struct EventEmail {
    email_address: String,
}

impl IdentityEvent {
    /// Decode a verified webhook payload
    pub fn from_payload(payload: &[u8]) -> AppResult<Self> {
        let envelope: EventEnvelope = serde_json::from_slice(payload)
            .map_err(|e| AppError::invalid_input(format!("Malformed identity event: {e}")))?;

        let known = matches!(
            envelope.event_type.as_str(),
            "user.created" | "user.updated" | "user.deleted"
        );
        if !known {
            return Ok(Self::Ignored {
                event_type: envelope.event_type,
            });
        }

        let data = envelope.data;
        let external_id = data
            .id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| AppError::missing_field("data.id"))?;

        if envelope.event_type == "user.deleted" {
            return Ok(Self::UserDeleted { external_id });
        }

        let user = IdentityUser {
            external_id,
            email: data
                .email_addresses
                .into_iter()
                .next()
                .map(|e| e.email_address)
                .filter(|e| !e.is_empty()),
            name: join_name(data.first_name.as_deref(), data.last_name.as_deref()),
        };
        Ok(if envelope.event_type == "user.created" {
            Self::UserCreated(user)
        } else {
            Self::UserUpdated(user)
        })
    }
}

/// Join first and last name, skipping blanks
#[must_use]
pub fn join_name(first: Option<&str>, last: Option<&str>) -> Option<String> {
    let name = [first, last]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
    (!name.is_empty()).then_some(name)
}

/// Capability the routes need from the identity provider
pub trait IdentityProvider: Send + Sync {
    /// Identity of the caller, `None` when no session is presented
    ///
    /// A session that is presented but does not verify is an error.
    fn current_session(&self, headers: &HeaderMap) -> AppResult<Option<SessionIdentity>>;

    /// Verify a lifecycle webhook and decode its event
    ///
    /// The signature is checked before the payload is parsed.
    fn verify_webhook(&self, payload: &[u8], headers: &HeaderMap) -> AppResult<IdentityEvent>;

    /// External id of the caller, if signed in
    fn current_user_id(&self, headers: &HeaderMap) -> AppResult<Option<String>> {
        Ok(self.current_session(headers)?.map(|s| s.external_id))
    }

    /// Identity of the caller or `AUTH_REQUIRED`
    fn require_session(&self, headers: &HeaderMap) -> AppResult<SessionIdentity> {
        self.current_session(headers)?
            .ok_or_else(AppError::auth_required)
    }
}
