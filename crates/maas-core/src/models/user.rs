// ABOUTME: User model mirrored from the identity provider
// ABOUTME: Holds the external identity id and the non-negative credit balance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user known to the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Internal id
    pub id: Uuid,
    /// Identity provider id, unique
    pub external_id: String,
    /// Primary email, if the provider shared one
    pub email: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Remaining generation credits, never negative
    pub credit_balance: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a brand new user with the given starting balance
    #[must_use]
    pub fn new(
        external_id: impl Into<String>,
        email: Option<String>,
        name: Option<String>,
        credit_balance: i64,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            external_id: external_id.into(),
            email,
            name,
            credit_balance: credit_balance.max(0),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the user can start another generation
    #[must_use]
    pub const fn has_credits(&self) -> bool {
        self.credit_balance > 0
    }

    /// Name to greet the user with
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .unwrap_or("there")
    }
}

/// Public profile returned by `/api/users/me`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    /// Internal id
    pub id: Uuid,
    /// Primary email
    pub email: Option<String>,
    /// Display name
    pub name: Option<String>,
    /// Remaining credits
    pub credit_balance: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            credit_balance: user.credit_balance,
            created_at: user.created_at,
        }
    }
}
