// ABOUTME: Generation lifecycle model and the credit ledger entry tied to it
// ABOUTME: Status transitions are pending to completed or pending to failed, never back
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

/// Lifecycle status of a generation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationStatus {
    /// Dispatched, waiting for the backend callback
    Pending,
    /// Backend delivered a result
    Completed,
    /// Backend reported a failure
    Failed,
}

impl GenerationStatus {
    /// Database and wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Terminal generations never change again
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for GenerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(AppError::invalid_input(format!(
                "Unknown generation status: {other}"
            ))),
        }
    }
}

/// One workflow generation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Generation {
    /// Generation id
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Prompt sent to the backend
    pub prompt: String,
    /// Lifecycle status
    pub status: GenerationStatus,
    /// Correlation id issued by the backend at dispatch time
    pub webhook_call_id: Option<String>,
    /// Serialized workflow JSON delivered by the callback
    pub json_result: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last status change
    pub updated_at: DateTime<Utc>,
}

impl Generation {
    /// New pending generation for a user
    #[must_use]
    pub fn pending(user_id: Uuid, prompt: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            prompt: prompt.into(),
            status: GenerationStatus::Pending,
            webhook_call_id: None,
            json_result: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Kind of ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Credit consumed by a generation
    Usage,
}

impl TransactionKind {
    /// Database representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Usage => "usage",
        }
    }
}

/// Settlement status of a ledger entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    /// Recorded and settled
    Completed,
}

impl TransactionStatus {
    /// Database representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
        }
    }
}

/// Append-only credit ledger entry, one per generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// Entry id
    pub id: Uuid,
    /// User charged
    pub user_id: Uuid,
    /// Generation paid for
    pub generation_id: Uuid,
    /// Signed amount, `-1` for usage
    pub amount: i64,
    /// Entry kind
    pub kind: TransactionKind,
    /// Entry status
    pub status: TransactionStatus,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Usage entry charging one generation
    #[must_use]
    pub fn usage(user_id: Uuid, generation_id: Uuid, cost: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            generation_id,
            amount: -cost,
            kind: TransactionKind::Usage,
            status: TransactionStatus::Completed,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_and_terminal() {
        assert_eq!(
            "completed".parse::<GenerationStatus>().unwrap(),
            GenerationStatus::Completed
        );
        assert!("done".parse::<GenerationStatus>().is_err());
        assert!(!GenerationStatus::Pending.is_terminal());
        assert!(GenerationStatus::Failed.is_terminal());
    }

    #[test]
    fn test_generation_serializes_camel_case() {
        let generation = Generation::pending(Uuid::new_v4(), "Create a 3-step onboarding flow");
        let json = serde_json::to_value(&generation).unwrap();

        assert_eq!(json["status"], "pending");
        assert!(json["webhookCallId"].is_null());
        assert!(json.get("userId").is_some());
    }

    #[test]
    fn test_usage_transaction_is_negative() {
        let tx = Transaction::usage(Uuid::new_v4(), Uuid::new_v4(), 1);
        assert_eq!(tx.amount, -1);
        assert_eq!(tx.kind.as_str(), "usage");
    }
}
