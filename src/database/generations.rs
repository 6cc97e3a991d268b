// ABOUTME: Generation and credit ledger database operations
// ABOUTME: Atomic charge-and-create, compensation, correlation ids and conditional status updates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use chrono::{DateTime, Utc};
use maas_core::errors::{AppError, AppResult};
use maas_core::models::{
    Generation, GenerationStatus, Transaction, TransactionKind, TransactionStatus,
};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_uuid, Database};

/// Result of the atomic charge-and-create unit
#[derive(Debug, Clone)]
pub struct ChargedGeneration {
    /// The new pending generation
    pub generation: Generation,
    /// The usage entry paying for it
    pub transaction: Transaction,
}

/// Result of applying a backend callback
#[derive(Debug, Clone)]
pub enum CallbackOutcome {
    /// The generation left `pending` with this call
    Transitioned(Generation),
    /// The generation was already in the requested terminal status
    Replayed(Generation),
}

impl CallbackOutcome {
    /// The generation after the callback
    #[must_use]
    pub const fn generation(&self) -> &Generation {
        match self {
            Self::Transitioned(g) | Self::Replayed(g) => g,
        }
    }

    /// Whether this call was a replay
    #[must_use]
    pub const fn is_replay(&self) -> bool {
        matches!(self, Self::Replayed(_))
    }
}

const GENERATION_COLUMNS: &str =
    "id, user_id, prompt, status, webhook_call_id, json_result, created_at, updated_at";

impl Database {
    /// Create generations and transactions tables
    pub(super) async fn migrate_generations(&self) -> anyhow::Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS generations (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                prompt TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'completed', 'failed')),
                webhook_call_id TEXT UNIQUE,
                json_result TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS transactions (
                id TEXT PRIMARY KEY,
                user_id TEXT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                generation_id TEXT NOT NULL UNIQUE REFERENCES generations(id) ON DELETE CASCADE,
                amount INTEGER NOT NULL,
                kind TEXT NOT NULL CHECK (kind IN ('usage')),
                status TEXT NOT NULL CHECK (status IN ('completed')),
                created_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_generations_user_created ON generations(user_id, created_at)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_transactions_user ON transactions(user_id)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Decrement one credit, insert a pending generation and its usage entry
    ///
    /// All three writes commit together. A user with no credits left gets
    /// `INSUFFICIENT_CREDITS` and nothing is written.
    pub async fn charge_and_create_generation(
        &self,
        user_id: Uuid,
        prompt: &str,
        cost: i64,
    ) -> AppResult<ChargedGeneration> {
        let generation = Generation::pending(user_id, prompt);
        let transaction = Transaction::usage(user_id, generation.id, cost);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let charged = sqlx::query(
            r"
            UPDATE users SET credit_balance = credit_balance - $1, updated_at = $2
            WHERE id = $3 AND credit_balance >= $1
            ",
        )
        .bind(cost)
        .bind(generation.created_at)
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to charge credit: {e}")))?;

        if charged.rows_affected() == 0 {
            tx.rollback()
                .await
                .map_err(|e| AppError::database(format!("Failed to roll back charge: {e}")))?;
            return Err(AppError::insufficient_credits());
        }

        sqlx::query(
            r"
            INSERT INTO generations (id, user_id, prompt, status, webhook_call_id, json_result, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NULL, NULL, $5, $6)
            ",
        )
        .bind(generation.id.to_string())
        .bind(user_id.to_string())
        .bind(&generation.prompt)
        .bind(generation.status.as_str())
        .bind(generation.created_at)
        .bind(generation.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to create generation: {e}")))?;

        sqlx::query(
            r"
            INSERT INTO transactions (id, user_id, generation_id, amount, kind, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(transaction.id.to_string())
        .bind(user_id.to_string())
        .bind(generation.id.to_string())
        .bind(transaction.amount)
        .bind(transaction.kind.as_str())
        .bind(transaction.status.as_str())
        .bind(transaction.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to record transaction: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit generation: {e}")))?;

        Ok(ChargedGeneration {
            generation,
            transaction,
        })
    }

    /// Undo [`Self::charge_and_create_generation`] for a generation that was never dispatched
    ///
    /// Deletes the usage entry and the pending generation and refunds the
    /// credit, all in one transaction. Returns `false` if the generation was
    /// already gone or no longer pending, in which case nothing is refunded.
    pub async fn revert_generation(&self, generation_id: Uuid, cost: i64) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::database(format!("Failed to begin transaction: {e}")))?;

        let owner: Option<String> = sqlx::query_scalar(
            "SELECT user_id FROM generations WHERE id = $1 AND status = 'pending'",
        )
        .bind(generation_id.to_string())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to load generation: {e}")))?;

        let Some(owner) = owner else {
            tx.rollback()
                .await
                .map_err(|e| AppError::database(format!("Failed to roll back: {e}")))?;
            return Ok(false);
        };

        sqlx::query("DELETE FROM transactions WHERE generation_id = $1")
            .bind(generation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete transaction: {e}")))?;

        sqlx::query("DELETE FROM generations WHERE id = $1")
            .bind(generation_id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete generation: {e}")))?;

        sqlx::query(
            "UPDATE users SET credit_balance = credit_balance + $1, updated_at = $2 WHERE id = $3",
        )
        .bind(cost)
        .bind(Utc::now())
        .bind(&owner)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to refund credit: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| AppError::database(format!("Failed to commit refund: {e}")))?;
        Ok(true)
    }

    /// Store the correlation id returned by the backend
    ///
    /// A correlation id already used by another generation is reported as
    /// `STATE_CONFLICT`.
    pub async fn set_webhook_call_id(&self, generation_id: Uuid, call_id: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE generations SET webhook_call_id = $1 WHERE id = $2 AND webhook_call_id IS NULL",
        )
        .bind(call_id)
        .bind(generation_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AppError::conflict(format!("Correlation id {call_id} is already in use"))
            }
            other => AppError::database(format!("Failed to store correlation id: {other}")),
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::not_found(format!("Pending generation {generation_id}")));
        }
        Ok(())
    }

    /// Get a generation by id
    pub async fn get_generation(&self, generation_id: Uuid) -> AppResult<Option<Generation>> {
        let row = sqlx::query(&format!(
            "SELECT {GENERATION_COLUMNS} FROM generations WHERE id = $1"
        ))
        .bind(generation_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get generation: {e}")))?;

        row.as_ref().map(row_to_generation).transpose()
    }

    /// Get a generation only if the given user owns it
    pub async fn get_generation_for_user(
        &self,
        generation_id: Uuid,
        user_id: Uuid,
    ) -> AppResult<Option<Generation>> {
        let row = sqlx::query(&format!(
            "SELECT {GENERATION_COLUMNS} FROM generations WHERE id = $1 AND user_id = $2"
        ))
        .bind(generation_id.to_string())
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get generation: {e}")))?;

        row.as_ref().map(row_to_generation).transpose()
    }

    /// Resolve a callback correlation id
    pub async fn get_generation_by_call_id(&self, call_id: &str) -> AppResult<Option<Generation>> {
        let row = sqlx::query(&format!(
            "SELECT {GENERATION_COLUMNS} FROM generations WHERE webhook_call_id = $1"
        ))
        .bind(call_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get generation: {e}")))?;

        row.as_ref().map(row_to_generation).transpose()
    }

    /// List a user's generations, newest first
    pub async fn list_generations_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Generation>> {
        let rows = sqlx::query(&format!(
            r"
            SELECT {GENERATION_COLUMNS} FROM generations
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2 OFFSET $3
            "
        ))
        .bind(user_id.to_string())
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list generations: {e}")))?;

        rows.iter().map(row_to_generation).collect()
    }

    /// Apply a backend callback to the generation with this correlation id
    ///
    /// Only a `pending` generation changes. A terminal generation receiving
    /// the same status again is a replay and stays untouched; a different
    /// status is a `STATE_CONFLICT`.
    pub async fn apply_generation_callback(
        &self,
        call_id: &str,
        status: GenerationStatus,
        json_result: Option<&str>,
    ) -> AppResult<CallbackOutcome> {
        let existing = self
            .get_generation_by_call_id(call_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Generation for webhookCallId {call_id}")))?;

        let updated = sqlx::query(
            r"
            UPDATE generations SET status = $1, json_result = $2, updated_at = $3
            WHERE id = $4 AND status = 'pending'
            ",
        )
        .bind(status.as_str())
        .bind(json_result)
        .bind(Utc::now())
        .bind(existing.id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update generation: {e}")))?;

        let current = self
            .get_generation(existing.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Generation {}", existing.id)))?;

        if updated.rows_affected() == 1 {
            return Ok(CallbackOutcome::Transitioned(current));
        }
        if current.status == status {
            return Ok(CallbackOutcome::Replayed(current));
        }
        Err(AppError::conflict(format!(
            "Generation {} is already {}, cannot become {}",
            current.id, current.status, status
        ))
        .with_details(serde_json::json!({
            "generationId": current.id,
            "currentStatus": current.status,
            "requestedStatus": status,
        })))
    }

    /// Get the usage entry for a generation
    pub async fn get_transaction_for_generation(
        &self,
        generation_id: Uuid,
    ) -> AppResult<Option<Transaction>> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, generation_id, amount, kind, status, created_at
            FROM transactions WHERE generation_id = $1
            ",
        )
        .bind(generation_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get transaction: {e}")))?;

        row.as_ref().map(row_to_transaction).transpose()
    }

    /// Count ledger entries for a user
    pub async fn count_transactions_for_user(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM transactions WHERE user_id = $1")
            .bind(user_id.to_string())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count transactions: {e}")))
    }
}

fn row_to_generation(row: &SqliteRow) -> AppResult<Generation> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let status: String = row.try_get("status")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(Generation {
        id: parse_uuid(&id, "generations.id")?,
        user_id: parse_uuid(&user_id, "generations.user_id")?,
        prompt: row.try_get("prompt")?,
        status: status
            .parse()
            .map_err(|_| AppError::database(format!("Invalid generation status: {status}")))?,
        webhook_call_id: row.try_get("webhook_call_id")?,
        json_result: row.try_get("json_result")?,
        created_at,
        updated_at,
    })
}

fn row_to_transaction(row: &SqliteRow) -> AppResult<Transaction> {
    let id: String = row.try_get("id")?;
    let user_id: String = row.try_get("user_id")?;
    let generation_id: String = row.try_get("generation_id")?;

    Ok(Transaction {
        id: parse_uuid(&id, "transactions.id")?,
        user_id: parse_uuid(&user_id, "transactions.user_id")?,
        generation_id: parse_uuid(&generation_id, "transactions.generation_id")?,
        amount: row.try_get("amount")?,
        kind: TransactionKind::Usage,
        status: TransactionStatus::Completed,
        created_at: row.try_get("created_at")?,
    })
}
