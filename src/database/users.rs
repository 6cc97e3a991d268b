// ABOUTME: User database operations
// ABOUTME: Mirrors identity provider users locally and reads their credit balance
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use chrono::{DateTime, Utc};
use maas_core::errors::{AppError, AppResult};
use maas_core::models::User;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

use super::{parse_uuid, Database};

/// Outcome of writing an identity into the local user table
#[derive(Debug, Clone)]
pub struct UserUpsert {
    /// Current row
    pub user: User,
    /// `true` when the row did not exist before
    pub created: bool,
}

impl Database {
    /// Create the users table
    pub(super) async fn migrate_users(&self) -> anyhow::Result<()> {
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                external_id TEXT NOT NULL UNIQUE,
                email TEXT,
                name TEXT,
                credit_balance INTEGER NOT NULL DEFAULT 0 CHECK (credit_balance >= 0),
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_users_email ON users(email)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert the user if unknown, otherwise refresh email and name
    ///
    /// Existing balances are never touched.
    pub async fn upsert_user(
        &self,
        external_id: &str,
        email: Option<&str>,
        name: Option<&str>,
        initial_balance: i64,
    ) -> AppResult<UserUpsert> {
        let created = self
            .insert_user_if_absent(external_id, email, name, initial_balance)
            .await?;

        if !created {
            sqlx::query(
                r"
                UPDATE users SET email = $1, name = $2, updated_at = $3
                WHERE external_id = $4
                ",
            )
            .bind(email)
            .bind(name)
            .bind(Utc::now())
            .bind(external_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update user: {e}")))?;
        }

        let user = self
            .get_user_by_external_id(external_id)
            .await?
            .ok_or_else(|| AppError::internal("User vanished after upsert"))?;
        Ok(UserUpsert { user, created })
    }

    /// Insert the user only if no row exists for the external id
    pub async fn ensure_user(
        &self,
        external_id: &str,
        email: Option<&str>,
        name: Option<&str>,
        initial_balance: i64,
    ) -> AppResult<UserUpsert> {
        let created = self
            .insert_user_if_absent(external_id, email, name, initial_balance)
            .await?;
        let user = self
            .get_user_by_external_id(external_id)
            .await?
            .ok_or_else(|| AppError::internal("User vanished after insert"))?;
        Ok(UserUpsert { user, created })
    }

    async fn insert_user_if_absent(
        &self,
        external_id: &str,
        email: Option<&str>,
        name: Option<&str>,
        initial_balance: i64,
    ) -> AppResult<bool> {
        let user = User::new(
            external_id,
            email.map(ToOwned::to_owned),
            name.map(ToOwned::to_owned),
            initial_balance,
        );

        let result = sqlx::query(
            r"
            INSERT INTO users (id, external_id, email, name, credit_balance, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT(external_id) DO NOTHING
            ",
        )
        .bind(user.id.to_string())
        .bind(&user.external_id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(user.credit_balance)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create user: {e}")))?;

        Ok(result.rows_affected() == 1)
    }

    /// Get a user by internal id
    pub async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, external_id, email, name, credit_balance, created_at, updated_at
            FROM users WHERE id = $1
            ",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Get a user by identity provider id
    pub async fn get_user_by_external_id(&self, external_id: &str) -> AppResult<Option<User>> {
        let row = sqlx::query(
            r"
            SELECT id, external_id, email, name, credit_balance, created_at, updated_at
            FROM users WHERE external_id = $1
            ",
        )
        .bind(external_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;

        row.as_ref().map(row_to_user).transpose()
    }

    /// Delete a user and, by cascade, their generations and transactions
    ///
    /// Returns `false` when no such user existed.
    pub async fn delete_user_by_external_id(&self, external_id: &str) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE external_id = $1")
            .bind(external_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete user: {e}")))?;

        Ok(result.rows_affected() > 0)
    }
}

fn row_to_user(row: &SqliteRow) -> AppResult<User> {
    let id: String = row.try_get("id")?;
    let created_at: DateTime<Utc> = row.try_get("created_at")?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at")?;

    Ok(User {
        id: parse_uuid(&id, "users.id")?,
        external_id: row.try_get("external_id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        credit_balance: row.try_get("credit_balance")?,
        created_at,
        updated_at,
    })
}
