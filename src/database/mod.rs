// ABOUTME: Database management for users, generations and the credit ledger
// ABOUTME: Owns the SQLite pool, connection options and schema migrations
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! # Database Management
//!
//! A single [`Database`] handle wraps a `SqlitePool`. Operations are split by
//! table across submodules, each adding methods to `impl Database`.
//!
//! Credit consumption relies on SQLite's write serialization: the decrement
//! is a conditional `UPDATE` inside a transaction, never an in-process lock.

mod generations;
mod users;

pub use generations::{CallbackOutcome, ChargedGeneration};
pub use users::UserUpsert;

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use maas_core::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use tracing::{debug, info};
use uuid::Uuid;

/// How long a writer waits for the lock before failing with `SQLITE_BUSY`
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Maximum pooled connections for file databases
const MAX_CONNECTIONS: u32 = 8;

/// Database manager for users, generations and transactions
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Open (creating if needed) the database and run migrations
    ///
    /// `sqlite::memory:` databases use a single connection: every extra
    /// pooled connection would otherwise see its own empty database.
    pub async fn new(database_url: &str) -> Result<Self> {
        let is_memory = database_url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("Invalid database URL: {database_url}"))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        if !is_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
            ensure_parent_dir(database_url)?;
        }

        let mut pool_options = SqlitePoolOptions::new();
        pool_options = if is_memory {
            pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            pool_options.max_connections(MAX_CONNECTIONS)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .context("Failed to connect to database")?;

        let db = Self { pool };
        db.migrate().await?;
        info!(memory = is_memory, "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        self.migrate_users().await?;
        self.migrate_generations().await?;
        debug!("Database migrations applied");
        Ok(())
    }

    /// Readiness check
    pub async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Database ping failed: {e}")))?;
        Ok(())
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Create the directory holding a file database
fn ensure_parent_dir(database_url: &str) -> Result<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = std::path::Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Parse a UUID stored as TEXT
pub(crate) fn parse_uuid(value: &str, column: &str) -> AppResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| AppError::database(format!("Invalid UUID in column {column}: {e}")))
}
