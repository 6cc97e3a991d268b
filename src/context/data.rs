// ABOUTME: Data context for dependency injection of the relational store
// ABOUTME: Wraps the pooled SQLite database shared by every handler
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

use crate::database::Database;

/// Data context containing the database
#[derive(Clone)]
pub struct DataContext {
    database: Database,
}

impl DataContext {
    /// Create new data context
    #[must_use]
    pub const fn new(database: Database) -> Self {
        Self { database }
    }

    /// Get database for persistence operations
    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.database
    }
}
