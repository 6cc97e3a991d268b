// ABOUTME: Core data models for the workflow creator
// ABOUTME: Re-exports User, Generation, Transaction and ChatMessage types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! # Data Models
//!
//! - `User`: a locally mirrored identity with a credit balance
//! - `Generation`: one workflow generation request and its lifecycle status
//! - `Transaction`: append-only credit ledger entry, one per generation
//! - `ChatMessage`: an in-memory chat turn with its extracted diagrams
//!
//! Every model serializes with camelCase keys since they are returned from
//! the HTTP API unchanged.

mod chat;
mod generation;
mod user;

pub use chat::{ChatMessage, MessageRole};
pub use generation::{Generation, GenerationStatus, Transaction, TransactionKind, TransactionStatus};
pub use user::{User, UserProfile};
