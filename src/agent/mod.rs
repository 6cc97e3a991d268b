// ABOUTME: Conversation with the automation agent
// ABOUTME: Reply parsing, in-memory transcripts and the agent webhook client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! # Agent
//!
//! - [`parser`]: splits replies into prose and Mermaid diagram segments
//! - [`session`]: chat transcript with per-diagram access
//! - [`client`]: HTTP calls to the agent webhook

/// HTTP client for the agent webhook
pub mod client;
/// Reply parser / diagram extractor
pub mod parser;
/// In-memory chat transcript
pub mod session;

pub use client::{AgentClient, ProbeReport};
pub use parser::{parse_reply, ParsedReply, Segment};
pub use session::ChatSession;
