// ABOUTME: Server binary for the MaaS Workflow Creator backend
// ABOUTME: Loads configuration, initialises logging and the server context, then serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 MaaS Workflow Creator contributors

//! # MaaS Workflow Creator Server Binary
//!
//! Starts the HTTP API backed by the configured database, identity
//! provider, automation agent, generation backend and email provider.

use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use maas_workflow_creator::{config::ServerConfig, context::ServerContext, logging, server};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "maas-server")]
#[command(about = "MaaS Workflow Creator - chat-driven n8n workflow generation backend")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    info!("Starting MaaS Workflow Creator");
    info!("{}", config.summary());

    let context = match ServerContext::init(config).await {
        Ok(context) => Arc::new(context),
        Err(e) => {
            error!("Failed to initialise server: {e:#}");
            return Err(e);
        }
    };

    server::run(context).await
}
