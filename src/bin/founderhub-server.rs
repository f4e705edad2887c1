// ABOUTME: HTTP server binary for the FounderHub API and its background job worker
// ABOUTME: Loads configuration, migrates the database and serves until Ctrl-C
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 FounderHub

//! # FounderHub Server Binary
//!
//! Starts the REST API and the durable job scheduler worker. On Ctrl-C the
//! HTTP server drains in-flight requests and then the worker is stopped.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use founderhub::{
    config::environment::ServerConfig, database::Database, logging, resources::ServerResources,
    routes,
};
use tokio::sync::watch;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "founderhub-server")]
#[command(about = "FounderHub - AI persona team backend for startup founders")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }

    logging::init_from_env()?;
    info!("Starting FounderHub server");
    info!("{}", config.summary());

    let database = Database::new(&config.database.url).await?;
    database.migrate().await?;
    info!("Database ready");

    let config = Arc::new(config);
    let resources = Arc::new(ServerResources::from_config(database, config.clone())?);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let scheduler = resources.scheduler.clone();
    let worker = tokio::spawn(async move {
        if let Err(e) = scheduler.run_worker(shutdown_rx).await {
            error!(error = %e, "Job scheduler worker exited with error");
        }
    });

    let app = routes::build_app(&resources);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "HTTP server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped, stopping job worker");
    // Receiver may already be gone if the worker failed at start-up
    let _ = shutdown_tx.send(true);
    if let Err(e) = worker.await {
        error!(error = %e, "Job scheduler worker panicked");
    }

    info!("FounderHub server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "Failed to listen for Ctrl-C");
    }
    info!("Shutdown signal received");
}
