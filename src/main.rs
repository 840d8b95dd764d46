// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! km-ensemble API Server
//!
//! Serves group dashboards, entry logging and route administration over
//! HTTP, with live updates as Server-Sent Events.

use km_ensemble::{config::Config, db::GroupStore, AppState};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env()?;
    tracing::info!(
        port = config.port,
        group_id = %config.group_id,
        storage = ?config.storage,
        "Starting km-ensemble API"
    );

    let state = Arc::new(AppState::from_config(config.clone()).await?);

    // Make sure the configured group exists before the first client arrives.
    // An unreachable remote store is not fatal: requests report it as 503.
    match state.groups.store().load_group(&config.group_id).await {
        Ok(group) => tracing::info!(
            group_id = %group.id,
            milestones = group.milestones.len(),
            members = group.members.len(),
            "Group ready"
        ),
        Err(e) => tracing::warn!(error = %e, "Configured group not loaded at startup"),
    }

    // Build router
    let app = km_ensemble::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("km_ensemble=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
