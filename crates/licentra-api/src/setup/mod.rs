//! Application setup and initialization
//!
//! This module contains all application initialization logic extracted from
//! main.rs for better organization and testability.

pub mod bootstrap;
pub mod database;
pub mod routes;
pub mod server;

use crate::state::AppState;
use anyhow::{Context, Result};
use licentra_core::AppConfig;
use std::sync::Arc;

/// Initialize the entire application
pub async fn initialize_app(config: AppConfig) -> Result<(Arc<AppState>, axum::Router)> {
    // Initialize tracing first so setup steps are visible
    crate::telemetry::init_telemetry();

    // Validate configuration - fail fast on misconfiguration
    config
        .validate()
        .context("Configuration validation failed")?;

    tracing::info!("Configuration loaded and validated successfully");

    // Setup database
    let pool = database::setup_database(&config).await?;

    // Build state (repositories + token signer)
    let state = Arc::new(AppState::new(pool, config)?);

    // Ensure the configured admin principal exists
    bootstrap::ensure_default_admin(&state).await?;

    // Setup routes
    let router = routes::setup_routes(&state.config, state.clone())?;

    Ok((state, router))
}
