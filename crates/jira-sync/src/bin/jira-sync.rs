//! Jira sync service binary.
//!
//! Standalone HTTP service receiving GitHub webhooks.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jira_sync::{config::Config, server};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing; LOG_FORMAT=json for structured output
    let filter = EnvFilter::from_default_env().add_directive("jira_sync=info".parse()?);
    let json_logs = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));
    if json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    info!("Starting Jira sync service...");

    // Load configuration
    let config = Config::default();
    info!(
        on_pr_opened = %config.statuses.on_pr_opened,
        on_pr_merged = %config.statuses.on_pr_merged,
        comment_on_pr_sync = config.statuses.comment_on_pr_sync,
        "Loaded status configuration"
    );

    // Build application state and router
    let state = server::AppState::from_config(&config);
    let app = server::build_router(state);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port = config.port, "Jira sync service listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
