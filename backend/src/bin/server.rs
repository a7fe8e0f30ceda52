//! Lesson calendar HTTP server binary.
//!
//! Loads `calendar.toml`, initializes the repository, sets up the HTTP router
//! and starts serving requests.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin lesson-calendar-server
//!
//! CALENDAR_CONFIG=/etc/school/calendar.toml PORT=9000 \
//!   cargo run --bin lesson-calendar-server
//! ```
//!
//! # Environment Variables
//!
//! - `CALENDAR_CONFIG`: Path to the configuration file
//! - `REPOSITORY_TYPE`: Storage backend (default: local)
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use lesson_calendar::config::CalendarConfig;
use lesson_calendar::db;
use lesson_calendar::http::{create_router, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting lesson calendar server");

    let config = CalendarConfig::load().map_err(|e| anyhow::anyhow!(e.to_string()))?;
    info!(
        "Configuration loaded: repository={}, max_range_days={}, {} holidays",
        config.repository.repo_type,
        config.generation.max_range_days,
        config.holidays.dates.len()
    );

    // Initialize global repository once and reuse it across the app
    db::init_repository_with(&config)?;
    let repository = std::sync::Arc::clone(db::get_repository()?);
    info!("Repository initialized successfully");

    let state =
        AppState::from_config(repository, &config).map_err(|e| anyhow::anyhow!(e.to_string()))?;

    // Create router with all endpoints
    let app = create_router(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    info!("Server listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
