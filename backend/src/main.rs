use anyhow::Result;
use chrono::Local;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use reminders_backend::config::ServiceConfig;
use reminders_backend::domain::{DueService, LoggingDueHook};
use reminders_backend::{create_router, initialize_backend};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ServiceConfig::load()?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let app_state = initialize_backend(&config).await?;
    if config.due_poll_seconds > 0 {
        spawn_due_poller(
            app_state.due_service.clone(),
            Duration::from_secs(config.due_poll_seconds),
        );
    }

    let app = create_router(app_state, &config)?;
    let addr = config.socket_addr()?;
    info!("Starting server on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    info!("Listening on {}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Poll for due occurrences; the engine itself runs no timers
fn spawn_due_poller(due_service: DueService, period: Duration) {
    tokio::spawn(async move {
        let hook = LoggingDueHook;
        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            let now = Local::now().naive_local();
            if let Err(e) = due_service.dispatch_due(now, &hook).await {
                error!("Due dispatch failed: {}", e);
            }
        }
    });
}
