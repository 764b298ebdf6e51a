mod config;
mod db;
mod error;
mod handlers;
mod metrics;
mod models;
mod rate_limit;
mod state;

use clap::Parser; // for cli
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Args;
use crate::db::{Database, MemoryDatabase, RestDatabase};
use crate::rate_limit::{RATE_LIMIT_QUOTA, RATE_LIMIT_WINDOW_MS, RateLimiter, expired_entry_sweeper};
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agency_gateway=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // parse cli arguments
    let args = Args::parse();

    let db: Arc<dyn Database> = match (&args.database_url, &args.database_key) {
        (Some(url), Some(key)) => {
            tracing::info!(url = %url, "Using hosted database");
            Arc::new(RestDatabase::new(url, key.clone(), Duration::from_secs(args.db_timeout))?)
        }
        (Some(_), None) => {
            return Err("--database-key (SUPABASE_SERVICE_ROLE_KEY) is required with --database-url".into());
        }
        _ => {
            tracing::warn!("No database URL configured; using in-memory store, data is lost on restart");
            Arc::new(MemoryDatabase::new())
        }
    };

    if args.admin_token.is_none() {
        tracing::warn!("ADMIN_TOKEN not set; admin routes will reject every request");
    }

    // one limiter per process, handed to handlers through state
    let rate_limiter = Arc::new(RateLimiter::default());

    let state = Arc::new(AppState {
        db,
        rate_limiter: rate_limiter.clone(),
        admin_token: args.admin_token.clone(),
    });

    // spawn the background sweeper
    let sweep_interval = Duration::from_secs(args.sweep_interval.max(1));
    tokio::spawn(async move {
        expired_entry_sweeper(rate_limiter, sweep_interval).await;
    });

    let app = handlers::router(state);

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        address = %listener.local_addr()?,
        quota = RATE_LIMIT_QUOTA,
        window_ms = RATE_LIMIT_WINDOW_MS,
        "Agency gateway listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

// Wait for Ctrl+C
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
