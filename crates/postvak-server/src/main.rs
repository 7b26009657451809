//! # postvak-server
//!
//! HTTP boundary for the Postvak direct-messaging subsystem.
//!
//! This binary provides:
//! - **Message creation** with receiver resolution and the uniform
//!   `{success, message}` response envelope
//! - **Mailboxes** (inbox/outbox with per-party archiving) and thread views
//! - **Session-token authorization** against credentials issued by the
//!   surrounding platform
//! - **REST API** (axum) with CORS, request tracing and a request timeout

mod api;
mod auth;
mod config;
mod error;
mod views;
mod workflow;

use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use postvak_store::Database;

use crate::api::AppState;
use crate::auth::{Authorize, SessionAuthorizer};
use crate::config::ServerConfig;
use crate::workflow::{DbMessageStore, DbReceiverResolver, MessageWorkflow};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,postvak_server=debug")),
        )
        .init();

    info!("Starting Postvak messaging server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Initialize subsystems
    // -----------------------------------------------------------------------

    // Store (migrations run on open)
    let database = match &config.db_path {
        Some(path) => Database::open_at(path, config.db_busy_timeout)?,
        None => Database::new(config.db_busy_timeout)?,
    };
    let db = Arc::new(Mutex::new(database));

    // Creation workflow with its database-backed collaborators
    let workflow = Arc::new(MessageWorkflow::new(
        Arc::new(DbReceiverResolver::new(db.clone())),
        Arc::new(DbMessageStore::new(db.clone())),
    ));

    // Authorizer over the session table
    let authorizer: Arc<dyn Authorize> = Arc::new(SessionAuthorizer::new(db.clone()));

    let app_state = AppState {
        db: db.clone(),
        workflow,
        authorizer,
        config: Arc::new(config.clone()),
    };

    // -----------------------------------------------------------------------
    // 4. Spawn background tasks
    // -----------------------------------------------------------------------

    // Periodic expired-session purge
    let purge_db = db.clone();
    let purge_interval = config.session_purge_interval;
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(purge_interval);
        loop {
            interval.tick().await;
            let purged = purge_db
                .lock()
                .ok()
                .and_then(|db| db.purge_expired_sessions(Utc::now()).ok());
            if let Some(n) = purged {
                if n > 0 {
                    info!(purged = n, "expired sessions removed");
                }
            }
        }
    });

    // -----------------------------------------------------------------------
    // 5. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    // tokio::select! ensures that if either the HTTP server or a shutdown
    // signal arrives, we exit cleanly.
    tokio::select! {
        result = api::serve(app_state, config.http_addr) => {
            if let Err(e) = result {
                tracing::error!(error = %e, "HTTP server failed");
                return Err(e);
            }
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down");
        }
    }

    Ok(())
}
