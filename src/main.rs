mod config;
mod db;
mod error;
mod handlers;
mod models;
mod state;
mod story;
mod tasks;
mod voting;

use std::sync::Arc;

use log::{error, info};
use tokio::net::TcpListener;

use config::Config;
use db::Database;
use state::AppState;
use story::client::{InferenceClient, TextGenerator};

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Arc::new(Config::from_env());

    // Initialize database
    let database = match Database::connect(&config.database_url).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to initialize database: {e}");
            return;
        }
    };

    let generator: Arc<dyn TextGenerator> = Arc::new(InferenceClient::new(
        config.generation_url.clone(),
        config.generation_token.clone(),
    ));

    // --- Start Background Task for Refreshing Cached Totals ---
    let db_clone = Arc::clone(&database);
    let refresh_secs = config.tally_refresh_secs;
    tokio::spawn(async move {
        tasks::tally_refresher::refresh_tallies_task(db_clone, refresh_secs).await;
    });
    // --- End Background Task ---

    let state = AppState {
        db: database,
        config: Arc::clone(&config),
        generator,
    };
    let app = handlers::router(state);

    let listener = match TcpListener::bind(&config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind {}: {e}", config.bind_addr);
            return;
        }
    };
    info!("Listening on {}", config.bind_addr);

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("Server error: {e}");
    }
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("Received Ctrl+C, shutting down");
    }
}
