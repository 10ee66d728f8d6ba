//! Timeless Habits webhook server.
//!
//! Listens for Todoist webhooks on `POST /webhooks` and recreates completed
//! habit tasks with their counters and dates advanced.
//!
//! # Usage
//!
//! ```bash
//! # Secrets come from the environment (or --client-secret / --access-token)
//! export TODOIST_CLIENT_SECRET=...
//! export TODOIST_ACCESS_TOKEN=...
//!
//! # Run on default address 0.0.0.0:8080
//! cargo run --bin habits-server
//!
//! # Run on custom address
//! cargo run --bin habits-server -- --bind 127.0.0.1:3000
//! ```

use std::sync::Arc;

use clap::Parser;
use habits_server::config::{HabitsCliArgs, HabitsConfig};
use habits_server::server::{self, AppState};
use habits_server::todoist::TodoistClient;
use habits_server::webhook::WebhookProcessor;

#[tokio::main]
async fn main() {
    let cli = HabitsCliArgs::parse();

    // Load config from CLI args + config file + env vars + defaults.
    let config = match HabitsConfig::load(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            std::process::exit(1);
        }
    };

    // Initialize tracing with the resolved log level.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let client = match TodoistClient::new(
        &config.api_base_url,
        config.access_token.expose(),
        config.request_timeout,
    ) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to build todoist client");
            std::process::exit(1);
        }
    };

    tracing::info!(
        addr = %config.bind_addr,
        api = %config.api_base_url,
        "starting timeless habits webhook server"
    );

    let processor = WebhookProcessor::new(config.client_secret.expose(), Arc::new(client));
    let state = Arc::new(AppState::with_config(processor, config.max_body_size));

    match server::start_server_with_state(&config.bind_addr, state).await {
        Ok((bound_addr, handle)) => {
            tracing::info!(addr = %bound_addr, "webhook server listening");
            if let Err(e) = handle.await {
                tracing::error!(error = %e, "webhook server task failed");
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to start webhook server");
            std::process::exit(1);
        }
    }
}
