mod config;
mod handler;
mod links;
mod server;
mod telegram;
mod update;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::server::AppState;
use crate::telegram::TelegramClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,slotbot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration (fail fast on anything missing or malformed)
    let config = Config::from_env().context("Failed to load configuration")?;

    info!("Configuration loaded successfully");
    info!("  Port: {}", config.port);
    info!("  Hardened access filter: {}", config.is_hardened());
    info!("  Allowed chats: {:?}", config.allowed_chat_ids);
    info!(
        "  Prize contact: {} ({})",
        config.prize_contact_id, config.prize_contact_label
    );

    let client = Arc::new(TelegramClient::new(&config.bot_token));
    let state = AppState {
        config: Arc::new(config),
        client,
    };

    info!("Slot Winner Bot is starting...");
    server::run(state).await
}
