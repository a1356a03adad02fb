mod config;
mod download;
mod link;
mod platform;
mod router;
mod tiktok;

use std::sync::Arc;

use anyhow::{Context, Result};
use teloxide::prelude::*;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::router::Router;
use crate::tiktok::TikTokClient;

#[tokio::main]
async fn main() -> Result<()> {
    // A local .env is optional
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tiktok_bot=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = config::config_path();
    info!("Loading configuration from: {}", config_path.display());
    let config = Config::load(&config_path).inspect_err(|e| error!("{:#}", e))?;

    info!("Configuration loaded successfully");
    info!("  Max video size: {} bytes", config.tiktok.max_video_bytes);
    info!(
        "  Request timeout: {}",
        config
            .tiktok
            .request_timeout_secs
            .map(|s| format!("{}s", s))
            .unwrap_or_else(|| "none".to_string())
    );

    let fetcher = Arc::new(TikTokClient::new(&config.tiktok)?);

    let bot = Bot::new(&config.telegram.bot_token);
    let me = bot
        .get_me()
        .await
        .context("Failed to reach Telegram, check the bot token")?;
    let username = me.username().to_string();
    info!("Started bot: @{}", username);

    let router = Arc::new(Router::new(fetcher, username));

    info!("Bot is starting...");
    platform::telegram::run(bot, router).await?;

    Ok(())
}
