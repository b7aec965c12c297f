//! Hikari - anime stream Telegram bot.
//!
//! Lets an allow-listed set of users search an anime catalog, pick an
//! episode, and receive the HLS stream link plus the English subtitle file.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `error` - Shared error taxonomy
//! - `catalog` - Upstream anime API client
//! - `session` - Per-chat session store
//! - `access` - Static allow-list gate
//! - `subs` - Subtitle download cache
//! - `bot` - Core bot functionality (with Throttle for API rate limiting)
//! - `plugins` - Command and callback handlers
//! - `utils` - Utility functions

mod access;
mod bot;
mod catalog;
mod config;
mod error;
mod plugins;
mod session;
mod subs;
mod utils;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bot::dispatcher::AppState;
use config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // Initialize logging with sensible defaults
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("hikari=info,teloxide=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Hikari bot...");

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);
    info!("Upstream API base: {}", config.api_base);

    if config.allowed_user_ids.is_empty() {
        info!("No allowed users configured (ALLOWED_USER_IDS is empty)");
    } else {
        info!("Allowed users: {:?}", config.allowed_user_ids);
    }

    // Catalog client, session store and access list behind one state
    let state = AppState::new(&config);

    // Initialize bot with Throttle for automatic rate limiting
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    // Get bot info
    let me = bot.get_me().await?;
    info!("Bot username: @{}", me.username());

    // Build dispatcher
    let dispatcher = bot::build_dispatcher(bot.clone(), state);

    // Run the bot
    bot::run(&config, bot, dispatcher).await;

    Ok(())
}
