//! Configuration module for the Hikari bot.
//!
//! Loads configuration from environment variables.

use std::env;
use std::path::PathBuf;

/// Bot running mode
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BotMode {
    Polling,
    Webhook,
}

impl Default for BotMode {
    fn default() -> Self {
        Self::Polling
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Telegram bot token.
    pub bot_token: String,

    /// Base URL of the aniwatch-style API, e.g. `http://localhost:3030/api/v1`.
    pub api_base: String,

    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// User IDs allowed to use the bot (comma-separated in the environment).
    pub allowed_user_ids: Vec<u64>,

    /// Root directory for the per-chat subtitle cache.
    pub subs_dir: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Panics
    /// Panics if required environment variables are not set.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let bot_mode = env::var("BOT_MODE")
            .unwrap_or_else(|_| "polling".to_string())
            .to_lowercase();

        let bot_mode = match bot_mode.as_str() {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = env::var("WEBHOOK_URL").ok();
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            panic!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        let webhook_port = env::var("WEBHOOK_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8443);

        let webhook_secret = env::var("WEBHOOK_SECRET").ok().filter(|s| !s.is_empty());

        let allowed_user_ids = env::var("ALLOWED_USER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        let subs_dir = env::var("SUBS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("subs"));

        Self {
            bot_token: env::var("BOT_TOKEN").expect("BOT_TOKEN must be set"),
            api_base: env::var("ANIWATCH_API_BASE").expect("ANIWATCH_API_BASE must be set"),
            bot_mode,
            webhook_url,
            webhook_port,
            webhook_secret,
            allowed_user_ids,
            subs_dir,
        }
    }
}
