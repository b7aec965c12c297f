//! Plugin system for command handlers.
//!
//! Add new plugins by:
//! 1. Creating a new file in this directory
//! 2. Adding `pub mod your_plugin;` below
//! 3. Adding the handler to `command_handler()` or `callback_handler()`

pub mod episodes;
pub mod search;
pub mod start;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::dispatcher::ThrottledBot;

/// All bot commands.
#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Available commands:")]
pub enum Command {
    #[command(description = "Start the bot")]
    Start,

    #[command(description = "Search the anime catalog")]
    Search(String),
}

/// Build the combined command handler.
pub fn command_handler() -> UpdateHandler<anyhow::Error> {
    use dptree::case;

    teloxide::filter_command::<Command, _>()
        .branch(case![Command::Start].endpoint(start::start_command))
        .branch(case![Command::Search(query)].endpoint(search::search_command))
}

/// Build the callback query handler.
pub fn callback_handler() -> UpdateHandler<anyhow::Error> {
    Update::filter_callback_query()
        .branch(
            dptree::filter(|q: CallbackQuery| has_prefix(&q, episodes::ANIME_PREFIX))
                .endpoint(episodes::anime_callback),
        )
        .branch(
            dptree::filter(|q: CallbackQuery| has_prefix(&q, episodes::EPISODE_PREFIX))
                .endpoint(episodes::episode_callback),
        )
        .branch(
            dptree::filter(|q: CallbackQuery| q.data.as_deref() == Some(episodes::EPISODE_ALL))
                .endpoint(episodes::episode_all_callback),
        )
}

fn has_prefix(q: &CallbackQuery, prefix: &str) -> bool {
    q.data.as_ref().map(|d| d.starts_with(prefix)).unwrap_or(false)
}

/// Reply sent whenever the access gate rejects a caller.
pub(crate) async fn deny(bot: &ThrottledBot, chat_id: ChatId) -> anyhow::Result<()> {
    bot.send_message(chat_id, "🚫 Access denied").await?;
    Ok(())
}
