//! /search command plugin.
//!
//! Sends a placeholder message right away, then edits it into either the
//! result keyboard, a "no results" note, or a short failure message.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use tracing::{error, warn};

use super::{deny, episodes};
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::session::SearchEntry;

/// Handle the /search command.
pub async fn search_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
    query: String,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;

    if state.access.check(user.id).is_err() {
        warn!(user_id = user.id.0, "rejected /search from unlisted user");
        return deny(&bot, chat_id).await;
    }

    let query = query.trim();
    if query.is_empty() {
        bot.send_message(chat_id, "Usage: /search <anime_name>").await?;
        return Ok(());
    }

    let placeholder = bot
        .send_message(chat_id, format!("Searching for {query}…"))
        .await?;

    let results = match state.catalog.search(query, 1).await {
        Ok(results) => results,
        Err(err) => {
            error!(%err, query, "search failed");
            bot.edit_message_text(chat_id, placeholder.id, "Search failed.")
                .await?;
            return Ok(());
        }
    };

    if results.is_empty() {
        bot.edit_message_text(chat_id, placeholder.id, "No results.")
            .await?;
        return Ok(());
    }

    let entries: Vec<SearchEntry> = results
        .iter()
        .map(|r| SearchEntry {
            title: r.title.clone(),
            slug: r.slug.clone(),
        })
        .collect();

    let keyboard = selection_keyboard(&entries);
    state.sessions.store_search(chat_id.0, entries);

    bot.edit_message_text(chat_id, placeholder.id, "Select anime:")
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// One button per hit; the payload is the hit's index in the cached list.
fn selection_keyboard(entries: &[SearchEntry]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(entries.iter().enumerate().map(|(i, entry)| {
        vec![InlineKeyboardButton::callback(
            entry.title.clone(),
            format!("{}{i}", episodes::ANIME_PREFIX),
        )]
    }))
}
