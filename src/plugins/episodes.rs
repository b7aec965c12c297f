//! Episode selection and delivery callbacks.
//!
//! Three payload shapes arrive here: `anime_idx:<i>` picks a search hit and
//! shows its episode list, `episode_idx:<i>` delivers one stream link plus a
//! best-effort subtitle, and `episode_all` walks the whole cached list.

use teloxide::prelude::*;
use teloxide::types::{
    ChatId, InlineKeyboardButton, InlineKeyboardMarkup, InputFile, MessageId, ParseMode,
};
use tracing::{debug, error, warn};

use super::deny;
use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::catalog::model::Episode;
use crate::subs;
use crate::utils::escape_markdown;

pub const ANIME_PREFIX: &str = "anime_idx:";
pub const EPISODE_PREFIX: &str = "episode_idx:";
pub const EPISODE_ALL: &str = "episode_all";

const STALE_REPLY: &str = "That selection is no longer valid, run /search again.";

/// Handle an `anime_idx:<i>` button press: list the episodes of that hit.
pub async fn anime_callback(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
) -> anyhow::Result<()> {
    let Some((chat_id, message_id)) = origin_of(&q) else {
        return Ok(());
    };

    if state.access.check(q.from.id).is_err() {
        warn!(user_id = q.from.id.0, "rejected callback from unlisted user");
        return deny(&bot, chat_id).await;
    }
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(index) = payload_index(q.data.as_deref(), ANIME_PREFIX) else {
        return Ok(());
    };

    let entry = match state.sessions.search_entry(chat_id.0, index) {
        Ok(entry) => entry,
        Err(err) => {
            debug!(%err, "anime selection no longer resolves");
            bot.send_message(chat_id, STALE_REPLY).await?;
            return Ok(());
        }
    };

    bot.edit_message_text(
        chat_id,
        message_id,
        format!("Fetching episodes for {}…", entry.title),
    )
    .await?;

    let episodes = match state.catalog.list_episodes(&entry.slug).await {
        Ok(episodes) => episodes,
        Err(err) => {
            error!(%err, slug = %entry.slug, "episode listing failed");
            bot.edit_message_text(chat_id, message_id, "Could not fetch the episode list.")
                .await?;
            return Ok(());
        }
    };

    let keyboard = episode_keyboard(&episodes);
    state
        .sessions
        .store_episodes(chat_id.0, entry.title, episodes);

    bot.edit_message_text(chat_id, message_id, "Select episode:")
        .reply_markup(keyboard)
        .await?;

    Ok(())
}

/// Handle an `episode_idx:<i>` button press: deliver one stream link, then
/// try the subtitle as a side step.
pub async fn episode_callback(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
) -> anyhow::Result<()> {
    let Some((chat_id, _)) = origin_of(&q) else {
        return Ok(());
    };

    if state.access.check(q.from.id).is_err() {
        warn!(user_id = q.from.id.0, "rejected callback from unlisted user");
        return deny(&bot, chat_id).await;
    }
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(index) = payload_index(q.data.as_deref(), EPISODE_PREFIX) else {
        return Ok(());
    };

    let episode = match state.sessions.episode(chat_id.0, index) {
        Ok(episode) => episode,
        Err(err) => {
            debug!(%err, "episode selection no longer resolves");
            bot.send_message(chat_id, STALE_REPLY).await?;
            return Ok(());
        }
    };

    let title = state
        .sessions
        .anime_title(chat_id.0)
        .unwrap_or_else(|| "Unknown".to_string());

    bot.send_message(chat_id, format!("{title} — Episode {}", episode.number))
        .await?;

    let stream = match state.catalog.resolve_stream(&episode.episode_ref).await {
        Ok(stream) => stream,
        Err(err) => {
            error!(%err, episode_ref = %episode.episode_ref, "stream resolution failed");
            bot.send_message(chat_id, "⚠️ Could not fetch stream.").await?;
            return Ok(());
        }
    };

    let Some(hls_url) = stream.hls_url.as_deref() else {
        bot.send_message(chat_id, "⚠️ Stream not available.").await?;
        return Ok(());
    };

    bot.send_message(chat_id, format!("HLS: `{}`", escape_markdown(hls_url)))
        .parse_mode(ParseMode::MarkdownV2)
        .await?;

    // The stream reply above already went out; subtitle trouble only
    // produces its own notice.
    deliver_subtitle(&bot, &state, chat_id, &episode, stream.subtitle_url.as_deref()).await;

    Ok(())
}

/// Handle the `episode_all` button: send every cached episode's stream link,
/// skipping the ones that fail. Subtitles are not delivered in bulk mode.
pub async fn episode_all_callback(
    bot: ThrottledBot,
    q: CallbackQuery,
    state: AppState,
) -> anyhow::Result<()> {
    let Some((chat_id, message_id)) = origin_of(&q) else {
        return Ok(());
    };

    if state.access.check(q.from.id).is_err() {
        warn!(user_id = q.from.id.0, "rejected callback from unlisted user");
        return deny(&bot, chat_id).await;
    }
    bot.answer_callback_query(q.id.clone()).await?;

    let episodes = state.sessions.episodes(chat_id.0);
    if episodes.is_empty() {
        bot.edit_message_text(chat_id, message_id, "Nothing to download.")
            .await?;
        return Ok(());
    }

    let _ = bot.delete_message(chat_id, message_id).await;

    for episode in &episodes {
        let stream = match state.catalog.resolve_stream(&episode.episode_ref).await {
            Ok(stream) => stream,
            Err(err) => {
                debug!(%err, episode = %episode.number, "skipping episode in bulk delivery");
                continue;
            }
        };
        let Some(hls_url) = stream.hls_url.as_deref() else {
            continue;
        };

        bot.send_message(
            chat_id,
            format!("Episode {}: `{}`", episode.number, escape_markdown(hls_url)),
        )
        .parse_mode(ParseMode::MarkdownV2)
        .await?;
    }

    Ok(())
}

/// Chat and message the pressed keyboard lives in. Absent for callbacks on
/// messages Telegram no longer exposes.
fn origin_of(q: &CallbackQuery) -> Option<(ChatId, MessageId)> {
    q.message.as_ref().map(|m| (m.chat().id, m.id()))
}

/// Parse `<prefix><index>` payload data.
fn payload_index(data: Option<&str>, prefix: &str) -> Option<usize> {
    data?.strip_prefix(prefix)?.parse().ok()
}

fn episode_keyboard(episodes: &[Episode]) -> InlineKeyboardMarkup {
    let mut rows: Vec<Vec<InlineKeyboardButton>> = episodes
        .iter()
        .enumerate()
        .map(|(i, episode)| {
            vec![InlineKeyboardButton::callback(
                format!("Episode {}", episode.number),
                format!("{EPISODE_PREFIX}{i}"),
            )]
        })
        .collect();
    rows.push(vec![InlineKeyboardButton::callback(
        "Download All",
        EPISODE_ALL,
    )]);

    InlineKeyboardMarkup::new(rows)
}

async fn deliver_subtitle(
    bot: &ThrottledBot,
    state: &AppState,
    chat_id: ChatId,
    episode: &Episode,
    subtitle_url: Option<&str>,
) {
    if let Err(err) = try_deliver_subtitle(bot, state, chat_id, episode, subtitle_url).await {
        debug!(%err, episode = %episode.number, "subtitle delivery failed");
        let _ = bot.send_message(chat_id, "⚠️ Subtitle not available.").await;
    }
}

async fn try_deliver_subtitle(
    bot: &ThrottledBot,
    state: &AppState,
    chat_id: ChatId,
    episode: &Episode,
    subtitle_url: Option<&str>,
) -> anyhow::Result<()> {
    let cache_dir = state.subs_dir.join(chat_id.0.to_string());
    tokio::fs::create_dir_all(&cache_dir).await?;

    let path = subs::fetch(&state.http, subtitle_url, &episode.number, &cache_dir).await?;

    bot.send_document(chat_id, InputFile::file(path))
        .caption("Subtitle")
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn episode(number: &str) -> Episode {
        Episode {
            number: number.to_string(),
            episode_ref: format!("/watch/x?ep={number}"),
        }
    }

    #[test]
    fn payload_index_strips_prefix() {
        assert_eq!(payload_index(Some("anime_idx:4"), ANIME_PREFIX), Some(4));
        assert_eq!(payload_index(Some("episode_idx:0"), EPISODE_PREFIX), Some(0));
    }

    #[test]
    fn payload_index_rejects_garbage() {
        assert_eq!(payload_index(None, ANIME_PREFIX), None);
        assert_eq!(payload_index(Some("anime_idx:"), ANIME_PREFIX), None);
        assert_eq!(payload_index(Some("anime_idx:x"), ANIME_PREFIX), None);
        assert_eq!(payload_index(Some("other:1"), ANIME_PREFIX), None);
    }

    #[test]
    fn episode_keyboard_has_one_row_per_episode_plus_download_all() {
        let keyboard = episode_keyboard(&[episode("1"), episode("2")]);
        let rows = &keyboard.inline_keyboard;

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0][0].text, "Episode 1");
        assert_eq!(rows[1][0].text, "Episode 2");
        assert_eq!(rows[2][0].text, "Download All");
    }
}
