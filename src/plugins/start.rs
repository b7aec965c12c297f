//! /start command plugin.

use teloxide::prelude::*;
use tracing::warn;

use super::deny;
use crate::bot::dispatcher::{AppState, ThrottledBot};

/// Handle the /start command.
pub async fn start_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    if state.access.check(user.id).is_err() {
        warn!(user_id = user.id.0, "rejected /start from unlisted user");
        return deny(&bot, msg.chat.id).await;
    }

    bot.send_message(msg.chat.id, "Welcome! Use /search <anime> to begin.")
        .await?;

    Ok(())
}
