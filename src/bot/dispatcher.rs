//! Message dispatcher setup.
//!
//! Builds the dispatcher with the command and callback handlers.

use std::path::PathBuf;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::access::AccessList;
use crate::catalog::CatalogClient;
use crate::config::Config;
use crate::plugins;
use crate::session::SessionStore;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Upstream catalog client.
    pub catalog: CatalogClient,

    /// HTTP client for subtitle downloads (shared with the catalog client).
    pub http: reqwest::Client,

    /// Per-chat session store.
    pub sessions: SessionStore,

    /// Fixed allow-list of Telegram users.
    pub access: AccessList,

    /// Root directory for the per-chat subtitle cache.
    pub subs_dir: PathBuf,
}

impl AppState {
    /// Create a new application state.
    pub fn new(config: &Config) -> Self {
        let catalog = CatalogClient::new(&config.api_base);
        let http = catalog.http().clone();

        Self {
            catalog,
            http,
            sessions: SessionStore::new(),
            access: AccessList::new(config.allowed_user_ids.clone()),
            subs_dir: config.subs_dir.clone(),
        }
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: AppState,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    let message_handler = Update::filter_message().branch(plugins::command_handler());

    dptree::entry()
        .branch(message_handler)
        .branch(plugins::callback_handler())
}
