//! Per-chat session store.
//!
//! Inline-keyboard callbacks carry list indices, not durable ids, so the bot
//! keeps the last search results and the last episode list for each chat.
//! Sessions are replace-on-write: a new search swaps out the whole entry for
//! that chat.

use std::sync::Arc;
use std::time::Duration;

use moka::sync::Cache;
use parking_lot::Mutex;

use crate::catalog::model::Episode;
use crate::error::HikariError;

const MAX_SESSIONS: u64 = 10_000;
/// Idle eviction bounds memory for abandoned chats; a live interaction never
/// comes close to this.
const SESSION_IDLE: Duration = Duration::from_secs(30 * 60);

/// One cached search hit: display title plus the slug used for the follow-up
/// episode lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchEntry {
    pub title: String,
    pub slug: String,
}

#[derive(Debug, Default)]
struct ChatSession {
    results: Vec<SearchEntry>,
    episodes: Vec<Episode>,
    anime_title: Option<String>,
}

/// Thread-safe store of per-chat sessions.
///
/// Each chat gets its own mutex, so a callback handler and a concurrent
/// `/search` for the same chat cannot interleave reads and writes.
#[derive(Clone)]
pub struct SessionStore {
    sessions: Cache<i64, Arc<Mutex<ChatSession>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Cache::builder()
                .max_capacity(MAX_SESSIONS)
                .time_to_idle(SESSION_IDLE)
                .build(),
        }
    }

    fn session(&self, chat_id: i64) -> Arc<Mutex<ChatSession>> {
        self.sessions
            .get_with(chat_id, || Arc::new(Mutex::new(ChatSession::default())))
    }

    /// Replace the whole session for a chat with fresh search results.
    /// Any previously cached episode list is dropped with it.
    pub fn store_search(&self, chat_id: i64, results: Vec<SearchEntry>) {
        let session = self.session(chat_id);
        let mut guard = session.lock();
        *guard = ChatSession {
            results,
            ..ChatSession::default()
        };
    }

    /// Store the episode list and selected title after an anime selection.
    pub fn store_episodes(&self, chat_id: i64, title: String, episodes: Vec<Episode>) {
        let session = self.session(chat_id);
        let mut guard = session.lock();
        guard.anime_title = Some(title);
        guard.episodes = episodes;
    }

    /// Resolve a search-result index from a callback payload.
    pub fn search_entry(&self, chat_id: i64, index: usize) -> Result<SearchEntry, HikariError> {
        let session = self.session(chat_id);
        let guard = session.lock();
        guard
            .results
            .get(index)
            .cloned()
            .ok_or(HikariError::StaleSelection {
                index,
                len: guard.results.len(),
            })
    }

    /// Resolve an episode index from a callback payload.
    pub fn episode(&self, chat_id: i64, index: usize) -> Result<Episode, HikariError> {
        let session = self.session(chat_id);
        let guard = session.lock();
        guard
            .episodes
            .get(index)
            .cloned()
            .ok_or(HikariError::StaleSelection {
                index,
                len: guard.episodes.len(),
            })
    }

    /// Snapshot of the cached episode list, used by bulk delivery.
    pub fn episodes(&self, chat_id: i64) -> Vec<Episode> {
        self.session(chat_id).lock().episodes.clone()
    }

    /// Title of the most recently selected anime for this chat.
    pub fn anime_title(&self, chat_id: i64) -> Option<String> {
        self.session(chat_id).lock().anime_title.clone()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(title: &str, slug: &str) -> SearchEntry {
        SearchEntry {
            title: title.to_string(),
            slug: slug.to_string(),
        }
    }

    fn episode(number: &str) -> Episode {
        Episode {
            number: number.to_string(),
            episode_ref: format!("/watch/x?ep={number}"),
        }
    }

    #[test]
    fn indices_resolve_to_stored_positions() {
        let store = SessionStore::new();
        store.store_search(1, vec![entry("A", "a"), entry("B", "b")]);

        assert_eq!(store.search_entry(1, 0).unwrap().slug, "a");
        assert_eq!(store.search_entry(1, 1).unwrap().title, "B");
    }

    #[test]
    fn out_of_range_index_is_stale_selection() {
        let store = SessionStore::new();
        store.store_search(1, vec![entry("A", "a")]);

        assert!(matches!(
            store.search_entry(1, 5),
            Err(HikariError::StaleSelection { index: 5, len: 1 })
        ));
        assert!(matches!(
            store.episode(1, 0),
            Err(HikariError::StaleSelection { index: 0, len: 0 })
        ));
    }

    #[test]
    fn empty_chat_has_no_state() {
        let store = SessionStore::new();
        assert!(store.search_entry(42, 0).is_err());
        assert!(store.episodes(42).is_empty());
        assert!(store.anime_title(42).is_none());
    }

    #[test]
    fn new_search_replaces_whole_session() {
        let store = SessionStore::new();
        store.store_search(1, vec![entry("A", "a")]);
        store.store_episodes(1, "A".to_string(), vec![episode("1"), episode("2")]);
        assert_eq!(store.episodes(1).len(), 2);

        store.store_search(1, vec![entry("B", "b")]);

        assert_eq!(store.search_entry(1, 0).unwrap().slug, "b");
        assert!(store.episodes(1).is_empty());
        assert!(store.anime_title(1).is_none());
    }

    #[test]
    fn chats_are_isolated() {
        let store = SessionStore::new();
        store.store_search(1, vec![entry("A", "a")]);
        store.store_search(2, vec![entry("B", "b")]);

        assert_eq!(store.search_entry(1, 0).unwrap().slug, "a");
        assert_eq!(store.search_entry(2, 0).unwrap().slug, "b");
    }

    #[test]
    fn selection_keeps_search_results() {
        let store = SessionStore::new();
        store.store_search(1, vec![entry("A", "a")]);
        store.store_episodes(1, "A".to_string(), vec![episode("1")]);

        assert_eq!(store.search_entry(1, 0).unwrap().slug, "a");
        assert_eq!(store.anime_title(1).as_deref(), Some("A"));
        assert_eq!(store.episode(1, 0).unwrap().number, "1");
    }
}
