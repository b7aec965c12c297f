//! Client for the aniwatch-style catalog API.
//!
//! Wraps the three GET endpoints the bot needs: `/search`,
//! `/episodes/{slug}` and `/stream`. Body parsing is split into pure
//! functions so field extraction can be tested without a live server.

pub mod model;

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::error::HikariError;
use model::{
    Episode, EpisodesEnvelope, SearchEnvelope, SearchHit, SearchResult, StreamEnvelope,
    StreamInfo, SubtitleTrack,
};

/// Streaming server tag requested from the upstream API.
const STREAM_SERVER: &str = "HD-2";
/// Subtitled streams, as opposed to dubs.
const STREAM_TYPE: &str = "sub";
/// Public watch pages live here, the API itself does not.
const WATCH_BASE: &str = "https://hianime.bz/watch";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone)]
pub struct CatalogClient {
    http: Client,
    base_url: String,
}

impl CatalogClient {
    /// Build a client against the given API base URL.
    pub fn new(base_url: &str) -> Self {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client should build");

        Self::with_http(http, base_url)
    }

    /// Build a client that reuses an existing `reqwest::Client`.
    pub fn with_http(http: Client, base_url: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// The underlying HTTP client, shared with the subtitle fetcher.
    pub fn http(&self) -> &Client {
        &self.http
    }

    /// Search the catalog by keyword. Returns hits in API order, empty when
    /// nothing matched.
    pub async fn search(&self, query: &str, page: u32) -> Result<Vec<SearchResult>, HikariError> {
        debug!(query, page, "searching catalog");

        let url = format!("{}/search", self.base_url);
        let page = page.to_string();
        let resp = self
            .http
            .get(&url)
            .query(&[("keyword", query), ("page", page.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HikariError::Upstream(format!("search returned {status}")));
        }

        let body = resp.text().await?;
        parse_search_body(&body)
    }

    /// Fetch the episode list for a slug, sorted ascending by episode number.
    ///
    /// The upstream answers 404 for single-episode titles; that case yields
    /// one synthesized episode "1" instead of an error.
    pub async fn list_episodes(&self, slug: &str) -> Result<Vec<Episode>, HikariError> {
        debug!(slug, "listing episodes");

        let url = format!("{}/episodes/{}", self.base_url, slug);
        let resp = self.http.get(&url).send().await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(vec![single_episode_fallback(slug)]);
        }

        let status = resp.status();
        if !status.is_success() {
            return Err(HikariError::Upstream(format!("episodes returned {status}")));
        }

        let body = resp.text().await?;
        parse_episodes_body(&body)
    }

    /// Resolve HLS and subtitle URLs for one episode. Missing fields in the
    /// payload come back as `None`, not as errors.
    pub async fn resolve_stream(&self, episode_ref: &str) -> Result<StreamInfo, HikariError> {
        debug!(episode_ref, "resolving stream");

        let url = format!("{}/stream", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[
                ("id", episode_ref),
                ("server", STREAM_SERVER),
                ("type", STREAM_TYPE),
            ])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(HikariError::Upstream(format!("stream returned {status}")));
        }

        let body = resp.text().await?;
        parse_stream_body(&body)
    }
}

fn parse_search_body(body: &str) -> Result<Vec<SearchResult>, HikariError> {
    let envelope: SearchEnvelope = serde_json::from_str(body)?;
    Ok(envelope.data.response.iter().map(hit_to_result).collect())
}

fn hit_to_result(hit: &SearchHit) -> SearchResult {
    let slug = hit
        .id
        .split('?')
        .next()
        .unwrap_or_default()
        .to_string();

    let title = hit
        .title
        .clone()
        .filter(|t| !t.is_empty())
        .or_else(|| hit.alternative_title.clone().filter(|t| !t.is_empty()))
        .unwrap_or_else(|| beautify_slug(&slug));

    SearchResult {
        title,
        canonical_url: format!("{WATCH_BASE}/{slug}"),
        slug,
    }
}

/// Turn "one-piece" into "One Piece" for hits that carry no usable title.
fn beautify_slug(slug: &str) -> String {
    slug.split('-')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn single_episode_fallback(slug: &str) -> Episode {
    Episode {
        number: "1".to_string(),
        episode_ref: format!("/watch/{slug}?ep=1"),
    }
}

fn parse_episodes_body(body: &str) -> Result<Vec<Episode>, HikariError> {
    let envelope: EpisodesEnvelope = serde_json::from_str(body)?;

    let mut episodes: Vec<Episode> = envelope
        .data
        .into_iter()
        .filter_map(|entry| episode_from_ref(entry.id.trim()))
        .collect();

    episodes.sort_by_key(|ep| ep.number.parse::<u64>().unwrap_or(0));
    Ok(episodes)
}

/// Extract the episode number from a raw id like `/watch/slug?ep=3`.
/// Entries without a numeric `ep` query parameter are dropped.
fn episode_from_ref(raw: &str) -> Option<Episode> {
    if raw.is_empty() {
        return None;
    }

    let (_, query) = raw.split_once('?')?;
    let number = url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "ep")
        .map(|(_, value)| value.into_owned())?;

    if number.parse::<u64>().is_err() {
        return None;
    }

    Some(Episode {
        number,
        episode_ref: raw.to_string(),
    })
}

fn parse_stream_body(body: &str) -> Result<StreamInfo, HikariError> {
    let envelope: StreamEnvelope = serde_json::from_str(body)?;
    let stream = envelope.data.streaming_link;

    let subtitle_url = stream
        .tracks
        .iter()
        .find(|track| is_english_subtitle(track))
        .and_then(|track| track.file.clone());

    Ok(StreamInfo {
        hls_url: stream.link.file,
        subtitle_url,
    })
}

/// English track heuristic: kind "captions" or a label starting with "eng",
/// case-insensitive.
fn is_english_subtitle(track: &SubtitleTrack) -> bool {
    if track.kind.as_deref() == Some("captions") {
        return true;
    }
    track
        .label
        .as_deref()
        .is_some_and(|label| label.to_lowercase().starts_with("eng"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_hits_keep_api_order_and_split_slugs() {
        let body = r#"{
            "data": {"response": [
                {"id": "one-piece-100?ref=search", "title": "One Piece"},
                {"id": "naruto-677", "title": "Naruto"}
            ]}
        }"#;

        let results = parse_search_body(body).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].slug, "one-piece-100");
        assert_eq!(results[0].title, "One Piece");
        assert_eq!(results[0].canonical_url, "https://hianime.bz/watch/one-piece-100");
        assert_eq!(results[1].slug, "naruto-677");
    }

    #[test]
    fn search_title_falls_back_to_alternative_then_slug() {
        let body = r#"{
            "data": {"response": [
                {"id": "a-1", "title": "", "alternativeTitle": "Alt Name"},
                {"id": "cowboy-bebop-4"}
            ]}
        }"#;

        let results = parse_search_body(body).unwrap();
        assert_eq!(results[0].title, "Alt Name");
        assert_eq!(results[1].title, "Cowboy Bebop 4");
    }

    #[test]
    fn search_tolerates_missing_envelope_fields() {
        assert!(parse_search_body("{}").unwrap().is_empty());
        assert!(parse_search_body(r#"{"data": {}}"#).unwrap().is_empty());
    }

    #[test]
    fn search_rejects_malformed_json() {
        assert!(matches!(
            parse_search_body("not json"),
            Err(HikariError::Upstream(_))
        ));
    }

    #[test]
    fn episodes_sort_numerically_ascending() {
        let body = r#"{"data": [
            {"id": "/watch/x?ep=10"},
            {"id": "/watch/x?ep=2"},
            {"id": "/watch/x?ep=1"}
        ]}"#;

        let episodes = parse_episodes_body(body).unwrap();
        let numbers: Vec<&str> = episodes.iter().map(|e| e.number.as_str()).collect();
        assert_eq!(numbers, ["1", "2", "10"]);
    }

    #[test]
    fn episodes_skip_entries_without_parsable_number() {
        let body = r#"{"data": [
            {"id": ""},
            {"id": "/watch/x"},
            {"id": "/watch/x?foo=bar"},
            {"id": "/watch/x?ep=abc"},
            {"id": "/watch/x?ep=3"}
        ]}"#;

        let episodes = parse_episodes_body(body).unwrap();
        assert_eq!(episodes.len(), 1);
        assert_eq!(episodes[0].number, "3");
        assert_eq!(episodes[0].episode_ref, "/watch/x?ep=3");
    }

    #[test]
    fn single_episode_fallback_synthesizes_episode_one() {
        let ep = single_episode_fallback("some-movie");
        assert_eq!(ep.number, "1");
        assert_eq!(ep.episode_ref, "/watch/some-movie?ep=1");
    }

    #[test]
    fn stream_picks_first_english_track() {
        let body = r#"{"data": {"streamingLink": {
            "link": {"file": "https://cdn/playlist.m3u8"},
            "tracks": [
                {"file": "https://cdn/fr.vtt", "kind": "subtitles", "label": "French"},
                {"file": "https://cdn/en.vtt", "kind": "captions", "label": "English"}
            ]
        }}}"#;

        let info = parse_stream_body(body).unwrap();
        assert_eq!(info.hls_url.as_deref(), Some("https://cdn/playlist.m3u8"));
        assert_eq!(info.subtitle_url.as_deref(), Some("https://cdn/en.vtt"));
    }

    #[test]
    fn stream_matches_eng_label_case_insensitively() {
        let body = r#"{"data": {"streamingLink": {
            "tracks": [{"file": "https://cdn/e.vtt", "kind": "subtitles", "label": "ENGLISH"}]
        }}}"#;

        let info = parse_stream_body(body).unwrap();
        assert_eq!(info.subtitle_url.as_deref(), Some("https://cdn/e.vtt"));
        assert!(info.hls_url.is_none());
    }

    #[test]
    fn stream_without_matching_track_has_no_subtitle() {
        let body = r#"{"data": {"streamingLink": {
            "link": {"file": "https://cdn/playlist.m3u8"},
            "tracks": [{"file": "https://cdn/fr.vtt", "kind": "subtitles", "label": "French"}]
        }}}"#;

        let info = parse_stream_body(body).unwrap();
        assert!(info.subtitle_url.is_none());
    }

    #[test]
    fn stream_tolerates_missing_paths() {
        let info = parse_stream_body("{}").unwrap();
        assert!(info.hls_url.is_none());
        assert!(info.subtitle_url.is_none());
    }
}
