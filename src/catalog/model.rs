//! Data types for the upstream catalog API.

use serde::Deserialize;

/// A single search hit, normalized for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    /// Public watch page for the title.
    pub canonical_url: String,
    /// Path identifier used for follow-up episode lookups.
    pub slug: String,
}

/// One watchable episode of a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    /// Numeric text as reported by the API ("1", "2", ...).
    pub number: String,
    /// Opaque upstream identifier, e.g. `/watch/slug?ep=3`.
    pub episode_ref: String,
}

/// Playback data for a single episode. Both fields are absent-tolerant:
/// the upstream frequently omits one or the other.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamInfo {
    pub hls_url: Option<String>,
    pub subtitle_url: Option<String>,
}

// Wire types below mirror the `data` envelopes the API actually sends.
// Everything is defaulted so partial payloads decode instead of erroring.

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchEnvelope {
    #[serde(default)]
    pub data: SearchData,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchData {
    #[serde(default)]
    pub response: Vec<SearchHit>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SearchHit {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, rename = "alternativeTitle")]
    pub alternative_title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EpisodesEnvelope {
    #[serde(default)]
    pub data: Vec<EpisodeEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EpisodeEntry {
    #[serde(default)]
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StreamEnvelope {
    #[serde(default)]
    pub data: StreamData,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StreamData {
    #[serde(default, rename = "streamingLink")]
    pub streaming_link: StreamingLink,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StreamingLink {
    #[serde(default)]
    pub link: StreamLink,
    #[serde(default)]
    pub tracks: Vec<SubtitleTrack>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct StreamLink {
    #[serde(default)]
    pub file: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct SubtitleTrack {
    #[serde(default)]
    pub file: Option<String>,
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}
