//! Subtitle download cache.
//!
//! Subtitles land under `<subs_root>/<chat_id>/episode_<n>.<ext>` so every
//! episode gets a unique file and repeated fetches just overwrite in place.

use std::path::{Path, PathBuf};

use reqwest::Client;
use tracing::debug;
use url::Url;

use crate::error::HikariError;

/// Download a subtitle into `cache_dir`, naming it after the episode.
///
/// The caller creates `cache_dir` beforehand. Fails with `InvalidInput`
/// before any network traffic when no URL is available.
pub async fn fetch(
    http: &Client,
    subtitle_url: Option<&str>,
    episode_number: &str,
    cache_dir: &Path,
) -> Result<PathBuf, HikariError> {
    let subtitle_url = subtitle_url
        .filter(|u| !u.is_empty())
        .ok_or_else(|| HikariError::InvalidInput("no subtitle url for this episode".to_string()))?;

    let resp = http.get(subtitle_url).send().await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(HikariError::Upstream(format!("subtitle fetch returned {status}")));
    }
    let body = resp.bytes().await?;

    let path = write_cached(cache_dir, &subtitle_filename(subtitle_url, episode_number), &body).await?;
    debug!(path = %path.display(), "cached subtitle");
    Ok(path)
}

/// Derive the cached file name from the subtitle URL and episode number.
/// The extension comes from the URL path (query strings ignored), falling
/// back to `.vtt` when the path carries none.
pub fn subtitle_filename(subtitle_url: &str, episode_number: &str) -> String {
    let ext = Url::parse(subtitle_url)
        .ok()
        .and_then(|url| {
            Path::new(url.path())
                .extension()
                .map(|ext| ext.to_string_lossy().into_owned())
        })
        .unwrap_or_else(|| "vtt".to_string());

    format!("episode_{episode_number}.{ext}")
}

async fn write_cached(
    cache_dir: &Path,
    filename: &str,
    body: &[u8],
) -> Result<PathBuf, HikariError> {
    let path = cache_dir.join(filename);
    tokio::fs::write(&path, body).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_uses_extension_from_url_path() {
        assert_eq!(subtitle_filename("http://x/y/track.srt", "3"), "episode_3.srt");
        assert_eq!(subtitle_filename("http://x/y/track.vtt", "12"), "episode_12.vtt");
    }

    #[test]
    fn filename_defaults_to_vtt_without_extension() {
        assert_eq!(subtitle_filename("http://x/y/track", "1"), "episode_1.vtt");
    }

    #[test]
    fn filename_ignores_query_string() {
        assert_eq!(
            subtitle_filename("http://x/y/track.srt?token=abc.def", "7"),
            "episode_7.srt"
        );
    }

    #[tokio::test]
    async fn fetch_without_url_is_invalid_input() {
        let http = Client::new();
        let err = fetch(&http, None, "1", Path::new("/tmp"))
            .await
            .unwrap_err();
        assert!(matches!(err, HikariError::InvalidInput(_)));

        let err = fetch(&http, Some(""), "1", Path::new("/tmp"))
            .await
            .unwrap_err();
        assert!(matches!(err, HikariError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn write_cached_places_file_under_cache_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_cached(dir.path(), "episode_3.srt", b"WEBVTT")
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("episode_3.srt"));
        assert_eq!(std::fs::read(&path).unwrap(), b"WEBVTT");
    }
}
