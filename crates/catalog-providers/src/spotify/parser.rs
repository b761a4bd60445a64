use crate::spotify::types::{SearchResponse, SpotifyTrack, TokenResponse, TracksResponse};
use crate::{CatalogEntry, Preview};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Token response has no access token")]
    MissingAccessToken,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct AccessToken {
    pub(crate) value: String,
    pub(crate) expires_at: Instant,
}

impl AccessToken {
    pub(crate) fn is_fresh(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

pub(crate) fn parse_token(raw_json: &str, now: Instant) -> Result<AccessToken, ParseError> {
    let response: TokenResponse = serde_json::from_str(raw_json)?;

    match response.access_token {
        Some(value) if !value.is_empty() => Ok(AccessToken {
            value,
            expires_at: now + Duration::from_secs(response.expires_in),
        }),
        _ => Err(ParseError::MissingAccessToken),
    }
}

/// What to use when Spotify leaves a field empty.
#[derive(Debug, Clone)]
pub struct Fallbacks {
    pub asset_dir: PathBuf,
    pub artwork: Option<String>,
}

pub(crate) fn parse_tracks(
    raw_json: &str,
    fallbacks: &Fallbacks,
) -> Result<Vec<CatalogEntry>, ParseError> {
    let response: TracksResponse = serde_json::from_str(raw_json)?;
    let total = response.tracks.len();

    let entries: Vec<_> = response
        .tracks
        .into_iter()
        .flatten()
        .filter_map(|track| to_entry(track, fallbacks))
        .collect();

    if entries.len() < total {
        debug!(
            skipped = total - entries.len(),
            "Spotify returned unknown ids"
        );
    }

    Ok(entries)
}

/// Search hits without a preview URL are dropped. They never fall back to
/// local files.
pub(crate) fn parse_search_results(
    raw_json: &str,
    fallbacks: &Fallbacks,
) -> Result<Vec<CatalogEntry>, ParseError> {
    let response: SearchResponse = serde_json::from_str(raw_json)?;
    let items = response.tracks.map(|page| page.items).unwrap_or_default();
    let total = items.len();

    let entries: Vec<_> = items
        .into_iter()
        .flatten()
        .filter(|track| matches!(&track.preview_url, Some(url) if !url.is_empty()))
        .filter_map(|track| to_entry(track, fallbacks))
        .collect();

    if entries.len() < total {
        debug!(
            skipped = total - entries.len(),
            "Search results without preview skipped"
        );
    }

    Ok(entries)
}

fn to_entry(track: SpotifyTrack, fallbacks: &Fallbacks) -> Option<CatalogEntry> {
    let id = track.id.filter(|id| !id.is_empty())?;

    let artist = track
        .artists
        .iter()
        .map(|artist| artist.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let artwork = track
        .album
        .and_then(|album| album.images.into_iter().next())
        .map(|image| image.url)
        .or_else(|| fallbacks.artwork.clone());

    let preview = match track.preview_url {
        Some(url) if !url.is_empty() => Preview::Remote(url),
        _ => Preview::Local(fallback_file(&fallbacks.asset_dir, &id)),
    };

    Some(CatalogEntry {
        id,
        name: track.name,
        artist,
        artwork,
        preview,
        duration_ms: track.duration_ms,
    })
}

fn fallback_file(asset_dir: &Path, track_id: &str) -> PathBuf {
    asset_dir.join(format!("{}.mp3", track_id))
}
