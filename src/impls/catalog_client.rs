use async_trait::async_trait;
use catalog_providers::{
    CatalogEntry, LocalCatalog, LocalCatalogError, Preview, SpotifyClient,
};
use playback_controller::{CatalogClient, CatalogError, Track, TrackSource};
use std::sync::Arc;
use tracing::error;

pub(crate) struct SpotifyCatalog {
    client: Arc<SpotifyClient>,
    track_ids: Vec<String>,
}

impl SpotifyCatalog {
    pub(crate) fn new(client: Arc<SpotifyClient>, track_ids: Vec<String>) -> Self {
        Self { client, track_ids }
    }
}

#[async_trait]
impl CatalogClient for SpotifyCatalog {
    async fn fetch_tracks(&self) -> Result<Vec<Track>, CatalogError> {
        let entries = self
            .client
            .get_tracks(&self.track_ids)
            .await
            .map_err(|error| {
                error!(?error, "Unable to fetch tracks from Spotify");
                CatalogError::Unavailable(error.to_string())
            })?;

        Ok(entries.into_iter().map(into_track).collect())
    }
}

/// Search results served as a one-off track list.
pub(crate) struct SpotifySearch {
    client: Arc<SpotifyClient>,
    query: String,
}

impl SpotifySearch {
    pub(crate) fn new(client: Arc<SpotifyClient>, query: &str) -> Self {
        Self {
            client,
            query: query.to_string(),
        }
    }
}

#[async_trait]
impl CatalogClient for SpotifySearch {
    async fn fetch_tracks(&self) -> Result<Vec<Track>, CatalogError> {
        let entries = self
            .client
            .search_tracks(&self.query)
            .await
            .map_err(|error| {
                error!(?error, query = %self.query, "Unable to search Spotify");
                CatalogError::Unavailable(error.to_string())
            })?;

        Ok(entries.into_iter().map(into_track).collect())
    }
}

pub(crate) struct FileCatalog(LocalCatalog);

impl FileCatalog {
    pub(crate) fn new(catalog: LocalCatalog) -> Self {
        Self(catalog)
    }
}

#[async_trait]
impl CatalogClient for FileCatalog {
    async fn fetch_tracks(&self) -> Result<Vec<Track>, CatalogError> {
        let entries = self.0.load().await.map_err(|error| {
            error!(?error, "Unable to load track catalog");

            match error {
                LocalCatalogError::Io(_) => CatalogError::Unavailable(error.to_string()),
                _ => CatalogError::Malformed(error.to_string()),
            }
        })?;

        Ok(entries.into_iter().map(into_track).collect())
    }
}

fn into_track(entry: CatalogEntry) -> Track {
    Track {
        id: entry.id.into(),
        name: entry.name,
        artist: entry.artist,
        artwork: entry.artwork,
        source: match entry.preview {
            Preview::Remote(url) => TrackSource::Remote(url),
            Preview::Local(path) => TrackSource::Local(path),
        },
        duration_hint: entry.duration_ms.map(|ms| ms as f64 / 1000.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catalog_providers::{Fallbacks, RetryPolicy, SpotifyCredentials, SpotifyOptions};
    use std::path::PathBuf;

    #[test]
    fn test_entry_becomes_track() {
        let track = into_track(CatalogEntry {
            id: "2FugYpDRl2aVGb5YK6L1Kr".into(),
            name: "Butter".into(),
            artist: "BTS".into(),
            artwork: None,
            preview: Preview::Local("assets/sounds/2FugYpDRl2aVGb5YK6L1Kr.mp3".into()),
            duration_ms: Some(164441),
        });

        assert_eq!("2FugYpDRl2aVGb5YK6L1Kr", &*track.id);
        assert_eq!(
            TrackSource::Local("assets/sounds/2FugYpDRl2aVGb5YK6L1Kr.mp3".into()),
            track.source
        );
        assert_eq!(Some(164.441), track.duration_hint);
    }

    #[actix_rt::test]
    async fn test_file_catalog() {
        let path = std::env::temp_dir().join(format!("music-room-{}.json", std::process::id()));
        std::fs::write(
            &path,
            r#"[
                { "id": "dynamite", "name": "Dynamite", "artist": "BTS", "source": "assets/sounds/dynamite.mp3" },
                { "id": "butter", "name": "Butter", "artist": "BTS", "source": "https://p.scdn.co/mp3-preview/butter" }
            ]"#,
        )
        .expect("Unable to write catalog fixture");

        let catalog = FileCatalog::new(LocalCatalog::create(path.clone()));
        let tracks = catalog.fetch_tracks().await;
        std::fs::remove_file(&path).ok();

        let tracks = tracks.expect("Expected catalog to load");
        assert_eq!(2, tracks.len());
        assert_eq!(
            TrackSource::Remote("https://p.scdn.co/mp3-preview/butter".into()),
            tracks[1].source
        );
    }

    #[actix_rt::test]
    async fn test_blank_search_yields_empty_list() {
        let client = SpotifyClient::create(
            SpotifyCredentials {
                client_id: "id".into(),
                client_secret: "secret".into(),
            },
            SpotifyOptions {
                market: "US".into(),
                fallbacks: Fallbacks {
                    asset_dir: "assets/sounds".into(),
                    artwork: None,
                },
                retry: RetryPolicy::default(),
            },
        );
        let search = SpotifySearch::new(Arc::new(client), "  ");

        let tracks = search.fetch_tracks().await.expect("Expected empty results");

        assert!(tracks.is_empty());
    }

    #[actix_rt::test]
    async fn test_missing_catalog_file_is_unavailable() {
        let catalog = FileCatalog::new(LocalCatalog::create(PathBuf::from(
            "/definitely/not/here/catalog.json",
        )));

        assert!(matches!(
            catalog.fetch_tracks().await,
            Err(CatalogError::Unavailable(_))
        ));
    }
}
