use crate::{CatalogEntry, Preview};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum LocalCatalogError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Track id {0} appears more than once")]
    DuplicateTrackId(String),
    #[error("Track {id} points to {location}, which is not an audio file")]
    UnsupportedMedia { id: String, location: String },
}

#[derive(Debug, Deserialize)]
struct TrackDescriptor {
    id: String,
    name: String,
    artist: String,
    #[serde(default)]
    artwork: Option<String>,
    source: String,
    #[serde(default)]
    duration_ms: Option<u64>,
}

/// Track list stored as a JSON file next to the bundled assets.
pub struct LocalCatalog {
    path: PathBuf,
}

impl LocalCatalog {
    pub fn create(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub async fn load(&self) -> Result<Vec<CatalogEntry>, LocalCatalogError> {
        let raw = tokio::fs::read_to_string(&self.path).await?;
        let entries = parse_local_catalog(&raw)?;

        info!(path = %self.path.display(), count = entries.len(), "Local catalog loaded");

        Ok(entries)
    }
}

pub(crate) fn parse_local_catalog(raw_json: &str) -> Result<Vec<CatalogEntry>, LocalCatalogError> {
    let descriptors: Vec<TrackDescriptor> = serde_json::from_str(raw_json)?;
    let mut seen = HashSet::new();

    descriptors
        .into_iter()
        .map(|descriptor| {
            if !seen.insert(descriptor.id.clone()) {
                return Err(LocalCatalogError::DuplicateTrackId(descriptor.id));
            }

            let preview = Preview::from_locator(&descriptor.source);

            if let Preview::Local(path) = &preview {
                let is_audio = mime_guess::from_path(path)
                    .first()
                    .map_or(false, |mime| mime.type_() == mime_guess::mime::AUDIO);

                if !is_audio {
                    return Err(LocalCatalogError::UnsupportedMedia {
                        id: descriptor.id,
                        location: descriptor.source,
                    });
                }
            }

            Ok(CatalogEntry {
                id: descriptor.id,
                name: descriptor.name,
                artist: descriptor.artist,
                artwork: descriptor.artwork,
                preview,
                duration_ms: descriptor.duration_ms,
            })
        })
        .collect()
}
