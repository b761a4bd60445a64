use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ops::Deref;
use std::path::PathBuf;
use tracing::warn;

#[derive(Eq, PartialEq, Clone, Hash, Debug, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub(crate) String);

impl Deref for TrackId {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<String> for TrackId {
    fn from(value: String) -> Self {
        TrackId(value)
    }
}

impl From<&str> for TrackId {
    fn from(value: &str) -> Self {
        TrackId(value.to_string())
    }
}

impl std::fmt::Display for TrackId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where the audio data of a track lives.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum TrackSource {
    Remote(String),
    Local(PathBuf),
}

impl std::fmt::Display for TrackSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TrackSource::Remote(url) => write!(f, "{}", url),
            TrackSource::Local(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    pub name: String,
    pub artist: String,
    #[serde(default)]
    pub artwork: Option<String>,
    pub source: TrackSource,
    #[serde(default)]
    pub duration_hint: Option<f64>,
}

/// Ordered, read-only list of playable tracks with unique ids.
///
/// Insertion order is the normal-mode playback sequence. A list is never
/// mutated in place: a new catalog produces a new list.
#[derive(Clone, Debug, Default)]
pub struct TrackList {
    tracks: Vec<Track>,
    positions: HashMap<TrackId, usize>,
}

impl TrackList {
    /// Builds a list, dropping every track whose id was already seen.
    pub fn new(tracks: Vec<Track>) -> Self {
        let mut list = TrackList {
            tracks: Vec::with_capacity(tracks.len()),
            positions: HashMap::with_capacity(tracks.len()),
        };

        for track in tracks {
            if list.positions.contains_key(&track.id) {
                warn!(track_id = %track.id, "Dropping track with duplicate id");
                continue;
            }

            list.positions.insert(track.id.clone(), list.tracks.len());
            list.tracks.push(track);
        }

        list
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn get(&self, track_id: &TrackId) -> Option<&Track> {
        self.position(track_id).map(|index| &self.tracks[index])
    }

    pub fn contains(&self, track_id: &TrackId) -> bool {
        self.positions.contains_key(track_id)
    }

    pub fn position(&self, track_id: &TrackId) -> Option<usize> {
        self.positions.get(track_id).copied()
    }

    pub fn at(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Track> {
        self.tracks.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &TrackId> {
        self.tracks.iter().map(|track| &track.id)
    }
}
