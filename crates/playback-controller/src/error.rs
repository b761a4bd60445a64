use crate::TrackId;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, Serialize, thiserror::Error)]
pub enum InvalidOperation {
    #[error("Track {0} is not in the track list")]
    UnknownTrack(TrackId),
    #[error("Track list is empty")]
    EmptyTrackList,
}

/// Failure observed by the UI through `PlaybackState::last_error`.
#[derive(Clone, Debug, PartialEq, Serialize, thiserror::Error)]
pub enum PlaybackError {
    #[error("Track catalog is unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("Track {track_id} can't be played: {reason}")]
    TrackUnplayable { track_id: TrackId, reason: String },
    #[error("None of the tracks in the list can be played")]
    NoPlayableTracks,
    #[error(transparent)]
    InvalidOperation(#[from] InvalidOperation),
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("Catalog is unavailable: {0}")]
    Unavailable(String),
    #[error("Catalog response is malformed: {0}")]
    Malformed(String),
}

#[derive(Clone, Debug, PartialEq, thiserror::Error)]
pub enum AudioOutputError {
    #[error("Audio source is unavailable: {0}")]
    SourceUnavailable(String),
    #[error("Unable to decode audio source: {0}")]
    Decode(String),
}
