use crate::{PlaybackError, Track, TrackId, TrackSource};
use serde::Serialize;

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub enum ChannelPhase {
    /// No source loaded.
    #[default]
    Idle,
    /// Source assigned, waiting for the output to report it is ready.
    Loading,
    Playing,
    Paused,
}

impl ChannelPhase {
    pub fn has_media(&self) -> bool {
        matches!(self, ChannelPhase::Playing | ChannelPhase::Paused)
    }
}

/// Read-only view of the foreground session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaybackState {
    pub current_track: Option<TrackId>,
    pub phase: ChannelPhase,
    pub is_playing: bool,
    pub position_seconds: f64,
    pub duration_seconds: Option<f64>,
    pub volume: f32,
    pub shuffle_enabled: bool,
    pub auto_advance_enabled: bool,
    pub shuffle_order: Vec<TrackId>,
    pub last_error: Option<PlaybackError>,
}

impl PlaybackState {
    pub(crate) fn new(settings: &ControllerSettings) -> Self {
        Self {
            current_track: None,
            phase: ChannelPhase::Idle,
            is_playing: false,
            position_seconds: 0.0,
            duration_seconds: None,
            volume: settings.default_volume.clamp(0.0, 1.0),
            shuffle_enabled: false,
            auto_advance_enabled: settings.auto_advance,
            shuffle_order: vec![],
            last_error: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, ChannelPhase::Loading)
    }
}

/// Read-only view of the ambience channel.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BackgroundChannelState {
    pub track_id: TrackId,
    pub phase: ChannelPhase,
    pub is_playing: bool,
    pub position_seconds: f64,
    pub volume: f32,
    pub last_error: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub playback: PlaybackState,
    pub background: BackgroundChannelState,
}

#[derive(Clone, Debug)]
pub struct ControllerSettings {
    pub default_volume: f32,
    pub auto_advance: bool,
    /// `previous()` restarts the current track once more than this has played.
    pub restart_threshold_seconds: f64,
    pub ambience: Track,
    pub background_volume: f32,
    pub background_waits_for_interaction: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            default_volume: 0.7,
            auto_advance: true,
            restart_threshold_seconds: 3.0,
            ambience: Track {
                id: "ambience".into(),
                name: "Background".into(),
                artist: String::new(),
                artwork: None,
                source: TrackSource::Local("assets/sounds/background.mp3".into()),
                duration_hint: None,
            },
            background_volume: 0.4,
            background_waits_for_interaction: false,
        }
    }
}
