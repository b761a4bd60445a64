use catalog_providers::SpotifyCredentials;
use playback_controller::{ControllerSettings, Track, TrackSource};
use serde::Deserialize;
use std::path::PathBuf;

const BTS_PLAYLIST: [&str; 7] = [
    "0WNGsQ1oAuHzNTk8jivBKW",
    "5nTnCfI5oIWR9InXG3caP5",
    "2FugYpDRl2aVGb5YK6L1Kr",
    "5Y7RdUWJCF3sLglHfuVjOZ",
    "3OBVr1aNHr5IiNZAWOgfQc",
    "7AR0Kc4GrpKDPuVTsOC4Wv",
    "6oHyMGMzxpx8mX4QEgUBDV",
];

fn default_spotify_track_ids() -> Vec<String> {
    BTS_PLAYLIST.iter().map(|id| id.to_string()).collect()
}

fn default_spotify_market() -> String {
    "US".to_string()
}

fn default_fallback_asset_dir() -> PathBuf {
    PathBuf::from("assets/sounds")
}

fn default_artwork() -> String {
    "/assets/images/bts/group/bts-main.jpeg".to_string()
}

fn default_ambience_track() -> PathBuf {
    PathBuf::from("assets/sounds/background.mp3")
}

fn default_volume() -> f32 {
    0.7
}

fn default_background_volume() -> f32 {
    0.4
}

fn default_restart_threshold_secs() -> f64 {
    3.0
}

fn default_auto_advance() -> bool {
    true
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum CatalogSource {
    Spotify(SpotifyCredentials),
    File(PathBuf),
}

#[derive(Clone, Debug, Deserialize)]
pub(crate) struct Config {
    #[serde(default)]
    pub(crate) catalog_path: Option<PathBuf>,
    #[serde(default)]
    pub(crate) spotify_client_id: Option<String>,
    #[serde(default)]
    pub(crate) spotify_client_secret: Option<String>,
    #[serde(default = "default_spotify_track_ids")]
    pub(crate) spotify_track_ids: Vec<String>,
    #[serde(default = "default_spotify_market")]
    pub(crate) spotify_market: String,
    #[serde(default = "default_fallback_asset_dir")]
    pub(crate) fallback_asset_dir: PathBuf,
    #[serde(default = "default_artwork")]
    pub(crate) default_artwork: String,
    #[serde(default = "default_ambience_track")]
    pub(crate) ambience_track: PathBuf,
    #[serde(default = "default_volume")]
    pub(crate) default_volume: f32,
    #[serde(default = "default_background_volume")]
    pub(crate) background_volume: f32,
    #[serde(default = "default_restart_threshold_secs")]
    pub(crate) restart_threshold_secs: f64,
    #[serde(default = "default_auto_advance")]
    pub(crate) auto_advance: bool,
    #[serde(default)]
    pub(crate) background_waits_for_interaction: bool,
}

impl Config {
    pub(crate) fn from_env() -> Self {
        match envy::from_env::<Self>() {
            Ok(config) => config,
            Err(error) => panic!("Invalid environment variable: {:#?}", error),
        }
    }

    /// Spotify wins when both credentials are present.
    pub(crate) fn catalog_source(&self) -> Option<CatalogSource> {
        match (&self.spotify_client_id, &self.spotify_client_secret) {
            (Some(client_id), Some(client_secret)) => {
                Some(CatalogSource::Spotify(SpotifyCredentials {
                    client_id: client_id.clone(),
                    client_secret: client_secret.clone(),
                }))
            }
            _ => self.catalog_path.clone().map(CatalogSource::File),
        }
    }

    pub(crate) fn controller_settings(&self) -> ControllerSettings {
        ControllerSettings {
            default_volume: self.default_volume,
            auto_advance: self.auto_advance,
            restart_threshold_seconds: self.restart_threshold_secs,
            ambience: Track {
                id: "ambience".into(),
                name: "Background".into(),
                artist: String::new(),
                artwork: None,
                source: TrackSource::Local(self.ambience_track.clone()),
                duration_hint: None,
            },
            background_volume: self.background_volume,
            background_waits_for_interaction: self.background_waits_for_interaction,
        }
    }
}
