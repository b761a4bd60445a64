use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    #[serde(default)]
    pub(crate) access_token: Option<String>,
    #[serde(default)]
    pub(crate) expires_in: u64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TracksResponse {
    #[serde(default)]
    pub(crate) tracks: Vec<Option<SpotifyTrack>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub(crate) tracks: Option<SearchPage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchPage {
    #[serde(default)]
    pub(crate) items: Vec<Option<SpotifyTrack>>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotifyTrack {
    #[serde(default)]
    pub(crate) id: Option<String>,
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) artists: Vec<SpotifyArtist>,
    #[serde(default)]
    pub(crate) album: Option<SpotifyAlbum>,
    #[serde(default)]
    pub(crate) preview_url: Option<String>,
    #[serde(default)]
    pub(crate) duration_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotifyArtist {
    pub(crate) name: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotifyAlbum {
    #[serde(default)]
    pub(crate) images: Vec<SpotifyImage>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SpotifyImage {
    pub(crate) url: String,
}
