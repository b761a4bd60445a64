use crate::{AudioOutputError, CatalogError, MediaRequest, Track};
use async_trait::async_trait;

/// Source of the playable track list.
///
/// Called exactly once per catalog load. Retries, backoff and timeouts are
/// the implementation's business.
#[async_trait]
pub trait CatalogClient {
    async fn fetch_tracks(&self) -> Result<Vec<Track>, CatalogError>;
}

/// A single audio stream, in the manner of a media element.
///
/// Commands are fire-and-forget. Readiness, progress, completion and failures
/// are reported later through the `EventSink` the output was created with,
/// tagged with the ticket of the `MediaRequest` they belong to.
pub trait AudioOutput {
    /// Assigns a new source and starts loading it. Errors returned here are
    /// failures detected before any loading started (e.g. missing file).
    fn load(&mut self, request: MediaRequest) -> Result<(), AudioOutputError>;
    fn play(&mut self);
    fn pause(&mut self);
    /// Stops playback and releases the current source.
    fn stop(&mut self);
    fn seek(&mut self, position: f64);
    fn set_volume(&mut self, volume: f32);
    fn set_looping(&mut self, looping: bool);
}
