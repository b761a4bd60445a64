use super::background::BackgroundChannel;
use crate::shuffle::shuffled_order;
use crate::{
    AudioEvent, AudioOutput, BackgroundChannelState, CatalogError, Channel, ChannelEvent,
    ChannelPhase, ControllerSettings, InvalidOperation, LoadTicket, MediaRequest, PlaybackError,
    PlaybackState, PlayerSnapshot, Track, TrackId, TrackList,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use tracing::{debug, error, info, warn};

/// Identifies one in-flight catalog load.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CatalogTicket(u64);

/// Owns the foreground and background audio outputs and every piece of
/// playback state.
///
/// All operations run to completion synchronously. Work that completes later
/// (catalog fetches, media loading) comes back through
/// [`PlaybackController::complete_catalog_load`] and
/// [`PlaybackController::dispatch`], and is applied only if it still belongs
/// to the request the controller is waiting on.
pub struct PlaybackController {
    settings: ControllerSettings,
    tracks: TrackList,
    state: PlaybackState,
    output: Box<dyn AudioOutput>,
    ticket: Option<LoadTicket>,
    generation: u64,
    play_when_ready: bool,
    failed_tracks: HashSet<TrackId>,
    background: BackgroundChannel,
    on_music_page: Option<bool>,
    user_interacted: bool,
    catalog_request: Option<CatalogTicket>,
    catalog_generation: u64,
    catalog_error: Option<String>,
    rng: StdRng,
    is_shut_down: bool,
}

impl PlaybackController {
    pub fn new(
        settings: ControllerSettings,
        foreground: Box<dyn AudioOutput>,
        background: Box<dyn AudioOutput>,
    ) -> Self {
        Self::with_rng(settings, foreground, background, StdRng::from_entropy())
    }

    pub fn with_rng(
        settings: ControllerSettings,
        mut foreground: Box<dyn AudioOutput>,
        background: Box<dyn AudioOutput>,
        rng: StdRng,
    ) -> Self {
        let state = PlaybackState::new(&settings);
        foreground.set_volume(state.volume);

        let background = BackgroundChannel::new(
            settings.ambience.clone(),
            settings.background_volume,
            background,
        );

        Self {
            settings,
            tracks: TrackList::default(),
            state,
            output: foreground,
            ticket: None,
            generation: 0,
            play_when_ready: false,
            failed_tracks: HashSet::new(),
            background,
            on_music_page: None,
            user_interacted: false,
            catalog_request: None,
            catalog_generation: 0,
            catalog_error: None,
            rng,
            is_shut_down: false,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn background_state(&self) -> &BackgroundChannelState {
        self.background.state()
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        PlayerSnapshot {
            playback: self.state.clone(),
            background: self.background.state().clone(),
        }
    }

    pub fn tracks(&self) -> &TrackList {
        &self.tracks
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.state
            .current_track
            .as_ref()
            .and_then(|track_id| self.tracks.get(track_id))
    }

    pub fn is_catalog_loading(&self) -> bool {
        self.catalog_request.is_some()
    }

    /// Marks a catalog load as in flight. Returns `None` while another one
    /// hasn't completed yet.
    pub fn begin_catalog_load(&mut self) -> Option<CatalogTicket> {
        if self.is_shut_down {
            return None;
        }

        if self.catalog_request.is_some() {
            warn!("Catalog load is already in flight");
            return None;
        }

        self.catalog_generation += 1;
        let ticket = CatalogTicket(self.catalog_generation);
        self.catalog_request = Some(ticket);

        debug!(generation = self.catalog_generation, "Catalog load started");

        Some(ticket)
    }

    pub fn complete_catalog_load(
        &mut self,
        ticket: CatalogTicket,
        result: Result<Vec<Track>, CatalogError>,
    ) {
        if self.catalog_request != Some(ticket) {
            debug!(?ticket, "Discarding stale catalog result");
            return;
        }
        self.catalog_request = None;

        match result {
            Ok(tracks) => self.replace_tracks(tracks),
            Err(error) => {
                error!(%error, "Unable to load track catalog");
                self.catalog_error = Some(error.to_string());
                self.state.last_error = Some(PlaybackError::CatalogUnavailable(error.to_string()));
            }
        }
    }

    /// Installs a statically known track list.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.replace_tracks(tracks);
    }

    pub fn play(&mut self, track_id: &TrackId) {
        if !self.accepts_transport() {
            return;
        }

        if !self.tracks.contains(track_id) {
            warn!(%track_id, "Requested track is not in the track list");
            self.state.last_error = Some(InvalidOperation::UnknownTrack(track_id.clone()).into());
            return;
        }

        if self.state.current_track.as_ref() == Some(track_id) {
            match self.state.phase {
                ChannelPhase::Loading if self.play_when_ready => {
                    debug!(%track_id, "Rejecting play request while the same track is loading");
                    return;
                }
                ChannelPhase::Loading => {
                    self.begin_user_action();
                    self.play_when_ready = true;
                    self.background.pause();
                    return;
                }
                ChannelPhase::Playing => return,
                ChannelPhase::Paused => {
                    self.begin_user_action();
                    self.resume();
                    return;
                }
                ChannelPhase::Idle => {}
            }
        }

        self.begin_user_action();
        self.start_track(track_id.clone());
    }

    pub fn pause(&mut self) {
        match self.state.phase {
            ChannelPhase::Playing => {
                self.output.pause();
                self.set_phase(ChannelPhase::Paused);
                self.arbitrate_background();
            }
            ChannelPhase::Loading => {
                self.play_when_ready = false;
                self.arbitrate_background();
            }
            ChannelPhase::Paused | ChannelPhase::Idle => {
                debug!("Nothing to pause");
            }
        }
    }

    pub fn seek(&mut self, seconds: f64) {
        if !self.state.phase.has_media() || seconds.is_nan() {
            return;
        }

        let Some(duration) = self.state.duration_seconds else {
            return;
        };

        let position = seconds.clamp(0.0, duration);
        self.output.seek(position);
        self.state.position_seconds = position;
    }

    pub fn set_volume(&mut self, level: f32) {
        if level.is_nan() {
            return;
        }

        let volume = level.clamp(0.0, 1.0);
        self.output.set_volume(volume);
        self.state.volume = volume;
    }

    pub fn next(&mut self) {
        if !self.accepts_transport() || self.state.current_track.is_none() {
            return;
        }

        self.begin_user_action();
        self.advance(1);
    }

    pub fn previous(&mut self) {
        if !self.accepts_transport() {
            return;
        }

        let Some(current) = self.state.current_track.clone() else {
            return;
        };

        self.begin_user_action();

        if self.state.position_seconds > self.settings.restart_threshold_seconds {
            info!(track_id = %current, "Restarting current track");

            if self.state.phase.has_media() {
                self.output.seek(0.0);
                self.state.position_seconds = 0.0;
            } else {
                self.start_track(current);
            }
            return;
        }

        self.advance(-1);
    }

    pub fn toggle_shuffle(&mut self) {
        self.state.shuffle_enabled = !self.state.shuffle_enabled;

        if self.state.shuffle_enabled {
            self.rebuild_shuffle_order();
        } else {
            self.state.shuffle_order.clear();
        }

        info!(enabled = self.state.shuffle_enabled, "Shuffle toggled");
    }

    pub fn toggle_auto_advance(&mut self) {
        self.state.auto_advance_enabled = !self.state.auto_advance_enabled;

        info!(
            enabled = self.state.auto_advance_enabled,
            "Auto-advance toggled"
        );
    }

    /// Router notification about the page being shown.
    pub fn on_navigate(&mut self, is_music_page: bool) {
        if self.is_shut_down {
            return;
        }

        debug!(is_music_page, "Navigation");
        self.on_music_page = Some(is_music_page);

        if is_music_page {
            self.background.pause();
        } else {
            self.arbitrate_background();
        }
    }

    /// First click/key/touch on the page. Unblocks ambience playback when it
    /// is configured to wait for one.
    pub fn mark_user_interaction(&mut self) {
        if self.user_interacted {
            return;
        }

        info!("User interacted with the page");
        self.user_interacted = true;
        self.arbitrate_background();
    }

    /// Applies an event reported by one of the outputs.
    pub fn dispatch(&mut self, event: ChannelEvent) {
        if self.is_shut_down {
            debug!(ticket = %event.ticket, "Ignoring event after shutdown");
            return;
        }

        match event.channel {
            Channel::Foreground => self.handle_foreground_event(event.ticket, event.event),
            Channel::Background => self.background.handle_event(&event.ticket, event.event),
        }
    }

    pub fn shutdown(&mut self) {
        if self.is_shut_down {
            return;
        }

        info!("Shutting down playback controller");

        self.output.stop();
        self.background.shutdown();
        self.ticket = None;
        self.play_when_ready = false;
        self.catalog_request = None;
        self.set_phase(ChannelPhase::Idle);
        self.is_shut_down = true;
    }

    fn handle_foreground_event(&mut self, ticket: LoadTicket, event: AudioEvent) {
        if self.ticket.as_ref() != Some(&ticket) {
            debug!(%ticket, "Discarding stale foreground event");
            return;
        }

        match event {
            AudioEvent::Ready { duration } => self.on_ready(duration),
            AudioEvent::TimeUpdate { position } => {
                if !self.state.phase.has_media() || !position.is_finite() {
                    return;
                }
                let upper = self.state.duration_seconds.unwrap_or(f64::INFINITY);
                self.state.position_seconds = position.clamp(0.0, upper);
            }
            AudioEvent::Ended => self.on_ended(),
            AudioEvent::Error { reason } => self.handle_track_failure(reason),
        }
    }

    fn on_ready(&mut self, duration: f64) {
        if !self.state.is_loading() {
            debug!("Ignoring repeated ready event");
            return;
        }

        self.state.duration_seconds = (duration.is_finite() && duration > 0.0).then_some(duration);
        self.failed_tracks.clear();

        if self.play_when_ready {
            self.output.play();
            self.set_phase(ChannelPhase::Playing);
            self.background.pause();
        } else {
            self.set_phase(ChannelPhase::Paused);
        }
    }

    fn on_ended(&mut self) {
        if !self.state.phase.has_media() {
            return;
        }

        if let Some(duration) = self.state.duration_seconds {
            self.state.position_seconds = duration;
        }

        if self.state.auto_advance_enabled {
            debug!("Track ended, advancing");
            self.advance(1);
            return;
        }

        self.ticket = None;
        self.play_when_ready = false;
        self.set_phase(ChannelPhase::Idle);
        self.arbitrate_background();
    }

    fn handle_track_failure(&mut self, reason: String) {
        let Some(track_id) = self.state.current_track.clone() else {
            return;
        };

        warn!(%track_id, %reason, "Track failed to play");

        self.output.stop();
        self.ticket = None;
        self.play_when_ready = false;
        self.set_phase(ChannelPhase::Idle);
        self.state.last_error = Some(PlaybackError::TrackUnplayable {
            track_id: track_id.clone(),
            reason,
        });
        self.failed_tracks.insert(track_id);

        if !self.state.auto_advance_enabled {
            self.arbitrate_background();
            return;
        }

        if self.failed_tracks.len() >= self.tracks.len() {
            error!(
                failed = self.failed_tracks.len(),
                "Every track in the list failed to play"
            );
            self.state.last_error = Some(PlaybackError::NoPlayableTracks);
            self.arbitrate_background();
            return;
        }

        self.advance(1);
    }

    fn start_track(&mut self, track_id: TrackId) {
        let Some(track) = self.tracks.get(&track_id).cloned() else {
            return;
        };

        if self.state.phase != ChannelPhase::Idle {
            self.output.stop();
        }

        self.generation += 1;
        let ticket = LoadTicket::new(self.generation, track_id.clone());

        info!(%ticket, source = %track.source, "Loading track");

        self.ticket = Some(ticket.clone());
        self.play_when_ready = true;
        self.state.current_track = Some(track_id);
        self.state.position_seconds = 0.0;
        self.state.duration_seconds = None;
        self.set_phase(ChannelPhase::Loading);
        self.background.pause();

        let request = MediaRequest {
            ticket,
            source: track.source,
            duration_hint: track.duration_hint,
        };

        if let Err(error) = self.output.load(request) {
            self.handle_track_failure(error.to_string());
        }
    }

    fn resume(&mut self) {
        self.output.play();
        self.set_phase(ChannelPhase::Playing);
        self.background.pause();
    }

    fn advance(&mut self, offset: isize) {
        let Some(current) = self.state.current_track.clone() else {
            debug!("No current track to move from");
            return;
        };

        match self.neighbour(&current, offset) {
            Some(track_id) => self.start_track(track_id),
            None => warn!(track_id = %current, "Current track is missing from playback order"),
        }
    }

    /// Track `offset` steps away from `current` in the active order, wrapping
    /// around at both ends.
    fn neighbour(&self, current: &TrackId, offset: isize) -> Option<TrackId> {
        let order: Vec<&TrackId> = if self.state.shuffle_enabled {
            self.state.shuffle_order.iter().collect()
        } else {
            self.tracks.ids().collect()
        };

        let position = order.iter().position(|track_id| *track_id == current)?;
        let index = (position as isize + offset).rem_euclid(order.len() as isize) as usize;

        Some(order[index].clone())
    }

    fn replace_tracks(&mut self, tracks: Vec<Track>) {
        let tracks = TrackList::new(tracks);

        info!(count = tracks.len(), "Track list loaded");

        let current_missing = self
            .state
            .current_track
            .as_ref()
            .map_or(false, |track_id| !tracks.contains(track_id));

        self.tracks = tracks;
        self.failed_tracks.clear();
        self.catalog_error = None;

        if matches!(
            self.state.last_error,
            Some(PlaybackError::CatalogUnavailable(_))
        ) {
            self.state.last_error = None;
        }

        if current_missing {
            warn!("Current track is not in the new track list, stopping playback");

            self.output.stop();
            self.ticket = None;
            self.play_when_ready = false;
            self.state.current_track = None;
            self.state.position_seconds = 0.0;
            self.state.duration_seconds = None;
            self.set_phase(ChannelPhase::Idle);
            self.arbitrate_background();
        }

        if self.state.shuffle_enabled {
            self.rebuild_shuffle_order();
        }
    }

    fn rebuild_shuffle_order(&mut self) {
        self.state.shuffle_order = shuffled_order(
            self.tracks.ids(),
            self.state.current_track.as_ref(),
            &mut self.rng,
        );
    }

    /// Checks that there is something to play, recording why not otherwise.
    fn accepts_transport(&mut self) -> bool {
        if self.is_shut_down {
            debug!("Controller is shut down");
            return false;
        }

        if !self.tracks.is_empty() {
            return true;
        }

        self.state.last_error = Some(match &self.catalog_error {
            Some(reason) => PlaybackError::CatalogUnavailable(reason.clone()),
            None => InvalidOperation::EmptyTrackList.into(),
        });

        false
    }

    fn begin_user_action(&mut self) {
        self.state.last_error = None;
        self.failed_tracks.clear();
    }

    fn foreground_is_audible(&self) -> bool {
        match self.state.phase {
            ChannelPhase::Playing => true,
            ChannelPhase::Loading => self.play_when_ready,
            ChannelPhase::Paused | ChannelPhase::Idle => false,
        }
    }

    /// Resumes ambience when the current page and the foreground allow it.
    fn arbitrate_background(&mut self) {
        if self.on_music_page != Some(false) {
            return;
        }

        if self.foreground_is_audible() {
            debug!("Foreground is audible, keeping background paused");
            return;
        }

        if self.settings.background_waits_for_interaction && !self.user_interacted {
            debug!("Background is waiting for the first user interaction");
            return;
        }

        self.background.resume();
    }

    fn set_phase(&mut self, phase: ChannelPhase) {
        if self.state.phase != phase {
            debug!(from = ?self.state.phase, to = ?phase, "Foreground transition");
        }
        self.state.phase = phase;
        self.state.is_playing = matches!(phase, ChannelPhase::Playing);
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
