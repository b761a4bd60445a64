use crate::{
    AudioEvent, AudioOutput, BackgroundChannelState, ChannelPhase, LoadTicket, MediaRequest,
    Track,
};
use tracing::{debug, info, warn};

/// Looping ambience stream driven by page navigation only.
pub(crate) struct BackgroundChannel {
    output: Box<dyn AudioOutput>,
    track: Track,
    ticket: Option<LoadTicket>,
    generation: u64,
    /// Whether the channel should be audible once its source is ready.
    wants_playback: bool,
    state: BackgroundChannelState,
}

impl BackgroundChannel {
    pub(crate) fn new(track: Track, volume: f32, mut output: Box<dyn AudioOutput>) -> Self {
        let volume = volume.clamp(0.0, 1.0);

        output.set_looping(true);
        output.set_volume(volume);

        Self {
            output,
            ticket: None,
            generation: 0,
            wants_playback: false,
            state: BackgroundChannelState {
                track_id: track.id.clone(),
                phase: ChannelPhase::Idle,
                is_playing: false,
                position_seconds: 0.0,
                volume,
                last_error: None,
            },
            track,
        }
    }

    pub(crate) fn state(&self) -> &BackgroundChannelState {
        &self.state
    }

    pub(crate) fn resume(&mut self) {
        match self.state.phase {
            ChannelPhase::Playing => {
                debug!("Background channel is already playing");
            }
            ChannelPhase::Loading => {
                self.wants_playback = true;
            }
            ChannelPhase::Paused => {
                self.output.play();
                self.wants_playback = true;
                self.set_phase(ChannelPhase::Playing);
            }
            ChannelPhase::Idle => self.load(),
        }
    }

    pub(crate) fn pause(&mut self) {
        self.wants_playback = false;

        if matches!(self.state.phase, ChannelPhase::Playing) {
            self.output.pause();
            self.set_phase(ChannelPhase::Paused);
        }
    }

    pub(crate) fn handle_event(&mut self, ticket: &LoadTicket, event: AudioEvent) {
        if self.ticket.as_ref() != Some(ticket) {
            debug!(%ticket, "Discarding stale background event");
            return;
        }

        match event {
            AudioEvent::Ready { .. } => {
                if !matches!(self.state.phase, ChannelPhase::Loading) {
                    return;
                }

                if self.wants_playback {
                    self.output.play();
                    self.set_phase(ChannelPhase::Playing);
                } else {
                    self.set_phase(ChannelPhase::Paused);
                }
            }
            AudioEvent::TimeUpdate { position } => {
                if position.is_finite() {
                    self.state.position_seconds = position.max(0.0);
                }
            }
            AudioEvent::Ended => {
                // Outputs are asked to loop; this covers the ones that can't.
                if matches!(self.state.phase, ChannelPhase::Playing) {
                    self.output.seek(0.0);
                    self.output.play();
                }
                self.state.position_seconds = 0.0;
            }
            AudioEvent::Error { reason } => {
                warn!(%reason, track_id = %self.track.id, "Background track failed");
                self.fail(reason);
            }
        }
    }

    pub(crate) fn shutdown(&mut self) {
        self.output.stop();
        self.ticket = None;
        self.wants_playback = false;
        self.state.position_seconds = 0.0;
        self.set_phase(ChannelPhase::Idle);
    }

    fn load(&mut self) {
        self.generation += 1;
        let ticket = LoadTicket::new(self.generation, self.track.id.clone());

        info!(%ticket, source = %self.track.source, "Loading background track");

        self.ticket = Some(ticket.clone());
        self.wants_playback = true;
        self.state.last_error = None;
        self.set_phase(ChannelPhase::Loading);

        let request = MediaRequest {
            ticket,
            source: self.track.source.clone(),
            duration_hint: self.track.duration_hint,
        };

        if let Err(error) = self.output.load(request) {
            warn!(%error, "Unable to load background track");
            self.fail(error.to_string());
        }
    }

    fn fail(&mut self, reason: String) {
        self.output.stop();
        self.ticket = None;
        self.wants_playback = false;
        self.state.last_error = Some(reason);
        self.set_phase(ChannelPhase::Idle);
    }

    fn set_phase(&mut self, phase: ChannelPhase) {
        if self.state.phase != phase {
            debug!(from = ?self.state.phase, to = ?phase, "Background channel transition");
        }
        self.state.phase = phase;
        self.state.is_playing = matches!(phase, ChannelPhase::Playing);
    }
}
