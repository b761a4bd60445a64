use crate::{
    AudioEvent, AudioOutput, AudioOutputError, Channel, ChannelEvent, ControllerSettings,
    LoadTicket, MediaRequest, PlaybackController, Track, TrackId, TrackSource,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum OutputCall {
    Load(LoadTicket),
    Play,
    Pause,
    Stop,
    Seek(f64),
    Volume(f32),
    Looping(bool),
}

#[derive(Default)]
pub(crate) struct OutputLog {
    pub(crate) calls: Vec<OutputCall>,
    pub(crate) unavailable: HashSet<TrackId>,
}

impl OutputLog {
    pub(crate) fn loads(&self) -> Vec<LoadTicket> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                OutputCall::Load(ticket) => Some(ticket.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_load(&self) -> Option<LoadTicket> {
        self.loads().pop()
    }

    pub(crate) fn count(&self, expected: &OutputCall) -> usize {
        self.calls.iter().filter(|call| *call == expected).count()
    }

    pub(crate) fn last_call(&self) -> Option<OutputCall> {
        self.calls.last().cloned()
    }
}

pub(crate) struct RecordingOutput(pub(crate) Rc<RefCell<OutputLog>>);

impl AudioOutput for RecordingOutput {
    fn load(&mut self, request: MediaRequest) -> Result<(), AudioOutputError> {
        let mut log = self.0.borrow_mut();
        log.calls.push(OutputCall::Load(request.ticket.clone()));

        if log.unavailable.contains(request.ticket.track_id()) {
            return Err(AudioOutputError::SourceUnavailable(
                request.source.to_string(),
            ));
        }

        Ok(())
    }

    fn play(&mut self) {
        self.0.borrow_mut().calls.push(OutputCall::Play);
    }

    fn pause(&mut self) {
        self.0.borrow_mut().calls.push(OutputCall::Pause);
    }

    fn stop(&mut self) {
        self.0.borrow_mut().calls.push(OutputCall::Stop);
    }

    fn seek(&mut self, position: f64) {
        self.0.borrow_mut().calls.push(OutputCall::Seek(position));
    }

    fn set_volume(&mut self, volume: f32) {
        self.0.borrow_mut().calls.push(OutputCall::Volume(volume));
    }

    fn set_looping(&mut self, looping: bool) {
        self.0.borrow_mut().calls.push(OutputCall::Looping(looping));
    }
}

pub(crate) fn track(id: &str) -> Track {
    Track {
        id: id.into(),
        name: format!("Song {}", id),
        artist: String::from("BTS"),
        artwork: None,
        source: TrackSource::Remote(format!("https://p.scdn.co/mp3-preview/{}", id)),
        duration_hint: Some(30.0),
    }
}

pub(crate) struct Harness {
    pub(crate) controller: PlaybackController,
    pub(crate) foreground: Rc<RefCell<OutputLog>>,
    pub(crate) background: Rc<RefCell<OutputLog>>,
}

impl Harness {
    pub(crate) fn new() -> Self {
        Self::with_settings(ControllerSettings::default())
    }

    pub(crate) fn with_settings(settings: ControllerSettings) -> Self {
        let foreground = Rc::new(RefCell::new(OutputLog::default()));
        let background = Rc::new(RefCell::new(OutputLog::default()));

        let controller = PlaybackController::with_rng(
            settings,
            Box::new(RecordingOutput(Rc::clone(&foreground))),
            Box::new(RecordingOutput(Rc::clone(&background))),
            StdRng::seed_from_u64(1234),
        );

        Self {
            controller,
            foreground,
            background,
        }
    }

    pub(crate) fn with_tracks(ids: &[&str]) -> Self {
        let mut harness = Self::new();
        harness
            .controller
            .set_tracks(ids.iter().map(|id| track(id)).collect());
        harness
    }

    pub(crate) fn current(&self) -> Option<String> {
        self.controller
            .state()
            .current_track
            .as_ref()
            .map(|track_id| track_id.to_string())
    }

    pub(crate) fn foreground_ticket(&self) -> LoadTicket {
        self.foreground
            .borrow()
            .last_load()
            .expect("Expected a foreground load")
    }

    pub(crate) fn background_ticket(&self) -> LoadTicket {
        self.background
            .borrow()
            .last_load()
            .expect("Expected a background load")
    }

    pub(crate) fn emit_foreground(&mut self, ticket: &LoadTicket, event: AudioEvent) {
        self.controller.dispatch(ChannelEvent {
            channel: Channel::Foreground,
            ticket: ticket.clone(),
            event,
        });
    }

    pub(crate) fn emit_background(&mut self, event: AudioEvent) {
        let ticket = self.background_ticket();
        self.controller.dispatch(ChannelEvent {
            channel: Channel::Background,
            ticket,
            event,
        });
    }

    /// Sends `event` for the most recent foreground load.
    pub(crate) fn emit(&mut self, event: AudioEvent) {
        let ticket = self.foreground_ticket();
        self.emit_foreground(&ticket, event);
    }

    pub(crate) fn ready(&mut self, duration: f64) {
        self.emit(AudioEvent::Ready { duration });
    }

    pub(crate) fn play_ready(&mut self, id: &str, duration: f64) {
        self.controller.play(&id.into());
        self.ready(duration);
    }

    pub(crate) fn position(&mut self, position: f64) {
        self.emit(AudioEvent::TimeUpdate { position });
    }
}
