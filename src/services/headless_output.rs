use actix_rt::task::JoinHandle;
use actix_rt::time::{interval, sleep};
use playback_controller::{
    AudioEvent, AudioOutput, AudioOutputError, EventSink, LoadTicket, MediaRequest, TrackSource,
};
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, trace};

const DEFAULT_DURATION_SECS: f64 = 30.0;
const LOAD_LATENCY: Duration = Duration::from_millis(150);
const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
pub(crate) struct Transport {
    duration: f64,
    position: f64,
    playing: bool,
    looping: bool,
}

impl Transport {
    /// Moves the playhead forward and reports what a media element would.
    pub(crate) fn advance(&mut self, elapsed: f64) -> Option<AudioEvent> {
        if !self.playing {
            return None;
        }

        self.position += elapsed;

        if self.position < self.duration {
            return Some(AudioEvent::TimeUpdate {
                position: self.position,
            });
        }

        if self.looping {
            self.position = 0.0;
            Some(AudioEvent::TimeUpdate { position: 0.0 })
        } else {
            self.position = self.duration;
            self.playing = false;
            Some(AudioEvent::Ended)
        }
    }
}

/// Audio output that plays nothing and keeps time.
///
/// Local sources must exist on disk; remote sources are always accepted.
pub(crate) struct HeadlessOutput {
    sink: EventSink,
    transport: Rc<RefCell<Transport>>,
    task: Option<JoinHandle<()>>,
}

impl HeadlessOutput {
    pub(crate) fn create(sink: EventSink) -> Self {
        Self {
            sink,
            transport: Rc::new(RefCell::new(Transport::default())),
            task: None,
        }
    }

    fn cancel_task(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for HeadlessOutput {
    fn drop(&mut self) {
        self.cancel_task();
    }
}

impl AudioOutput for HeadlessOutput {
    fn load(&mut self, request: MediaRequest) -> Result<(), AudioOutputError> {
        self.cancel_task();

        if let TrackSource::Local(path) = &request.source {
            if !path.is_file() {
                return Err(AudioOutputError::SourceUnavailable(
                    path.display().to_string(),
                ));
            }
        }

        let duration = request
            .duration_hint
            .filter(|duration| duration.is_finite() && *duration > 0.0)
            .unwrap_or(DEFAULT_DURATION_SECS);

        {
            let mut transport = self.transport.borrow_mut();
            transport.duration = duration;
            transport.position = 0.0;
            transport.playing = false;
        }

        debug!(channel = ?self.sink.channel(), ticket = %request.ticket, source = %request.source, "Loading");

        self.task = Some(actix_rt::spawn(drive(
            Rc::clone(&self.transport),
            self.sink.clone(),
            request.ticket,
            duration,
        )));

        Ok(())
    }

    fn play(&mut self) {
        self.transport.borrow_mut().playing = true;
    }

    fn pause(&mut self) {
        self.transport.borrow_mut().playing = false;
    }

    fn stop(&mut self) {
        self.cancel_task();

        let mut transport = self.transport.borrow_mut();
        transport.playing = false;
        transport.position = 0.0;
    }

    fn seek(&mut self, position: f64) {
        let mut transport = self.transport.borrow_mut();
        transport.position = position.clamp(0.0, transport.duration);
    }

    fn set_volume(&mut self, volume: f32) {
        trace!(channel = ?self.sink.channel(), volume, "Volume changed");
    }

    fn set_looping(&mut self, looping: bool) {
        self.transport.borrow_mut().looping = looping;
    }
}

async fn drive(
    transport: Rc<RefCell<Transport>>,
    sink: EventSink,
    ticket: LoadTicket,
    duration: f64,
) {
    sleep(LOAD_LATENCY).await;

    if !sink.emit(&ticket, AudioEvent::Ready { duration }) {
        return;
    }

    let mut ticker = interval(TICK);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        let event = transport.borrow_mut().advance(TICK.as_secs_f64());

        if let Some(event) = event {
            if !sink.emit(&ticket, event) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use playback_controller::{event_channel, Channel, ChannelEvent};

    fn playing(duration: f64, looping: bool) -> Transport {
        Transport {
            duration,
            position: 0.0,
            playing: true,
            looping,
        }
    }

    #[test]
    fn test_paused_transport_does_not_move() {
        let mut transport = Transport {
            playing: false,
            ..playing(30.0, false)
        };

        assert_eq!(None, transport.advance(1.0));
        assert_eq!(0.0, transport.position);
    }

    #[test]
    fn test_transport_ends_at_duration() {
        let mut transport = playing(2.0, false);

        assert_eq!(
            Some(AudioEvent::TimeUpdate { position: 1.0 }),
            transport.advance(1.0)
        );
        assert_eq!(Some(AudioEvent::Ended), transport.advance(1.0));
        assert_eq!(None, transport.advance(1.0));
        assert_eq!(2.0, transport.position);
    }

    #[test]
    fn test_looping_transport_wraps() {
        let mut transport = playing(1.5, true);

        transport.advance(1.0);

        assert_eq!(
            Some(AudioEvent::TimeUpdate { position: 0.0 }),
            transport.advance(1.0)
        );
        assert!(transport.playing);
    }

    #[test]
    fn test_missing_local_file_is_rejected() {
        let (sinks, _events) = event_channel();
        let mut output = HeadlessOutput::create(sinks.foreground);

        let result = output.load(MediaRequest {
            ticket: LoadTicket::new(1, "missing".into()),
            source: TrackSource::Local("/definitely/not/here.mp3".into()),
            duration_hint: None,
        });

        assert!(matches!(
            result,
            Err(AudioOutputError::SourceUnavailable(_))
        ));
    }

    #[actix_rt::test]
    async fn test_remote_source_becomes_ready() {
        let (sinks, mut events) = event_channel();
        let mut output = HeadlessOutput::create(sinks.foreground);
        let ticket = LoadTicket::new(1, "dynamite".into());

        output
            .load(MediaRequest {
                ticket: ticket.clone(),
                source: TrackSource::Remote("https://p.scdn.co/mp3-preview/dynamite".into()),
                duration_hint: Some(199.0),
            })
            .expect("Expected remote source to load");

        assert_eq!(
            Some(ChannelEvent {
                channel: Channel::Foreground,
                ticket,
                event: AudioEvent::Ready { duration: 199.0 },
            }),
            events.recv().await
        );
    }
}
