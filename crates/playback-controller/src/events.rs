use crate::{TrackId, TrackSource};
use serde::Serialize;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum Channel {
    Foreground,
    Background,
}

/// Identifies one load of one track on one output.
///
/// Every event carries the ticket of the load it belongs to; the controller
/// drops events whose ticket is no longer the one it is waiting on.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    generation: u64,
    track_id: TrackId,
}

impl LoadTicket {
    /// Tickets are normally minted by the controller; outputs only echo them back.
    pub fn new(generation: u64, track_id: TrackId) -> Self {
        Self {
            generation,
            track_id,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn track_id(&self) -> &TrackId {
        &self.track_id
    }
}

impl std::fmt::Display for LoadTicket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.track_id, self.generation)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MediaRequest {
    pub ticket: LoadTicket,
    pub source: TrackSource,
    pub duration_hint: Option<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum AudioEvent {
    Ready { duration: f64 },
    TimeUpdate { position: f64 },
    Ended,
    Error { reason: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct ChannelEvent {
    pub channel: Channel,
    pub ticket: LoadTicket,
    pub event: AudioEvent,
}

pub type EventReceiver = UnboundedReceiver<ChannelEvent>;

/// Handed to an `AudioOutput` so it can report back to the controller.
#[derive(Clone, Debug)]
pub struct EventSink {
    channel: Channel,
    sender: UnboundedSender<ChannelEvent>,
}

impl EventSink {
    pub fn channel(&self) -> Channel {
        self.channel
    }

    /// Returns `false` once the receiving side has gone away.
    pub fn emit(&self, ticket: &LoadTicket, event: AudioEvent) -> bool {
        self.sender
            .send(ChannelEvent {
                channel: self.channel,
                ticket: ticket.clone(),
                event,
            })
            .is_ok()
    }
}

pub struct EventSinks {
    pub foreground: EventSink,
    pub background: EventSink,
}

/// Creates the single event queue both outputs report into.
pub fn event_channel() -> (EventSinks, EventReceiver) {
    let (sender, receiver) = unbounded_channel();

    let sinks = EventSinks {
        foreground: EventSink {
            channel: Channel::Foreground,
            sender: sender.clone(),
        },
        background: EventSink {
            channel: Channel::Background,
            sender,
        },
    };

    (sinks, receiver)
}
