use super::PlaybackController;
use crate::{CatalogClient, EventReceiver, PlayerSnapshot};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info};

/// Shared, single-threaded access to a controller for the parts of an
/// application that run concurrently on one event loop: views issuing
/// commands, the audio event pump, and catalog loading.
///
/// The controller is never borrowed across an `.await`.
#[derive(Clone)]
pub struct ControllerHandle {
    controller: Rc<RefCell<PlaybackController>>,
}

impl ControllerHandle {
    pub fn new(controller: PlaybackController) -> Self {
        Self {
            controller: Rc::new(RefCell::new(controller)),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut PlaybackController) -> R) -> R {
        f(&mut self.controller.borrow_mut())
    }

    pub fn snapshot(&self) -> PlayerSnapshot {
        self.controller.borrow().snapshot()
    }

    /// Fetches the catalog and installs it. Returns `false` when another load
    /// was already in flight and this call did nothing.
    pub async fn load_catalog(&self, catalog: &dyn CatalogClient) -> bool {
        let Some(ticket) = self.with(|controller| controller.begin_catalog_load()) else {
            return false;
        };

        let result = catalog.fetch_tracks().await;

        self.with(|controller| controller.complete_catalog_load(ticket, result));

        true
    }

    /// Feeds output events into the controller until every sink is dropped.
    pub async fn run_events(&self, mut events: EventReceiver) {
        info!("Listening for audio events");

        while let Some(event) = events.recv().await {
            self.with(|controller| controller.dispatch(event));
        }

        debug!("Audio event stream closed");
    }
}
