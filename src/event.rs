//! In-process event bus between the sampler task and the output loop.

use tokio::sync::mpsc;

use crate::system::publish::{EventSink, IconOptions, IconRenderer, StatsPayload};

#[derive(Clone, Debug)]
pub enum Event {
    Stats { name: String, payload: StatsPayload },
    Icons(Vec<IconOptions>),
}

/// Sending half, handed to the sampler as both its event sink and its icon
/// renderer.
#[derive(Clone, Debug)]
pub struct EventPublisher {
    tx: mpsc::UnboundedSender<Event>,
}

impl EventPublisher {
    fn send(&self, event: Event) {
        if self.tx.send(event).is_err() {
            tracing::debug!("event receiver closed; dropping event");
        }
    }
}

impl EventSink for EventPublisher {
    fn emit(&self, event: &str, payload: &StatsPayload) {
        self.send(Event::Stats {
            name: event.to_string(),
            payload: payload.clone(),
        });
    }
}

impl IconRenderer for EventPublisher {
    fn draw_icons(&self, icons: &[IconOptions]) {
        self.send(Event::Icons(icons.to_vec()));
    }
}

pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
}

impl EventHandler {
    pub fn new() -> (Self, EventPublisher) {
        let (tx, rx) = mpsc::unbounded_channel::<Event>();
        (Self { rx }, EventPublisher { tx })
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
